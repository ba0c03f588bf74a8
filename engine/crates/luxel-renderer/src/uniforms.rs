//! 三个 pass 的 uniform block 定义，布局与 shader 中的 std140 块一一对应。

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec4};

use crate::settings::MAX_OBJECTS;

/// geometry subpass：每个对象的 model 矩阵
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct GeometryUbo {
    pub model: [Mat4; MAX_OBJECTS],
}

/// lighting subpass：光源、视点与每个对象的材质系数
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct ShadingUbo {
    pub light_position: Vec4,
    pub eye_position: Vec4,
    pub materials: [Vec4; MAX_OBJECTS],
}

/// raster pass：model 矩阵加相机矩阵
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
pub struct RasterUbo {
    pub model: [Mat4; MAX_OBJECTS],
    pub view: Mat4,
    pub proj: Mat4,
}

impl Default for GeometryUbo {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}
impl Default for ShadingUbo {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}
impl Default for RasterUbo {
    fn default() -> Self {
        Zeroable::zeroed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ubo_sizes_match_std140() {
        assert_eq!(size_of::<GeometryUbo>(), 64 * MAX_OBJECTS);
        assert_eq!(size_of::<ShadingUbo>(), 16 + 16 + 16 * MAX_OBJECTS);
        assert_eq!(size_of::<RasterUbo>(), 64 * MAX_OBJECTS + 64 + 64);
    }
}
