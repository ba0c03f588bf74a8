use std::path::{Path, PathBuf};

/// 统一资源路径管理
///
/// 所有路径基于工作区根目录（通过 `CARGO_MANIFEST_DIR` 推导）。
/// 避免使用硬编码相对路径，确保在不同构建环境下路径一致。
///
/// # 使用示例
/// ```ignore
/// let shader = LuxelPath::shader_path("deferred_geometry.vert.spv");
/// ```
pub struct LuxelPath {}
// 核心路径
impl LuxelPath {
    /// 获取工作区根目录
    pub fn workspace_path() -> PathBuf {
        // 从当前包的位置推导 workspace 目录
        Path::new(env!("CARGO_MANIFEST_DIR")).parent().unwrap().to_path_buf()
    }
}
// 根目录下
impl LuxelPath {
    /// 获取 `assets/` 目录下的文件路径
    pub fn assets_path(filename: &str) -> PathBuf {
        Self::workspace_path().join("assets").join(filename)
    }

    /// 获取 `assets/shaders/` 目录下的 SPIR-V 文件路径
    pub fn shader_path(filename: &str) -> PathBuf {
        Self::assets_path("shaders").join(filename)
    }
    pub fn shader_path_str(filename: &str) -> String {
        Self::shader_path(filename).to_str().unwrap().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shader_path_under_assets() {
        let path = LuxelPath::shader_path("raster.vert.spv");
        assert!(path.ends_with("assets/shaders/raster.vert.spv"));
    }
}
