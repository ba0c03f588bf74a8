use ash::vk;

pub mod raster_pass;
pub mod shading_pass;

/// 一次 indexed draw 需要的 GPU 侧句柄
#[derive(Clone, Copy)]
pub struct DrawGeometry {
    pub vertex_buffer: vk::Buffer,
    pub index_buffer: vk::Buffer,
    pub index_cnt: u32,
}
