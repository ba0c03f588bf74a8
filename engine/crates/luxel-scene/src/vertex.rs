use ash::vk;

/// 场景顶点：position / normal / 颜色种子 / uv / object id
///
/// object id 用于在 shader 中索引每个对象的 model 矩阵和材质
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneVertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
    pub color: [f32; 3],
    pub uv: [f32; 2],
    pub object_id: u32,
}

impl SceneVertex {
    pub fn vertex_input_bindings() -> Vec<vk::VertexInputBindingDescription> {
        vec![vk::VertexInputBindingDescription {
            binding: 0,
            stride: size_of::<SceneVertex>() as u32,
            input_rate: vk::VertexInputRate::VERTEX,
        }]
    }

    pub fn vertex_input_attributes() -> Vec<vk::VertexInputAttributeDescription> {
        vec![
            vk::VertexInputAttributeDescription {
                location: 0,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(SceneVertex, position) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 1,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(SceneVertex, normal) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 2,
                binding: 0,
                format: vk::Format::R32G32B32_SFLOAT,
                offset: std::mem::offset_of!(SceneVertex, color) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 3,
                binding: 0,
                format: vk::Format::R32G32_SFLOAT,
                offset: std::mem::offset_of!(SceneVertex, uv) as u32,
            },
            vk::VertexInputAttributeDescription {
                location: 4,
                binding: 0,
                format: vk::Format::R32_UINT,
                offset: std::mem::offset_of!(SceneVertex, object_id) as u32,
            },
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stride_matches_attributes() {
        let bindings = SceneVertex::vertex_input_bindings();
        assert_eq!(bindings.len(), 1);
        // 3 + 3 + 3 + 2 floats + 1 uint
        assert_eq!(bindings[0].stride, (12 * 4) as u32);

        let attrs = SceneVertex::vertex_input_attributes();
        assert_eq!(attrs.len(), 5);
        assert_eq!(attrs[4].offset, 44);
    }
}
