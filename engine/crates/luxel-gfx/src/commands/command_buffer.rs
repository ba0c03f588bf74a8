use ash::vk;

use crate::commands::barrier::GfxImageBarrier;
use crate::foundation::debug_messenger::DebugType;
use crate::gfx::Gfx;

/// primary command buffer 封装
///
/// # Destroy
/// 可以 Clone，因此不实现 Drop；通过 `free` 手动释放
#[derive(Clone)]
pub struct GfxCommandBuffer {
    handle: vk::CommandBuffer,
    pool: vk::CommandPool,
}

impl DebugType for GfxCommandBuffer {
    fn debug_type_name() -> &'static str {
        "GfxCommandBuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}

// new & init
impl GfxCommandBuffer {
    pub fn new(pool: vk::CommandPool, name: impl AsRef<str>) -> Self {
        let gfx_device = Gfx::get().gfx_device();
        let alloc_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let handle = unsafe { gfx_device.allocate_command_buffers(&alloc_info).unwrap()[0] };

        let cmd = Self { handle, pool };
        gfx_device.set_debug_name(&cmd, name);
        cmd
    }

    pub fn free(self) {
        unsafe {
            Gfx::get().gfx_device().free_command_buffers(self.pool, std::slice::from_ref(&self.handle));
        }
    }
}

// getters
impl GfxCommandBuffer {
    #[inline]
    pub fn vk_handle(&self) -> vk::CommandBuffer {
        self.handle
    }
}

// 录制
impl GfxCommandBuffer {
    #[inline]
    pub fn begin(&self, usage: vk::CommandBufferUsageFlags) {
        unsafe {
            Gfx::get()
                .gfx_device()
                .begin_command_buffer(self.handle, &vk::CommandBufferBeginInfo::default().flags(usage))
                .unwrap();
        }
    }

    #[inline]
    pub fn end(&self) {
        unsafe {
            Gfx::get().gfx_device().end_command_buffer(self.handle).unwrap();
        }
    }

    #[inline]
    pub fn reset(&self) {
        unsafe {
            Gfx::get()
                .gfx_device()
                .reset_command_buffer(self.handle, vk::CommandBufferResetFlags::empty())
                .unwrap();
        }
    }

    #[inline]
    pub fn begin_render_pass(&self, begin_info: &vk::RenderPassBeginInfo, contents: vk::SubpassContents) {
        unsafe {
            Gfx::get().gfx_device().cmd_begin_render_pass(self.handle, begin_info, contents);
        }
    }

    #[inline]
    pub fn next_subpass(&self, contents: vk::SubpassContents) {
        unsafe {
            Gfx::get().gfx_device().cmd_next_subpass(self.handle, contents);
        }
    }

    #[inline]
    pub fn end_render_pass(&self) {
        unsafe {
            Gfx::get().gfx_device().cmd_end_render_pass(self.handle);
        }
    }

    #[inline]
    pub fn bind_pipeline(&self, bind_point: vk::PipelineBindPoint, pipeline: vk::Pipeline) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_pipeline(self.handle, bind_point, pipeline);
        }
    }

    #[inline]
    pub fn bind_vertex_buffers(&self, first_binding: u32, buffers: &[vk::Buffer], offsets: &[vk::DeviceSize]) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_vertex_buffers(self.handle, first_binding, buffers, offsets);
        }
    }

    #[inline]
    pub fn bind_index_buffer(&self, buffer: vk::Buffer, offset: vk::DeviceSize, index_type: vk::IndexType) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_index_buffer(self.handle, buffer, offset, index_type);
        }
    }

    #[inline]
    pub fn bind_descriptor_sets(
        &self,
        bind_point: vk::PipelineBindPoint,
        layout: vk::PipelineLayout,
        first_set: u32,
        sets: &[vk::DescriptorSet],
    ) {
        unsafe {
            Gfx::get().gfx_device().cmd_bind_descriptor_sets(self.handle, bind_point, layout, first_set, sets, &[]);
        }
    }

    #[inline]
    pub fn draw_indexed(
        &self,
        index_cnt: u32,
        first_index: u32,
        instance_cnt: u32,
        first_instance: u32,
        vertex_offset: i32,
    ) {
        unsafe {
            Gfx::get().gfx_device().cmd_draw_indexed(
                self.handle,
                index_cnt,
                instance_cnt,
                first_index,
                vertex_offset,
                first_instance,
            );
        }
    }

    #[inline]
    pub fn set_viewport(&self, viewport: vk::Viewport) {
        unsafe {
            Gfx::get().gfx_device().cmd_set_viewport(self.handle, 0, std::slice::from_ref(&viewport));
        }
    }

    #[inline]
    pub fn set_scissor(&self, scissor: vk::Rect2D) {
        unsafe {
            Gfx::get().gfx_device().cmd_set_scissor(self.handle, 0, std::slice::from_ref(&scissor));
        }
    }

    /// 记录一组 image memory barrier（synchronization2）
    pub fn image_memory_barrier(&self, dependency_flags: vk::DependencyFlags, barriers: &[GfxImageBarrier]) {
        let vk_barriers = barriers.iter().map(|b| b.as_barrier()).collect::<Vec<_>>();
        let dependency_info = vk::DependencyInfo::default()
            .dependency_flags(dependency_flags)
            .image_memory_barriers(&vk_barriers);
        unsafe {
            Gfx::get().gfx_device().cmd_pipeline_barrier2(self.handle, &dependency_info);
        }
    }

    #[inline]
    pub fn cmd_copy_buffer(&self, src: &crate::resources::buffer::GfxBuffer, dst: &crate::resources::buffer::GfxBuffer, regions: &[vk::BufferCopy]) {
        unsafe {
            Gfx::get().gfx_device().cmd_copy_buffer(self.handle, src.vk_buffer(), dst.vk_buffer(), regions);
        }
    }
}
