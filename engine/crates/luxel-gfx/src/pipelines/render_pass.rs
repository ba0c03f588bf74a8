use ash::vk;

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

/// render pass 封装
///
/// # Destroy
/// 需要手动 destroy；重建 swapchain 时 framebuffer 会重建，render pass 不变
pub struct GfxRenderPass {
    handle: vk::RenderPass,
}
impl DebugType for GfxRenderPass {
    fn debug_type_name() -> &'static str {
        "GfxRenderPass"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
// new & init
impl GfxRenderPass {
    pub fn new(create_info: &vk::RenderPassCreateInfo, name: impl AsRef<str>) -> Self {
        let gfx_device = Gfx::get().gfx_device();
        let handle = unsafe { gfx_device.create_render_pass(create_info, None).unwrap() };
        let render_pass = Self { handle };
        gfx_device.set_debug_name(&render_pass, name);
        render_pass
    }

    pub fn destroy(self) {
        unsafe {
            Gfx::get().gfx_device().destroy_render_pass(self.handle, None);
        }
    }
}
// getters
impl GfxRenderPass {
    #[inline]
    pub fn handle(&self) -> vk::RenderPass {
        self.handle
    }
}

/// framebuffer 封装
pub struct GfxFramebuffer {
    handle: vk::Framebuffer,
    extent: vk::Extent2D,
}
impl DebugType for GfxFramebuffer {
    fn debug_type_name() -> &'static str {
        "GfxFramebuffer"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
// new & init
impl GfxFramebuffer {
    pub fn new(
        render_pass: &GfxRenderPass,
        attachments: &[vk::ImageView],
        extent: vk::Extent2D,
        name: impl AsRef<str>,
    ) -> Self {
        let gfx_device = Gfx::get().gfx_device();
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.handle)
            .attachments(attachments)
            .width(extent.width)
            .height(extent.height)
            .layers(1);
        let handle = unsafe { gfx_device.create_framebuffer(&create_info, None).unwrap() };
        let framebuffer = Self { handle, extent };
        gfx_device.set_debug_name(&framebuffer, name);
        framebuffer
    }

    pub fn destroy(self) {
        unsafe {
            Gfx::get().gfx_device().destroy_framebuffer(self.handle, None);
        }
    }
}
// getters
impl GfxFramebuffer {
    #[inline]
    pub fn handle(&self) -> vk::Framebuffer {
        self.handle
    }

    #[inline]
    pub fn extent(&self) -> vk::Extent2D {
        self.extent
    }
}
