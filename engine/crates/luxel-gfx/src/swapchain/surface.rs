use crate::foundation::debug_messenger::DebugType;
use crate::gfx::Gfx;
use ash::vk;

pub struct GfxSurface {
    pub(crate) handle: vk::SurfaceKHR,
    pub(crate) pf: ash::khr::surface::Instance,
}

impl GfxSurface {
    pub fn new(
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        raw_window_handle: raw_window_handle::RawWindowHandle,
    ) -> Self {
        let gfx = Gfx::get();
        let surface_pf = ash::khr::surface::Instance::new(&gfx.vk_entry, &gfx.instance.ash_instance);

        let surface = unsafe {
            ash_window::create_surface(
                &gfx.vk_entry,
                &gfx.instance.ash_instance,
                raw_display_handle,
                raw_window_handle,
                None,
            )
            .unwrap()
        };

        let surface = GfxSurface {
            handle: surface,
            pf: surface_pf,
        };
        gfx.gfx_device().set_debug_name(&surface, "main");

        surface
    }
}

// getters
impl GfxSurface {
    pub fn get_capabilities(&self) -> vk::SurfaceCapabilitiesKHR {
        unsafe {
            self.pf
                .get_physical_device_surface_capabilities(Gfx::get().physical_device.vk_handle, self.handle)
                .unwrap()
        }
    }

    /// 选取 surface format：优先 BGRA8_UNORM + SRGB_NONLINEAR，否则取第一个
    pub fn choose_surface_format(&self) -> vk::SurfaceFormatKHR {
        let formats = unsafe {
            self.pf
                .get_physical_device_surface_formats(Gfx::get().physical_device.vk_handle, self.handle)
                .unwrap()
        };
        formats
            .iter()
            .find(|f| {
                f.format == vk::Format::B8G8R8A8_UNORM && f.color_space == vk::ColorSpaceKHR::SRGB_NONLINEAR
            })
            .copied()
            .unwrap_or(formats[0])
    }
}

impl Drop for GfxSurface {
    fn drop(&mut self) {
        unsafe { self.pf.destroy_surface(self.handle, None) }
    }
}

impl DebugType for GfxSurface {
    fn debug_type_name() -> &'static str {
        "GfxSurface"
    }
    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
