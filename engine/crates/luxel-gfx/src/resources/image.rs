use ash::vk;
use ash::vk::Handle;
use vk_mem::{Alloc, Allocation};

use crate::{foundation::debug_messenger::DebugType, gfx::Gfx};

pub struct GfxImage {
    handle: vk::Image,
    allocation: Allocation,

    extent: vk::Extent3D,
    format: vk::Format,

    _usage: vk::ImageUsageFlags,

    name: String,
}
impl DebugType for GfxImage {
    fn debug_type_name() -> &'static str {
        "GfxImage2D"
    }

    fn vk_handle(&self) -> impl vk::Handle {
        self.handle
    }
}
// getter
impl GfxImage {
    #[inline]
    pub fn width(&self) -> u32 {
        self.extent.width
    }

    #[inline]
    pub fn height(&self) -> u32 {
        self.extent.height
    }

    #[inline]
    pub fn handle(&self) -> vk::Image {
        self.handle
    }

    #[inline]
    pub fn format(&self) -> vk::Format {
        self.format
    }
}
// new & init
impl GfxImage {
    pub fn new(image_info: &GfxImageCreateInfo, alloc_info: &vk_mem::AllocationCreateInfo, debug_name: &str) -> Self {
        let allocator = Gfx::get().allocator();
        let gfx_device = Gfx::get().gfx_device();
        let (image, alloc) = unsafe { allocator.create_image(&image_info.as_info(), alloc_info).unwrap() };
        let image = Self {
            handle: image,
            allocation: alloc,
            extent: image_info.inner.extent,
            format: image_info.inner.format,
            _usage: image_info.inner.usage,

            name: debug_name.to_string(),
        };
        gfx_device.set_debug_name(&image, debug_name);
        image
    }

    /// attachment 用途的 device local image（g-buffer、depth 等）
    pub fn new_attachment(
        extent: vk::Extent2D,
        format: vk::Format,
        usage: vk::ImageUsageFlags,
        debug_name: &str,
    ) -> Self {
        let create_info = GfxImageCreateInfo::new_image_2d_info(extent, format, usage);
        Self::new(
            &create_info,
            &vk_mem::AllocationCreateInfo {
                usage: vk_mem::MemoryUsage::AutoPreferDevice,
                ..Default::default()
            },
            debug_name,
        )
    }
}
// destroy
impl GfxImage {
    pub fn destroy(mut self) {
        self.destroy_mut();
    }
    pub fn destroy_mut(&mut self) {
        log::debug!("Destroying GfxImage: {}", self.name);

        unsafe {
            Gfx::get().allocator().destroy_image(self.handle, &mut self.allocation);
        }
        self.handle = vk::Image::null();
    }
}
impl Drop for GfxImage {
    fn drop(&mut self) {
        debug_assert!(self.handle.is_null());
    }
}

pub struct GfxImageCreateInfo {
    inner: vk::ImageCreateInfo<'static>,

    queue_family_indices: Vec<u32>,
}
impl GfxImageCreateInfo {
    #[inline]
    pub fn new_image_2d_info(extent: vk::Extent2D, format: vk::Format, usage: vk::ImageUsageFlags) -> Self {
        Self {
            inner: vk::ImageCreateInfo {
                image_type: vk::ImageType::TYPE_2D,
                format,
                extent: extent.into(),
                mip_levels: 1,
                array_layers: 1,
                samples: vk::SampleCountFlags::TYPE_1,
                tiling: vk::ImageTiling::OPTIMAL,
                usage,
                sharing_mode: vk::SharingMode::EXCLUSIVE,
                // spec 上面说，这里只能是 UNDEFINED 或者 PREINITIALIZED
                initial_layout: vk::ImageLayout::UNDEFINED,
                ..Default::default()
            },
            queue_family_indices: Vec::new(),
        }
    }

    #[inline]
    pub fn as_info(&self) -> vk::ImageCreateInfo<'_> {
        self.inner.queue_family_indices(&self.queue_family_indices)
    }
}
