use ash::vk;

/// ImageMemoryBarrier2 的 builder 封装
#[derive(Clone)]
pub struct GfxImageBarrier {
    inner: vk::ImageMemoryBarrier2<'static>,
}

impl Default for GfxImageBarrier {
    fn default() -> Self {
        Self::new()
    }
}

impl GfxImageBarrier {
    pub fn new() -> Self {
        Self {
            inner: vk::ImageMemoryBarrier2 {
                src_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                dst_queue_family_index: vk::QUEUE_FAMILY_IGNORED,
                subresource_range: vk::ImageSubresourceRange {
                    aspect_mask: vk::ImageAspectFlags::COLOR,
                    base_mip_level: 0,
                    level_count: 1,
                    base_array_layer: 0,
                    layer_count: 1,
                },
                ..Default::default()
            },
        }
    }

    #[inline]
    pub fn image(mut self, image: vk::Image) -> Self {
        self.inner.image = image;
        self
    }

    #[inline]
    pub fn src_mask(mut self, stage: vk::PipelineStageFlags2, access: vk::AccessFlags2) -> Self {
        self.inner.src_stage_mask = stage;
        self.inner.src_access_mask = access;
        self
    }

    #[inline]
    pub fn dst_mask(mut self, stage: vk::PipelineStageFlags2, access: vk::AccessFlags2) -> Self {
        self.inner.dst_stage_mask = stage;
        self.inner.dst_access_mask = access;
        self
    }

    #[inline]
    pub fn layout_transfer(mut self, old_layout: vk::ImageLayout, new_layout: vk::ImageLayout) -> Self {
        self.inner.old_layout = old_layout;
        self.inner.new_layout = new_layout;
        self
    }

    #[inline]
    pub fn image_aspect_flag(mut self, aspect: vk::ImageAspectFlags) -> Self {
        self.inner.subresource_range.aspect_mask = aspect;
        self
    }

    #[inline]
    pub fn as_barrier(&self) -> vk::ImageMemoryBarrier2<'static> {
        self.inner
    }
}
