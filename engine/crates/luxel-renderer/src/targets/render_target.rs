use ash::vk;
use luxel_gfx::{
    commands::{barrier::GfxImageBarrier, command_buffer::GfxCommandBuffer},
    resources::{
        image::GfxImage,
        image_view::{GfxImageView, GfxImageViewDesc},
    },
    sampler::{GfxSampler, GfxSamplerDesc},
};

use crate::targets::layout::{TargetLayout, TransitionMasks};

/// 固定正方形分辨率的离屏 render target，g-buffer 与 lighting buffer 共用。
///
/// 自带 layout 状态机：所有 layout 变化都经由 [`RenderTarget::transition`]，
/// 记录的状态与 GPU 上的实际 layout 保持一致。
pub struct RenderTarget {
    image: GfxImage,
    view: GfxImageView,
    sampler: GfxSampler,

    state: TargetLayout,
}

// new & init
impl RenderTarget {
    pub fn new(side: u32, format: vk::Format, name: &str) -> Self {
        let image = GfxImage::new_attachment(
            vk::Extent2D { width: side, height: side },
            format,
            vk::ImageUsageFlags::COLOR_ATTACHMENT | vk::ImageUsageFlags::INPUT_ATTACHMENT | vk::ImageUsageFlags::SAMPLED,
            name,
        );
        let view = GfxImageView::new(
            image.handle(),
            GfxImageViewDesc::new_2d(format, vk::ImageAspectFlags::COLOR),
            format!("{name}-view"),
        );
        let sampler = GfxSampler::new(&GfxSamplerDesc::nearest_clamp(), format!("{name}-sampler"));

        Self {
            image,
            view,
            sampler,
            state: TargetLayout::Undefined,
        }
    }
}

// getters
impl RenderTarget {
    #[inline]
    pub fn view(&self) -> vk::ImageView {
        self.view.handle()
    }

    #[inline]
    pub fn sampler(&self) -> vk::Sampler {
        self.sampler.handle()
    }
}

// update
impl RenderTarget {
    /// 向 `new_state` 转换，按转换表记录 barrier。
    ///
    /// 同态转换不记录任何命令；表外转换报错并保持状态不变。
    pub fn transition(&mut self, cmd: &GfxCommandBuffer, new_state: TargetLayout) {
        match TransitionMasks::lookup(self.state, new_state) {
            Err(err) => {
                log::error!("render target transition rejected: {err}");
            }
            Ok(None) => {}
            Ok(Some(masks)) => {
                let barrier = GfxImageBarrier::new()
                    .image(self.image.handle())
                    .src_mask(masks.src_stage, masks.src_access)
                    .dst_mask(masks.dst_stage, masks.dst_access)
                    .layout_transfer(self.state.vk_layout(), new_state.vk_layout())
                    .image_aspect_flag(vk::ImageAspectFlags::COLOR);
                cmd.image_memory_barrier(vk::DependencyFlags::empty(), std::slice::from_ref(&barrier));
                self.state = new_state;
            }
        }
    }
}

// destroy
impl RenderTarget {
    pub fn destroy(self) {
        self.view.destroy();
        self.image.destroy();
    }
}
