use std::rc::Rc;

use ash::vk;
use luxel_crate_tools::resource::LuxelPath;
use luxel_gfx::{
    commands::command_buffer::GfxCommandBuffer,
    gfx::Gfx,
    pipelines::{
        descriptor::{GfxDescriptorPool, GfxDescriptorSetLayout},
        graphics_pipeline::{GfxGraphicsPipeline, GfxGraphicsPipelineCreateInfo, GfxPipelineLayout},
        render_pass::{GfxFramebuffer, GfxRenderPass},
    },
    resources::{
        buffer::GfxBuffer,
        image::GfxImage,
        image_view::{GfxImageView, GfxImageViewDesc},
    },
    swapchain::render_swapchain::GfxRenderSwapchain,
};
use luxel_scene::vertex::SceneVertex;

use crate::{
    passes::DrawGeometry,
    targets::{layout::TargetLayout, render_target::RenderTarget},
};

const DEPTH_FORMAT: vk::Format = vk::Format::D32_SFLOAT;

/// raster group：采样 lighting 结果，把场景光栅化到 swapchain。
///
/// 每个 swapchain image 一份 framebuffer 和 command buffer，
/// 命令录制一次，SIMULTANEOUS_USE 重复提交；resize 时重建。
pub struct RasterPass {
    render_pass: GfxRenderPass,

    depth_image: GfxImage,
    depth_view: GfxImageView,

    set_layout: GfxDescriptorSetLayout,
    descriptor_set: vk::DescriptorSet,

    pipeline: GfxGraphicsPipeline,

    swapchain_views: Vec<GfxImageView>,
    framebuffers: Vec<GfxFramebuffer>,
    command_buffers: Vec<GfxCommandBuffer>,

    extent: vk::Extent2D,
}

// new & init
impl RasterPass {
    pub fn new(
        swapchain: &GfxRenderSwapchain,
        descriptor_pool: &GfxDescriptorPool,
        raster_ubo: &GfxBuffer,
        lighting_view: vk::ImageView,
        lighting_sampler: vk::Sampler,
    ) -> Self {
        let render_pass = Self::create_render_pass(swapchain.color_format());

        let set_layout = GfxDescriptorSetLayout::new(
            &[
                vk::DescriptorSetLayoutBinding::default()
                    .binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::VERTEX),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(1)
                    .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
            ],
            "raster-set-layout",
        );
        let descriptor_set = descriptor_pool.alloc_set(&set_layout, "raster-set");

        let buffer_info = [vk::DescriptorBufferInfo {
            buffer: raster_ubo.vk_buffer(),
            offset: 0,
            range: raster_ubo.size(),
        }];
        let lighting_info = [vk::DescriptorImageInfo {
            sampler: lighting_sampler,
            image_view: lighting_view,
            image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
        }];
        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&buffer_info),
            vk::WriteDescriptorSet::default()
                .dst_set(descriptor_set)
                .dst_binding(1)
                .descriptor_type(vk::DescriptorType::COMBINED_IMAGE_SAMPLER)
                .image_info(&lighting_info),
        ];
        unsafe {
            Gfx::get().gfx_device().update_descriptor_sets(&writes, &[]);
        }

        let pipeline = Self::create_pipeline(&set_layout, &render_pass);

        let (depth_image, depth_view, swapchain_views, framebuffers, command_buffers) =
            Self::create_slot_resources(swapchain, &render_pass);

        Self {
            render_pass,
            depth_image,
            depth_view,
            set_layout,
            descriptor_set,
            pipeline,
            swapchain_views,
            framebuffers,
            command_buffers,
            extent: swapchain.extent(),
        }
    }

    /// color attachment 渲染完直接进入 PRESENT_SRC
    fn create_render_pass(color_format: vk::Format) -> GfxRenderPass {
        let attachments = [
            vk::AttachmentDescription {
                format: color_format,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::STORE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::PRESENT_SRC_KHR,
                ..Default::default()
            },
            vk::AttachmentDescription {
                format: DEPTH_FORMAT,
                samples: vk::SampleCountFlags::TYPE_1,
                load_op: vk::AttachmentLoadOp::CLEAR,
                store_op: vk::AttachmentStoreOp::DONT_CARE,
                stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
                stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
                initial_layout: vk::ImageLayout::UNDEFINED,
                final_layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
                ..Default::default()
            },
        ];

        let color_ref = [vk::AttachmentReference {
            attachment: 0,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];
        let depth_ref = vk::AttachmentReference {
            attachment: 1,
            layout: vk::ImageLayout::DEPTH_STENCIL_ATTACHMENT_OPTIMAL,
        };
        let subpasses = [vk::SubpassDescription::default()
            .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
            .color_attachments(&color_ref)
            .depth_stencil_attachment(&depth_ref)];

        let dependencies = [vk::SubpassDependency {
            src_subpass: vk::SUBPASS_EXTERNAL,
            dst_subpass: 0,
            src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT
                | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            src_access_mask: vk::AccessFlags::empty(),
            dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE
                | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
            dependency_flags: vk::DependencyFlags::empty(),
        }];

        GfxRenderPass::new(
            &vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(&subpasses)
                .dependencies(&dependencies),
            "raster-render-pass",
        )
    }

    fn create_pipeline(set_layout: &GfxDescriptorSetLayout, render_pass: &GfxRenderPass) -> GfxGraphicsPipeline {
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "raster-pipeline-layout"));

        let mut create_info = GfxGraphicsPipelineCreateInfo::default();
        create_info
            .vertex_shader_stage(&LuxelPath::shader_path_str("raster.vert.spv"), c"main")
            .fragment_shader_stage(&LuxelPath::shader_path_str("raster.frag.spv"), c"main")
            .vertex_binding(SceneVertex::vertex_input_bindings())
            .vertex_attribute(SceneVertex::vertex_input_attributes())
            .color_attachment_cnt(1)
            // proj 的 y 翻转让模型空间 CCW 的面在 framebuffer 里变成 CW
            .cull_mode(vk::CullModeFlags::BACK, vk::FrontFace::CLOCKWISE)
            .depth_test(Some(vk::CompareOp::LESS), true);

        GfxGraphicsPipeline::new(&create_info, pipeline_layout, render_pass, 0, "raster-pipeline")
    }

    /// swapchain 相关的逐 slot 资源，resize 时整体重建
    fn create_slot_resources(
        swapchain: &GfxRenderSwapchain,
        render_pass: &GfxRenderPass,
    ) -> (GfxImage, GfxImageView, Vec<GfxImageView>, Vec<GfxFramebuffer>, Vec<GfxCommandBuffer>) {
        let extent = swapchain.extent();

        let depth_image = GfxImage::new_attachment(
            extent,
            DEPTH_FORMAT,
            vk::ImageUsageFlags::DEPTH_STENCIL_ATTACHMENT,
            "raster-depth",
        );
        let depth_view = GfxImageView::new(
            depth_image.handle(),
            GfxImageViewDesc::new_2d(DEPTH_FORMAT, vk::ImageAspectFlags::DEPTH),
            "raster-depth-view",
        );

        let mut swapchain_views = Vec::with_capacity(swapchain.image_cnt());
        let mut framebuffers = Vec::with_capacity(swapchain.image_cnt());
        let mut command_buffers = Vec::with_capacity(swapchain.image_cnt());
        for (idx, image) in swapchain.present_images().into_iter().enumerate() {
            let view = GfxImageView::new(
                image,
                GfxImageViewDesc::new_2d(swapchain.color_format(), vk::ImageAspectFlags::COLOR),
                format!("swapchain-view-{idx}"),
            );
            let framebuffer = GfxFramebuffer::new(
                render_pass,
                &[view.handle(), depth_view.handle()],
                extent,
                format!("raster-framebuffer-{idx}"),
            );
            swapchain_views.push(view);
            framebuffers.push(framebuffer);
            command_buffers.push(Gfx::get().alloc_command_buffer(format!("raster-cmd-{idx}")));
        }

        (depth_image, depth_view, swapchain_views, framebuffers, command_buffers)
    }

    /// 窗口尺寸变化后重建逐 slot 资源，render pass 与 pipeline 不变。
    /// 调用方负责随后重新录制命令。
    pub fn recreate(&mut self, swapchain: &GfxRenderSwapchain) {
        for cmd in self.command_buffers.drain(..) {
            cmd.free();
        }
        for framebuffer in self.framebuffers.drain(..) {
            framebuffer.destroy();
        }
        for view in self.swapchain_views.drain(..) {
            view.destroy();
        }
        self.depth_view.destroy_mut();
        self.depth_image.destroy_mut();

        let (depth_image, depth_view, swapchain_views, framebuffers, command_buffers) =
            Self::create_slot_resources(swapchain, &self.render_pass);
        self.depth_image = depth_image;
        self.depth_view = depth_view;
        self.swapchain_views = swapchain_views;
        self.framebuffers = framebuffers;
        self.command_buffers = command_buffers;
        self.extent = swapchain.extent();
    }
}

// update
impl RasterPass {
    /// 为每个 swapchain slot 录制命令。
    ///
    /// 录制前把 lighting target 声明到 ReadOptimal；半渲染帧之间它一直
    /// 停在该状态，这条转换是 no-op，不产生任何命令。
    pub fn record(&mut self, lighting: &mut RenderTarget, scene: &DrawGeometry, clear_color: [f32; 4]) {
        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue { float32: clear_color },
            },
            vk::ClearValue {
                depth_stencil: vk::ClearDepthStencilValue { depth: 1.0, stencil: 0 },
            },
        ];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: self.extent,
        };

        for (idx, cmd) in self.command_buffers.iter().enumerate() {
            cmd.reset();
            cmd.begin(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);

            lighting.transition(cmd, TargetLayout::ReadOptimal);

            cmd.begin_render_pass(
                &vk::RenderPassBeginInfo::default()
                    .render_pass(self.render_pass.handle())
                    .framebuffer(self.framebuffers[idx].handle())
                    .render_area(render_area)
                    .clear_values(&clear_values),
                vk::SubpassContents::INLINE,
            );

            cmd.set_viewport(vk::Viewport {
                x: 0.0,
                y: 0.0,
                width: self.extent.width as f32,
                height: self.extent.height as f32,
                min_depth: 0.0,
                max_depth: 1.0,
            });
            cmd.set_scissor(render_area);

            cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.pipeline.handle());
            cmd.bind_descriptor_sets(vk::PipelineBindPoint::GRAPHICS, self.pipeline.layout(), 0, &[
                self.descriptor_set,
            ]);
            cmd.bind_vertex_buffers(0, &[scene.vertex_buffer], &[0]);
            cmd.bind_index_buffer(scene.index_buffer, 0, vk::IndexType::UINT32);
            cmd.draw_indexed(scene.index_cnt, 0, 1, 0, 0);

            cmd.end_render_pass();
            cmd.end();
        }
    }
}

// getters
impl RasterPass {
    #[inline]
    pub fn command_buffer(&self, slot: usize) -> &GfxCommandBuffer {
        &self.command_buffers[slot]
    }
}

// destroy
impl RasterPass {
    pub fn destroy(mut self) {
        for cmd in self.command_buffers.drain(..) {
            cmd.free();
        }
        for framebuffer in self.framebuffers.drain(..) {
            framebuffer.destroy();
        }
        for view in self.swapchain_views.drain(..) {
            view.destroy();
        }
        self.depth_view.destroy();
        self.depth_image.destroy();
        self.pipeline.destroy();
        self.set_layout.destroy();
        self.render_pass.destroy();
    }
}
