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
    resources::buffer::GfxBuffer,
};
use luxel_scene::vertex::SceneVertex;

use crate::{
    passes::DrawGeometry,
    targets::{layout::TargetLayout, render_target::RenderTarget},
};

/// shading group 各 target 的统一格式
pub const SHADING_FORMAT: vk::Format = vk::Format::R16G16B16A16_SFLOAT;

/// shading group：geometry + lighting 两个 subpass 的离屏 pass。
///
/// 分辨率固定为 `side x side`，与窗口尺寸无关，窗口 resize 不影响本 pass。
/// 命令在启动时录制一次，以 SIMULTANEOUS_USE 重复提交。
pub struct ShadingPass {
    position_target: RenderTarget,
    normal_target: RenderTarget,
    color_target: RenderTarget,
    lighting_target: RenderTarget,

    render_pass: GfxRenderPass,
    framebuffer: GfxFramebuffer,

    geometry_set_layout: GfxDescriptorSetLayout,
    lighting_set_layout: GfxDescriptorSetLayout,
    geometry_set: vk::DescriptorSet,
    lighting_set: vk::DescriptorSet,

    geometry_pipeline: GfxGraphicsPipeline,
    lighting_pipeline: GfxGraphicsPipeline,

    command_buffer: GfxCommandBuffer,

    side: u32,
}

// new & init
impl ShadingPass {
    pub fn new(
        side: u32,
        descriptor_pool: &GfxDescriptorPool,
        geometry_ubo: &GfxBuffer,
        shading_ubo: &GfxBuffer,
    ) -> Self {
        let mut position_target = RenderTarget::new(side, SHADING_FORMAT, "gbuffer-position");
        let mut normal_target = RenderTarget::new(side, SHADING_FORMAT, "gbuffer-normal");
        let mut color_target = RenderTarget::new(side, SHADING_FORMAT, "gbuffer-color");
        let mut lighting_target = RenderTarget::new(side, SHADING_FORMAT, "lighting-buffer");

        // 启动时把所有 target 推进到初始状态：
        // g-buffer 常驻 WriteOptimal，lighting 以 ReadOptimal 待命
        Gfx::get().one_time_exec(
            |cmd| {
                position_target.transition(cmd, TargetLayout::WriteOptimal);
                normal_target.transition(cmd, TargetLayout::WriteOptimal);
                color_target.transition(cmd, TargetLayout::WriteOptimal);
                lighting_target.transition(cmd, TargetLayout::WriteOptimal);
                lighting_target.transition(cmd, TargetLayout::ReadOptimal);
            },
            "shading-target-init",
        );

        let render_pass = Self::create_render_pass();
        let framebuffer = GfxFramebuffer::new(
            &render_pass,
            &[
                position_target.view(),
                normal_target.view(),
                color_target.view(),
                lighting_target.view(),
            ],
            vk::Extent2D { width: side, height: side },
            "shading-framebuffer",
        );

        let geometry_set_layout = GfxDescriptorSetLayout::new(
            &[vk::DescriptorSetLayoutBinding::default()
                .binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .descriptor_count(1)
                .stage_flags(vk::ShaderStageFlags::VERTEX)],
            "geometry-set-layout",
        );
        let lighting_set_layout = GfxDescriptorSetLayout::new(
            &[
                vk::DescriptorSetLayoutBinding::default()
                    .binding(0)
                    .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::VERTEX | vk::ShaderStageFlags::FRAGMENT),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(1)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(2)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
                vk::DescriptorSetLayoutBinding::default()
                    .binding(3)
                    .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                    .descriptor_count(1)
                    .stage_flags(vk::ShaderStageFlags::FRAGMENT),
            ],
            "lighting-set-layout",
        );

        let geometry_set = descriptor_pool.alloc_set(&geometry_set_layout, "geometry-set");
        let lighting_set = descriptor_pool.alloc_set(&lighting_set_layout, "lighting-set");
        Self::write_descriptor_sets(
            geometry_set,
            lighting_set,
            geometry_ubo,
            shading_ubo,
            &position_target,
            &normal_target,
            &color_target,
        );

        let geometry_pipeline = Self::create_geometry_pipeline(&geometry_set_layout, &render_pass);
        let lighting_pipeline = Self::create_lighting_pipeline(&lighting_set_layout, &render_pass);

        let command_buffer = Gfx::get().alloc_command_buffer("shading-cmd");

        Self {
            position_target,
            normal_target,
            color_target,
            lighting_target,
            render_pass,
            framebuffer,
            geometry_set_layout,
            lighting_set_layout,
            geometry_set,
            lighting_set,
            geometry_pipeline,
            lighting_pipeline,
            command_buffer,
            side,
        }
    }

    /// 4 个同格式 attachment，两个 subpass：
    /// subpass 0 写 g-buffer(0,1,2)，subpass 1 以 input attachment 读 g-buffer 并写 lighting(3)。
    ///
    /// initial/final layout 都保持 COLOR_ATTACHMENT_OPTIMAL，
    /// pass 外的 lighting layout 变化由显式 barrier 负责。
    fn create_render_pass() -> GfxRenderPass {
        let attachment = vk::AttachmentDescription {
            format: SHADING_FORMAT,
            samples: vk::SampleCountFlags::TYPE_1,
            load_op: vk::AttachmentLoadOp::CLEAR,
            store_op: vk::AttachmentStoreOp::STORE,
            stencil_load_op: vk::AttachmentLoadOp::DONT_CARE,
            stencil_store_op: vk::AttachmentStoreOp::DONT_CARE,
            initial_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            final_layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            ..Default::default()
        };
        let attachments = [attachment; 4];

        let gbuffer_write_refs = [
            vk::AttachmentReference {
                attachment: 0,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            },
            vk::AttachmentReference {
                attachment: 1,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            },
            vk::AttachmentReference {
                attachment: 2,
                layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
            },
        ];
        let gbuffer_read_refs = [
            vk::AttachmentReference {
                attachment: 0,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
            vk::AttachmentReference {
                attachment: 1,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
            vk::AttachmentReference {
                attachment: 2,
                layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            },
        ];
        let lighting_write_ref = [vk::AttachmentReference {
            attachment: 3,
            layout: vk::ImageLayout::COLOR_ATTACHMENT_OPTIMAL,
        }];

        let subpasses = [
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&gbuffer_write_refs),
            vk::SubpassDescription::default()
                .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                .color_attachments(&lighting_write_ref)
                .input_attachments(&gbuffer_read_refs),
        ];

        let dependencies = [
            vk::SubpassDependency {
                src_subpass: vk::SUBPASS_EXTERNAL,
                dst_subpass: 0,
                src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                dst_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                src_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                dst_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                dependency_flags: vk::DependencyFlags::empty(),
            },
            // g-buffer 写完再被 subpass 1 逐像素读取
            vk::SubpassDependency {
                src_subpass: 0,
                dst_subpass: 1,
                src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                dst_stage_mask: vk::PipelineStageFlags::FRAGMENT_SHADER,
                src_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                dst_access_mask: vk::AccessFlags::INPUT_ATTACHMENT_READ,
                dependency_flags: vk::DependencyFlags::BY_REGION,
            },
            vk::SubpassDependency {
                src_subpass: 1,
                dst_subpass: vk::SUBPASS_EXTERNAL,
                src_stage_mask: vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT,
                dst_stage_mask: vk::PipelineStageFlags::FRAGMENT_SHADER,
                src_access_mask: vk::AccessFlags::COLOR_ATTACHMENT_WRITE,
                dst_access_mask: vk::AccessFlags::SHADER_READ,
                dependency_flags: vk::DependencyFlags::empty(),
            },
        ];

        GfxRenderPass::new(
            &vk::RenderPassCreateInfo::default()
                .attachments(&attachments)
                .subpasses(&subpasses)
                .dependencies(&dependencies),
            "shading-render-pass",
        )
    }

    fn write_descriptor_sets(
        geometry_set: vk::DescriptorSet,
        lighting_set: vk::DescriptorSet,
        geometry_ubo: &GfxBuffer,
        shading_ubo: &GfxBuffer,
        position_target: &RenderTarget,
        normal_target: &RenderTarget,
        color_target: &RenderTarget,
    ) {
        let geometry_buffer_info = [vk::DescriptorBufferInfo {
            buffer: geometry_ubo.vk_buffer(),
            offset: 0,
            range: geometry_ubo.size(),
        }];
        let shading_buffer_info = [vk::DescriptorBufferInfo {
            buffer: shading_ubo.vk_buffer(),
            offset: 0,
            range: shading_ubo.size(),
        }];
        let input_attachment_info = |target: &RenderTarget| {
            [vk::DescriptorImageInfo {
                sampler: vk::Sampler::null(),
                image_view: target.view(),
                image_layout: vk::ImageLayout::SHADER_READ_ONLY_OPTIMAL,
            }]
        };
        let position_info = input_attachment_info(position_target);
        let normal_info = input_attachment_info(normal_target);
        let color_info = input_attachment_info(color_target);

        let writes = [
            vk::WriteDescriptorSet::default()
                .dst_set(geometry_set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&geometry_buffer_info),
            vk::WriteDescriptorSet::default()
                .dst_set(lighting_set)
                .dst_binding(0)
                .descriptor_type(vk::DescriptorType::UNIFORM_BUFFER)
                .buffer_info(&shading_buffer_info),
            vk::WriteDescriptorSet::default()
                .dst_set(lighting_set)
                .dst_binding(1)
                .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                .image_info(&position_info),
            vk::WriteDescriptorSet::default()
                .dst_set(lighting_set)
                .dst_binding(2)
                .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                .image_info(&normal_info),
            vk::WriteDescriptorSet::default()
                .dst_set(lighting_set)
                .dst_binding(3)
                .descriptor_type(vk::DescriptorType::INPUT_ATTACHMENT)
                .image_info(&color_info),
        ];
        unsafe {
            Gfx::get().gfx_device().update_descriptor_sets(&writes, &[]);
        }
    }

    fn create_geometry_pipeline(
        set_layout: &GfxDescriptorSetLayout,
        render_pass: &GfxRenderPass,
    ) -> GfxGraphicsPipeline {
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "geometry-pipeline-layout"));

        let mut create_info = GfxGraphicsPipelineCreateInfo::default();
        create_info
            .vertex_shader_stage(&LuxelPath::shader_path_str("deferred_geometry.vert.spv"), c"main")
            .fragment_shader_stage(&LuxelPath::shader_path_str("deferred_geometry.frag.spv"), c"main")
            .vertex_binding(SceneVertex::vertex_input_bindings())
            .vertex_attribute(SceneVertex::vertex_input_attributes())
            .color_attachment_cnt(3)
            // 顶点落在各自的 atlas tile 上，没有朝向可言
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_test(None, false);

        GfxGraphicsPipeline::new(&create_info, pipeline_layout, render_pass, 0, "geometry-pipeline")
    }

    fn create_lighting_pipeline(
        set_layout: &GfxDescriptorSetLayout,
        render_pass: &GfxRenderPass,
    ) -> GfxGraphicsPipeline {
        let pipeline_layout = Rc::new(GfxPipelineLayout::new(&[set_layout.handle()], &[], "lighting-pipeline-layout"));

        let mut create_info = GfxGraphicsPipelineCreateInfo::default();
        create_info
            .vertex_shader_stage(&LuxelPath::shader_path_str("deferred_lighting.vert.spv"), c"main")
            .fragment_shader_stage(&LuxelPath::shader_path_str("deferred_lighting.frag.spv"), c"main")
            .vertex_binding(SceneVertex::vertex_input_bindings())
            .vertex_attribute(SceneVertex::vertex_input_attributes())
            .color_attachment_cnt(1)
            .cull_mode(vk::CullModeFlags::NONE, vk::FrontFace::COUNTER_CLOCKWISE)
            .depth_test(None, false);

        GfxGraphicsPipeline::new(&create_info, pipeline_layout, render_pass, 1, "lighting-pipeline")
    }
}

// update
impl ShadingPass {
    /// 录制一次可重复提交的命令：
    /// lighting 先回到 WriteOptimal，走完两个 subpass，再交还 ReadOptimal。
    pub fn record(&mut self, scene: &DrawGeometry, quad: &DrawGeometry, clear_color: [f32; 4]) {
        let cmd = self.command_buffer.clone();
        cmd.reset();
        cmd.begin(vk::CommandBufferUsageFlags::SIMULTANEOUS_USE);

        self.lighting_target.transition(&cmd, TargetLayout::WriteOptimal);

        let clear_values = [
            vk::ClearValue {
                color: vk::ClearColorValue { float32: [0.0; 4] },
            },
            vk::ClearValue {
                color: vk::ClearColorValue { float32: [0.0; 4] },
            },
            vk::ClearValue {
                color: vk::ClearColorValue { float32: [0.0; 4] },
            },
            vk::ClearValue {
                color: vk::ClearColorValue { float32: clear_color },
            },
        ];
        let render_area = vk::Rect2D {
            offset: vk::Offset2D { x: 0, y: 0 },
            extent: vk::Extent2D {
                width: self.side,
                height: self.side,
            },
        };
        cmd.begin_render_pass(
            &vk::RenderPassBeginInfo::default()
                .render_pass(self.render_pass.handle())
                .framebuffer(self.framebuffer.handle())
                .render_area(render_area)
                .clear_values(&clear_values),
            vk::SubpassContents::INLINE,
        );

        cmd.set_viewport(vk::Viewport {
            x: 0.0,
            y: 0.0,
            width: self.side as f32,
            height: self.side as f32,
            min_depth: 0.0,
            max_depth: 1.0,
        });
        cmd.set_scissor(render_area);

        // subpass 0: geometry
        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.geometry_pipeline.handle());
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.geometry_pipeline.layout(),
            0,
            &[self.geometry_set],
        );
        cmd.bind_vertex_buffers(0, &[scene.vertex_buffer], &[0]);
        cmd.bind_index_buffer(scene.index_buffer, 0, vk::IndexType::UINT32);
        cmd.draw_indexed(scene.index_cnt, 0, 1, 0, 0);

        // subpass 1: lighting，全屏 quad
        cmd.next_subpass(vk::SubpassContents::INLINE);
        cmd.bind_pipeline(vk::PipelineBindPoint::GRAPHICS, self.lighting_pipeline.handle());
        cmd.bind_descriptor_sets(
            vk::PipelineBindPoint::GRAPHICS,
            self.lighting_pipeline.layout(),
            0,
            &[self.lighting_set],
        );
        cmd.bind_vertex_buffers(0, &[quad.vertex_buffer], &[0]);
        cmd.bind_index_buffer(quad.index_buffer, 0, vk::IndexType::UINT32);
        cmd.draw_indexed(quad.index_cnt, 0, 1, 0, 0);

        cmd.end_render_pass();

        self.lighting_target.transition(&cmd, TargetLayout::ReadOptimal);

        cmd.end();
    }
}

// getters
impl ShadingPass {
    #[inline]
    pub fn command_buffer(&self) -> &GfxCommandBuffer {
        &self.command_buffer
    }

    #[inline]
    pub fn lighting_view(&self) -> vk::ImageView {
        self.lighting_target.view()
    }

    #[inline]
    pub fn lighting_sampler(&self) -> vk::Sampler {
        self.lighting_target.sampler()
    }

    #[inline]
    pub fn lighting_target_mut(&mut self) -> &mut RenderTarget {
        &mut self.lighting_target
    }
}

// destroy
impl ShadingPass {
    pub fn destroy(self) {
        self.command_buffer.free();
        self.geometry_pipeline.destroy();
        self.lighting_pipeline.destroy();
        self.geometry_set_layout.destroy();
        self.lighting_set_layout.destroy();
        self.framebuffer.destroy();
        self.render_pass.destroy();
        self.position_target.destroy();
        self.normal_target.destroy();
        self.color_target.destroy();
        self.lighting_target.destroy();
    }
}
