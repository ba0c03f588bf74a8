use ash::vk;
use glam::{Mat4, Vec3, Vec4};
use luxel_gfx::{
    commands::{semaphore::GfxSemaphore, submit_info::GfxSubmitInfo},
    gfx::Gfx,
    pipelines::descriptor::GfxDescriptorPool,
    resources::buffer::GfxBuffer,
    swapchain::render_swapchain::{GfxAcquireResult, GfxRenderSwapchain},
};
use luxel_scene::{
    mesh::{apply_uv_atlas, merged_scene_mesh, quad_mesh},
    physics::PhysicsSim,
};
use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    cadence::{FrameCadence, SubmitNode, SyncPoint},
    frame_timer::FrameTimer,
    input::InputState,
    passes::{DrawGeometry, raster_pass::RasterPass, shading_pass::ShadingPass},
    settings::{MAX_OBJECTS, RendererSettings},
    sync_chain::SyncChain,
    transform_feed::{self, ResetTrigger},
    uniforms::{GeometryUbo, RasterUbo, ShadingUbo},
};

/// 渲染核心：持有全部 GPU 资源，按 cadence 的 FramePlan 执行提交。
///
/// 调用约定：每帧先 `update` 再 `render_frame`；窗口尺寸变化时 `resize`。
pub struct Renderer {
    settings: RendererSettings,

    swapchain: GfxRenderSwapchain,
    descriptor_pool: GfxDescriptorPool,

    scene_vertex_buffer: GfxBuffer,
    scene_index_buffer: GfxBuffer,
    quad_vertex_buffer: GfxBuffer,
    quad_index_buffer: GfxBuffer,
    scene_draw: DrawGeometry,

    geometry_ubo_buffer: GfxBuffer,
    shading_ubo_buffer: GfxBuffer,
    raster_ubo_buffer: GfxBuffer,
    shading_ubo: ShadingUbo,

    shading_pass: ShadingPass,
    raster_pass: RasterPass,
    sync_chain: SyncChain,

    physics: PhysicsSim,
    reset_trigger: ResetTrigger,
    timer: FrameTimer,
    cadence: FrameCadence,

    eye_position: Vec3,
    animate_lights: bool,
    rng: StdRng,

    window_extent: vk::Extent2D,
}

// new & init
impl Renderer {
    pub fn new(
        settings: RendererSettings,
        raw_display_handle: raw_window_handle::RawDisplayHandle,
        raw_window_handle: raw_window_handle::RawWindowHandle,
    ) -> Self {
        let settings = settings.validated();
        log::info!(
            "renderer startup: run {}, {} objects, shading interval {}, buffer {}x{}",
            settings.run_id,
            settings.object_cnt,
            settings.shading_interval,
            settings.buffer_resolution,
            settings.buffer_resolution
        );

        let swapchain = GfxRenderSwapchain::new(
            raw_display_handle,
            raw_window_handle,
            vk::PresentModeKHR::FIFO,
            settings.window_extent,
        );

        // 场景 mesh：N 份 cube 合并，uv 映射进共享图集
        let mut scene_mesh = merged_scene_mesh(settings.object_cnt);
        apply_uv_atlas(&mut scene_mesh.vertices, settings.object_cnt, settings.buffer_resolution);
        let quad = quad_mesh();

        let make_vertex_buffer = |mesh: &luxel_scene::mesh::Mesh, name: &str| {
            let buffer = GfxBuffer::new(
                std::mem::size_of_val(mesh.vertices.as_slice()) as vk::DeviceSize,
                vk::BufferUsageFlags::VERTEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                false,
                name,
            );
            buffer.transfer_data_sync(&mesh.vertices);
            buffer
        };
        let make_index_buffer = |mesh: &luxel_scene::mesh::Mesh, name: &str| {
            let buffer = GfxBuffer::new(
                std::mem::size_of_val(mesh.indices.as_slice()) as vk::DeviceSize,
                vk::BufferUsageFlags::INDEX_BUFFER | vk::BufferUsageFlags::TRANSFER_DST,
                false,
                name,
            );
            buffer.transfer_data_sync(&mesh.indices);
            buffer
        };
        let scene_vertex_buffer = make_vertex_buffer(&scene_mesh, "scene-vertex-buffer");
        let scene_index_buffer = make_index_buffer(&scene_mesh, "scene-index-buffer");
        let quad_vertex_buffer = make_vertex_buffer(&quad, "quad-vertex-buffer");
        let quad_index_buffer = make_index_buffer(&quad, "quad-index-buffer");
        let scene_draw = DrawGeometry {
            vertex_buffer: scene_vertex_buffer.vk_buffer(),
            index_buffer: scene_index_buffer.vk_buffer(),
            index_cnt: scene_mesh.indices.len() as u32,
        };
        let quad_draw = DrawGeometry {
            vertex_buffer: quad_vertex_buffer.vk_buffer(),
            index_buffer: quad_index_buffer.vk_buffer(),
            index_cnt: quad.indices.len() as u32,
        };

        let geometry_ubo_buffer =
            GfxBuffer::new_uniform_buffer(size_of::<GeometryUbo>() as vk::DeviceSize, "geometry-ubo");
        let shading_ubo_buffer =
            GfxBuffer::new_uniform_buffer(size_of::<ShadingUbo>() as vk::DeviceSize, "shading-ubo");
        let raster_ubo_buffer = GfxBuffer::new_uniform_buffer(size_of::<RasterUbo>() as vk::DeviceSize, "raster-ubo");

        // 3 个 set：geometry、lighting、raster
        let descriptor_pool = GfxDescriptorPool::new(
            3,
            &[
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::UNIFORM_BUFFER,
                    descriptor_count: 3,
                },
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::INPUT_ATTACHMENT,
                    descriptor_count: 3,
                },
                vk::DescriptorPoolSize {
                    ty: vk::DescriptorType::COMBINED_IMAGE_SAMPLER,
                    descriptor_count: 1,
                },
            ],
            "renderer-descriptor-pool",
        );

        let mut shading_pass =
            ShadingPass::new(settings.buffer_resolution, &descriptor_pool, &geometry_ubo_buffer, &shading_ubo_buffer);
        let mut raster_pass = RasterPass::new(
            &swapchain,
            &descriptor_pool,
            &raster_ubo_buffer,
            shading_pass.lighting_view(),
            shading_pass.lighting_sampler(),
        );

        shading_pass.record(&scene_draw, &quad_draw, settings.clear_color);
        raster_pass.record(shading_pass.lighting_target_mut(), &scene_draw, settings.clear_color);

        let mut rng = StdRng::from_entropy();
        let mut physics = PhysicsSim::new(settings.object_cnt as usize, &mut rng);
        physics.set_positions(&transform_feed::grid_arrangement(settings.object_cnt as usize));

        let mut shading_ubo = ShadingUbo {
            light_position: Vec4::new(0.0, 4.0, 4.0, 1.0),
            ..Default::default()
        };
        Self::randomize_materials(&mut shading_ubo, settings.object_cnt as usize, &mut rng);

        let window_extent = settings.window_extent;
        let cadence = FrameCadence::new(settings.shading_interval);

        Self {
            settings,
            swapchain,
            descriptor_pool,
            scene_vertex_buffer,
            scene_index_buffer,
            quad_vertex_buffer,
            quad_index_buffer,
            scene_draw,
            geometry_ubo_buffer,
            shading_ubo_buffer,
            raster_ubo_buffer,
            shading_ubo,
            shading_pass,
            raster_pass,
            sync_chain: SyncChain::new(),
            physics,
            reset_trigger: ResetTrigger::default(),
            timer: FrameTimer::new(),
            cadence,
            eye_position: Vec3::new(0.0, 10.0, 0.0),
            animate_lights: true,
            rng,
            window_extent,
        }
    }

    fn randomize_materials(ubo: &mut ShadingUbo, object_cnt: usize, rng: &mut impl Rng) {
        for material in ubo.materials.iter_mut().take(object_cnt) {
            *material = Vec4::new(
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
                rng.gen_range(0.0..1.0),
            );
        }
    }
}

// update
impl Renderer {
    /// 推进帧计时、处理输入并发布当帧的 uniform 数据
    pub fn update(&mut self, input: &InputState) {
        // 先出新一帧的 delta，物理积分用的是本帧的时长
        self.timer.update();

        // 相机俯视 -Y，移动映射到世界轴
        if input.forwards {
            self.eye_position.y -= 0.1;
        }
        if input.backwards {
            self.eye_position.y += 0.1;
        }
        if input.up {
            self.eye_position.z += 0.1;
        }
        if input.down {
            self.eye_position.z -= 0.1;
        }
        if input.left {
            self.eye_position.x += 0.1;
        }
        if input.right {
            self.eye_position.x -= 0.1;
        }

        if input.toggle_light_animation {
            self.animate_lights = !self.animate_lights;
            log::info!("light animation: {}", self.animate_lights);
        }
        if input.regenerate_materials {
            Self::randomize_materials(&mut self.shading_ubo, self.settings.object_cnt as usize, &mut self.rng);
        }
        if input.cycle_reset {
            self.reset_trigger = self.reset_trigger.advance();
            log::info!("reset trigger: {:?}", self.reset_trigger);
        }

        match self.reset_trigger {
            ResetTrigger::Rearrange => {
                self.physics.set_positions(&transform_feed::grid_arrangement(self.settings.object_cnt as usize));
                self.physics.reseed(&mut self.rng);
                self.timer.reset_timer();
                self.reset_trigger = ResetTrigger::Idle;
            }
            ResetTrigger::PhysicsResume => {
                self.physics.step(self.timer.delta());
            }
            ResetTrigger::Idle => {}
        }

        if self.animate_lights {
            self.timer.advance();
        }

        self.publish_uniforms();
    }

    fn publish_uniforms(&mut self) {
        let mut models = [Mat4::IDENTITY; MAX_OBJECTS];
        for (model, pose) in models.iter_mut().zip(self.physics.poses()) {
            *model = transform_feed::model_matrix(pose.position, pose.orientation);
        }

        let geometry_ubo = GeometryUbo { model: models };
        self.geometry_ubo_buffer.transfer_data_by_mmap(std::slice::from_ref(&geometry_ubo));

        if self.animate_lights {
            let timer = self.timer.timer();
            self.shading_ubo.light_position.x = f32::sin(timer * 0.1) * 4.0;
            self.shading_ubo.light_position.y = f32::cos(timer * 0.1) * 4.0;
        }
        self.shading_ubo.eye_position = self.eye_position.extend(1.0);
        self.shading_ubo_buffer.transfer_data_by_mmap(std::slice::from_ref(&self.shading_ubo));

        let extent = self.swapchain.extent();
        let aspect = extent.width as f32 / extent.height as f32;
        let mut proj = Mat4::perspective_rh(60.0_f32.to_radians(), aspect, 0.01, 100.0);
        // Vulkan clip space 的 y 轴向下
        proj.y_axis.y *= -1.0;
        let view = Mat4::look_at_rh(
            self.eye_position,
            self.eye_position + Vec3::new(0.0, -1.0, 0.0),
            Vec3::new(0.0, 0.0, 1.0),
        );
        let raster_ubo = RasterUbo {
            model: models,
            view,
            proj,
        };
        self.raster_ubo_buffer.transfer_data_by_mmap(std::slice::from_ref(&raster_ubo));
    }
}

// render
impl Renderer {
    /// 执行一帧：展开 cadence 的 FramePlan 并逐节点提交。
    ///
    /// 提交失败只记录日志并跳过该节点，下一帧继续。
    pub fn render_frame(&mut self) {
        let _span = tracy_client::span!("render_frame");

        let plan = self.cadence.plan(self.timer.frame());
        log::debug!("frame {}: {:?}", self.timer.frame(), plan.path);

        let queue = Gfx::get().gfx_queue();
        let mut need_recreate = false;

        for node in &plan.nodes {
            match node {
                SubmitNode::Shading { signals } => {
                    let mut submit = GfxSubmitInfo::new(std::slice::from_ref(self.shading_pass.command_buffer()));
                    for point in signals {
                        submit = submit.signal(self.semaphore_for(*point), vk::PipelineStageFlags2::ALL_COMMANDS);
                    }
                    if let Err(e) = queue.submit(vec![submit], None) {
                        log::error!("shading submit failed: {:?}", e);
                    }
                }
                SubmitNode::AcquireSurface { signals } => {
                    let semaphore = self.semaphore_for(signals[0]).clone();
                    match self.swapchain.acquire_next_image(Some(&semaphore), None, u64::MAX) {
                        GfxAcquireResult::Success => {}
                        GfxAcquireResult::Suboptimal => need_recreate = true,
                        GfxAcquireResult::OutOfDate => {
                            // 没有取到 image，semaphore 未被 signal，
                            // 剩余节点都依赖 surface，不能再提交
                            log::warn!("dropping frame {}: surface out of date", self.timer.frame());
                            self.abort_frame();
                            return;
                        }
                    }
                }
                SubmitNode::Raster { waits, signals } => {
                    let slot = self.swapchain.current_image_index();
                    let mut submit = GfxSubmitInfo::new(std::slice::from_ref(self.raster_pass.command_buffer(slot)));
                    for point in waits {
                        submit = submit.wait(self.semaphore_for(*point), Self::wait_stage(*point));
                    }
                    for point in signals {
                        submit = submit.signal(self.semaphore_for(*point), vk::PipelineStageFlags2::ALL_COMMANDS);
                    }
                    if let Err(e) = queue.submit(vec![submit], None) {
                        log::error!("raster submit failed: {:?}", e);
                    }
                }
                SubmitNode::Present { waits } => {
                    let wait_semaphores: Vec<GfxSemaphore> =
                        waits.iter().map(|p| self.semaphore_for(*p).clone()).collect();
                    need_recreate |= self.swapchain.present_image(queue, &wait_semaphores);
                }
            }
        }

        // binary semaphore 复用依赖帧尾的 queue idle
        queue.wait_idle();

        if need_recreate {
            self.resize(self.window_extent);
        }
    }

    /// acquire 拿不到 image 时放弃本帧剩余的提交。
    ///
    /// full render 路径下 shading 可能已经 signal 过 shading_complete 且无人等待，
    /// binary semaphore 不能重复 signal，等 queue 空闲后整条 sync chain 重建。
    fn abort_frame(&mut self) {
        Gfx::get().gfx_queue().wait_idle();
        let stale = std::mem::take(&mut self.sync_chain);
        stale.destroy();
        self.resize(self.window_extent);
    }

    fn semaphore_for(&self, point: SyncPoint) -> &GfxSemaphore {
        match point {
            SyncPoint::SurfaceAcquired => &self.sync_chain.surface_acquired,
            SyncPoint::ShadingComplete => &self.sync_chain.shading_complete,
            SyncPoint::RenderComplete => &self.sync_chain.render_complete,
        }
    }

    /// raster 等待 lighting 结果到 fragment 采样为止，
    /// 等待 swapchain image 到写入 color attachment 为止
    fn wait_stage(point: SyncPoint) -> vk::PipelineStageFlags2 {
        match point {
            SyncPoint::ShadingComplete => vk::PipelineStageFlags2::FRAGMENT_SHADER,
            SyncPoint::SurfaceAcquired => vk::PipelineStageFlags2::COLOR_ATTACHMENT_OUTPUT,
            SyncPoint::RenderComplete => vk::PipelineStageFlags2::ALL_COMMANDS,
        }
    }

    /// 窗口尺寸变化：重建 swapchain 与 raster 的逐 slot 资源并重录命令。
    /// shading group 分辨率固定，不受影响。
    pub fn resize(&mut self, window_physical_extent: vk::Extent2D) {
        Gfx::get().wait_idle();

        self.window_extent = window_physical_extent;
        self.swapchain.recreate(window_physical_extent);
        self.raster_pass.recreate(&self.swapchain);
        self.raster_pass.record(
            self.shading_pass.lighting_target_mut(),
            &self.scene_draw,
            self.settings.clear_color,
        );
    }
}

// destroy
impl Renderer {
    pub fn destroy(self) {
        Gfx::get().wait_idle();

        self.raster_pass.destroy();
        self.shading_pass.destroy();
        self.sync_chain.destroy();
        self.descriptor_pool.destroy();

        self.geometry_ubo_buffer.destroy();
        self.shading_ubo_buffer.destroy();
        self.raster_ubo_buffer.destroy();
        self.scene_vertex_buffer.destroy();
        self.scene_index_buffer.destroy();
        self.quad_vertex_buffer.destroy();
        self.quad_index_buffer.destroy();

        self.swapchain.destroy();
    }
}
