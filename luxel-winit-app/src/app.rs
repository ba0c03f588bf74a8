use ash::vk;
use luxel_gfx::gfx::Gfx;
use luxel_renderer::{input::InputState, renderer::Renderer, settings::RendererSettings};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use winit::{
    application::ApplicationHandler,
    event::{ElementState, KeyEvent, WindowEvent},
    event_loop::ActiveEventLoop,
    keyboard::{KeyCode, PhysicalKey},
    window::{Window, WindowId},
};

/// 把 winit 的键盘事件累积成渲染核心的每帧输入快照。
/// 移动键记录按住状态，toggle 键记录按下边沿，取走快照后边沿位清零。
#[derive(Default)]
struct KeyTracker {
    forwards: bool,
    backwards: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,

    toggle_light_animation: bool,
    regenerate_materials: bool,
    cycle_reset: bool,
}

impl KeyTracker {
    fn handle_key(&mut self, event: &KeyEvent) {
        let pressed = event.state == ElementState::Pressed;
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        match code {
            KeyCode::KeyW => self.forwards = pressed,
            KeyCode::KeyS => self.backwards = pressed,
            KeyCode::KeyA => self.left = pressed,
            KeyCode::KeyD => self.right = pressed,
            KeyCode::KeyE => self.up = pressed,
            KeyCode::KeyQ => self.down = pressed,

            KeyCode::KeyL if pressed && !event.repeat => self.toggle_light_animation = true,
            KeyCode::KeyM if pressed && !event.repeat => self.regenerate_materials = true,
            KeyCode::KeyR if pressed && !event.repeat => self.cycle_reset = true,
            _ => {}
        }
    }

    fn take_snapshot(&mut self) -> InputState {
        let snapshot = InputState {
            forwards: self.forwards,
            backwards: self.backwards,
            left: self.left,
            right: self.right,
            up: self.up,
            down: self.down,
            toggle_light_animation: self.toggle_light_animation,
            regenerate_materials: self.regenerate_materials,
            cycle_reset: self.cycle_reset,
        };
        self.toggle_light_animation = false;
        self.regenerate_materials = false;
        self.cycle_reset = false;
        snapshot
    }
}

pub struct LuxelApp {
    settings: RendererSettings,

    window: Option<Window>,
    renderer: Option<Renderer>,
    keys: KeyTracker,
}

// 总的 main 函数
impl LuxelApp {
    /// 整个程序的入口
    pub fn run(settings: RendererSettings) {
        let event_loop = winit::event_loop::EventLoop::new().unwrap();

        let mut app = Self {
            settings,
            window: None,
            renderer: None,
            keys: KeyTracker::default(),
        };
        event_loop.run_app(&mut app).unwrap();

        log::info!("end run.");
        app.destroy();
    }
}

// new & init
impl LuxelApp {
    /// 在 window 创建之后调用，初始化 Gfx 与 Renderer
    fn init_after_window(&mut self, event_loop: &ActiveEventLoop) {
        let window_attr = Window::default_attributes()
            .with_title(format!("Luxel - run {}", self.settings.run_id))
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.settings.window_extent.width as f64,
                self.settings.window_extent.height as f64,
            ));
        let window = event_loop.create_window(window_attr).unwrap();

        let raw_display_handle = window.display_handle().unwrap().as_raw();
        let raw_window_handle = window.window_handle().unwrap().as_raw();
        Gfx::init(raw_display_handle, "luxel");

        let physical_size = window.inner_size();
        let mut settings = self.settings.clone();
        settings.window_extent = vk::Extent2D {
            width: physical_size.width,
            height: physical_size.height,
        };

        self.renderer = Some(Renderer::new(settings, raw_display_handle, raw_window_handle));
        self.window = Some(window);
    }
}

// destroy
impl LuxelApp {
    fn destroy(mut self) {
        if let Some(renderer) = self.renderer.take() {
            renderer.destroy();
        }
        Gfx::get().shutdown();
        self.window = None;
    }
}

impl ApplicationHandler for LuxelApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        assert!(self.window.is_none(), "window should be None when resumed.");
        log::info!("winit event: resumed");

        self.init_after_window(event_loop);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _window_id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::KeyboardInput { event, .. } => {
                self.keys.handle_key(&event);
            }
            WindowEvent::Resized(size) => {
                if let Some(renderer) = self.renderer.as_mut() {
                    if size.width > 0 && size.height > 0 {
                        renderer.resize(vk::Extent2D {
                            width: size.width,
                            height: size.height,
                        });
                    }
                }
            }
            WindowEvent::RedrawRequested => {
                if let Some(renderer) = self.renderer.as_mut() {
                    let input = self.keys.take_snapshot();
                    renderer.update(&input);
                    renderer.render_frame();
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
        if let Some(window) = self.window.as_ref() {
            window.request_redraw();
        }
    }

    fn exiting(&mut self, _event_loop: &ActiveEventLoop) {
        log::info!("loop exiting");
    }
}
