use std::sync::Arc;
use std::time::Instant;

use tracing::{error, info, warn};
use winit::{
    dpi::PhysicalSize,
    event::*,
    event_loop::EventLoop,
    keyboard::PhysicalKey,
    window::{CursorGrabMode, Window},
};

use gravflip::{
    config::{GameConfig, DEFAULT_CONFIG_PATH},
    controller::{input::native, FrameHost, FrameView, GameLoop, InputEvent, InputProcessor, InputState},
    logging, ui,
    view::{render, CameraUniform, GpuContext, LightingUniform, RenderState},
    Result,
};

/// Window side of the game loop: owns the GPU resources and egui
struct Presenter {
    window: Arc<Window>,
    gpu: GpuContext,
    render_state: RenderState,
    depth_texture: wgpu::Texture,
    depth_view: wgpu::TextureView,
    camera_buffer: wgpu::Buffer,
    lighting_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,

    egui_ctx: egui::Context,
    egui_state: egui_winit::State,

    title: String,
    fatal: bool,
}

impl Presenter {
    async fn new(window: Arc<Window>) -> Result<Self> {
        let gpu = GpuContext::new(window.clone()).await?;
        let (width, height) = (gpu.config.width, gpu.config.height);

        let depth_format = wgpu::TextureFormat::Depth32Float;
        let (depth_texture, depth_view) = render::create_depth_texture(&gpu.device, width, height);

        let camera_resources = render::create_camera_resources(&gpu.device);
        let pipelines = render::create_scene_pipelines(&gpu.device, gpu.format, &camera_resources.bind_group_layout, depth_format);
        if pipelines.wireframe_pipeline.is_none() {
            warn!("line polygon mode unavailable, destroyed objects will not be drawn");
        }

        let egui_ctx = egui::Context::default();
        let egui_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui::ViewportId::ROOT,
            &window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(
            &gpu.device,
            gpu.format,
            egui_wgpu::RendererOptions::default(),
        );

        let render_state = RenderState::new(gpu.format, gpu.config.alpha_mode, width, height, pipelines, egui_renderer);

        Ok(Self {
            window,
            gpu,
            render_state,
            depth_texture,
            depth_view,
            camera_buffer: camera_resources.camera_buffer,
            lighting_buffer: camera_resources.lighting_buffer,
            camera_bind_group: camera_resources.camera_bind_group,
            egui_ctx,
            egui_state,
            title: String::new(),
            fatal: false,
        })
    }

    fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.gpu.resize(new_size.width, new_size.height);
        self.render_state.width = new_size.width;
        self.render_state.height = new_size.height;

        let (depth_texture, depth_view) = render::create_depth_texture(&self.gpu.device, new_size.width, new_size.height);
        self.depth_texture = depth_texture;
        self.depth_view = depth_view;
    }

    fn write_uniforms(&self, frame: &FrameView<'_>) {
        let mut camera = frame.player.view_camera().clone();
        camera.set_aspect(self.gpu.config.width, self.gpu.config.height);
        let camera_data = CameraUniform { view_proj: camera.view_proj().to_cols_array_2d() };
        self.gpu.queue.write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&camera_data));

        let light = frame.player.light();
        let point = (frame.player.is_playing() && light.node.visible)
            .then(|| (frame.player.light_world_position(), light.radius));
        let lighting_data = LightingUniform::new(frame.ctx.lighting, point);
        self.gpu.queue.write_buffer(&self.lighting_buffer, 0, bytemuck::bytes_of(&lighting_data));
    }

    fn run_ui(&mut self, frame: &FrameView<'_>) {
        let raw_input = self.egui_state.take_egui_input(&self.window);
        let output = ui::build_ui(&self.egui_ctx, raw_input, frame);
        self.egui_state.handle_platform_output(&self.window, output.platform_output);

        self.render_state.egui_dpr = output.pixels_per_point;
        self.render_state.egui_primitives = Some(self.egui_ctx.tessellate(output.shapes, output.pixels_per_point));
        self.render_state.egui_textures = Some(output.textures_delta);
    }
}

impl FrameHost for Presenter {
    fn set_title(&mut self, title: &str) {
        if self.title != title {
            self.window.set_title(title);
            self.title = title.to_string();
        }
    }

    fn draw(&mut self, frame: &FrameView<'_>) {
        self.render_state.sync_scene(&self.gpu.device, frame.scene);
        self.write_uniforms(frame);
        self.run_ui(frame);

        let player_mesh = render::build_player_mesh(frame.player);
        let player_buffer = (!player_mesh.is_empty()).then(|| player_mesh.upload(&self.gpu.device));

        let result = self.render_state.draw_frame(
            &self.gpu.device,
            &self.gpu.queue,
            &self.gpu.surface,
            &self.depth_view,
            &self.camera_bind_group,
            player_buffer.as_ref(),
            render::clear_color(frame.ctx.lighting),
        );
        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => self.gpu.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU out of memory");
                self.fatal = true;
            }
            Err(e) => warn!("surface error: {e:?}"),
        }
    }
}

fn set_pointer_lock(window: &Window, input: &mut InputState, locked: bool) {
    if locked {
        let grabbed = window
            .set_cursor_grab(CursorGrabMode::Locked)
            .or_else(|_| window.set_cursor_grab(CursorGrabMode::Confined));
        if let Err(e) = grabbed {
            warn!("could not grab cursor: {e}");
            return;
        }
    } else {
        let _ = window.set_cursor_grab(CursorGrabMode::None);
    }
    window.set_cursor_visible(!locked);
    input.process_event(&InputEvent::PointerLockChanged { locked });
}

/// Feed a window event to the input state. Returns true when handled.
fn handle_input(window: &Window, bindings: &InputProcessor, input: &mut InputState, event: &WindowEvent) -> bool {
    match event {
        WindowEvent::KeyboardInput { event: KeyEvent { state, physical_key, .. }, .. } => {
            if let PhysicalKey::Code(code) = physical_key {
                let is_escape = native::key_name(*code).is_some_and(|key| bindings.is_escape(key));
                if is_escape && state.is_pressed() {
                    set_pointer_lock(window, input, false);
                }
                if let Some(ev) = native::keyboard_to_input(*code, *state) {
                    input.process_event(&ev);
                }
            }
            true
        }
        WindowEvent::MouseInput { state, button, .. } => {
            if state.is_pressed() && !input.pointer_locked {
                set_pointer_lock(window, input, true);
            }
            if let Some(ev) = native::mouse_click_to_input(*button, *state) {
                input.process_event(&ev);
            }
            true
        }
        WindowEvent::Focused(false) => {
            input.process_event(&InputEvent::FocusLost);
            set_pointer_lock(window, input, false);
            true
        }
        _ => false,
    }
}

fn run() -> Result<()> {
    let config = GameConfig::load(DEFAULT_CONFIG_PATH)?;
    info!(score_log = %config.score_log_path.display(), "configuration loaded");

    let event_loop = EventLoop::new()?;
    let window_attributes = Window::default_attributes()
        .with_title("gravflip")
        .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
    let window = Arc::new(event_loop.create_window(window_attributes)?);

    let mut presenter = pollster::block_on(Presenter::new(window.clone()))?;
    let bindings = InputProcessor::default();
    let mut game = GameLoop::new(config, bindings.clone());
    let mut input = InputState::new();
    let start = Instant::now();

    event_loop.run(move |event, elwt| {
        match event {
            Event::WindowEvent { ref event, window_id } if window_id == window.id() => {
                let egui_consumed = presenter.egui_state.on_window_event(&window, event).consumed;
                if !input.pointer_locked && egui_consumed {
                    return;
                }
                if handle_input(&window, &bindings, &mut input, event) {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested => elwt.exit(),
                    WindowEvent::Resized(physical_size) => presenter.resize(*physical_size),
                    WindowEvent::RedrawRequested => {
                        let now_ms = start.elapsed().as_secs_f64() * 1000.0;
                        if let Some(outcome) = game.tick(now_ms, &mut input, &mut presenter) {
                            info!(?outcome, round = game.round(), "next round");
                        }
                        if presenter.fatal {
                            elwt.exit();
                        }
                    }
                    _ => {}
                }
            }
            Event::DeviceEvent { event: DeviceEvent::MouseMotion { delta }, .. } => {
                input.process_event(&native::mouse_move_to_input(delta.0, delta.1));
            }
            Event::AboutToWait => {
                window.request_redraw();
            }
            _ => {}
        }
    })?;
    Ok(())
}

fn main() {
    logging::init();

    if let Err(e) = run() {
        error!("{e}");
        std::process::exit(1);
    }
}
