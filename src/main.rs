use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use xr_locomotion::render::{acquire_frame, DebugRenderer, GpuContext, LineBatch};
use xr_locomotion::{
    AppConfig, DesktopEmulator, EmulatorKey, FramePhase, FrameStatus, InputCommand, PlaybackClock, Session,
};

const DEFAULT_CONFIG: &str = "room.toml";

struct Hud {
    state: egui_winit::State,
    renderer: egui_wgpu::Renderer,
    fps: f32,
}

struct Gpu {
    context: GpuContext,
    renderer: DebugRenderer,
    hud: Hud,
}

struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    gpu: Option<Gpu>,
    session: Option<Session>,
    batch: LineBatch,
    emulator: DesktopEmulator,
    last_status: Option<FrameStatus>,
    error: Option<anyhow::Error>,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: None,
            session: None,
            batch: LineBatch::new(),
            emulator: DesktopEmulator::new(),
            last_status: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<()> {
        let window_attrs = Window::default_attributes()
            .with_title("XR Room")
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));
        let window = Arc::new(event_loop.create_window(window_attrs).context("creating window")?);

        let context = pollster::block_on(GpuContext::new(window.clone())).context("initialising GPU")?;
        let renderer = DebugRenderer::new(&context);

        let egui_ctx = egui::Context::default();
        let state = egui_winit::State::new(
            egui_ctx,
            egui::ViewportId::ROOT,
            &window,
            Some(window.scale_factor() as f32),
            None,
            None,
        );
        let hud_renderer = egui_wgpu::Renderer::new(&context.device, context.config.format, None, 1, false);

        let mut session = Session::new(self.config.clone(), context.aspect_ratio(), Box::new(PlaybackClock::new()));
        session.load_models_from_disk();

        self.window = Some(window.clone());
        self.session = Some(session);
        self.gpu = Some(Gpu {
            context,
            renderer,
            hud: Hud {
                state,
                renderer: hud_renderer,
                fps: 0.0,
            },
        });
        window.request_redraw();
        Ok(())
    }

    fn push(&mut self, command: Option<InputCommand>) {
        if let (Some(command), Some(session)) = (command, self.session.as_mut()) {
            session.push_input(command);
        }
    }

    fn frame(&mut self) {
        let (Some(window), Some(gpu), Some(session)) = (self.window.as_ref(), self.gpu.as_mut(), self.session.as_mut())
        else {
            return;
        };

        let status = session.tick(&mut self.batch);
        if status.dt > 0.0 {
            let fps = 1.0 / status.dt;
            gpu.hud.fps = if gpu.hud.fps == 0.0 { fps } else { gpu.hud.fps * 0.9 + fps * 0.1 };
        }
        self.last_status = Some(status);

        let Some(output) = acquire_frame(&mut gpu.context) else {
            return;
        };
        let view = output.texture.create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = gpu.context.device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("Frame Encoder"),
        });
        gpu.renderer.draw(&gpu.context, &mut encoder, &view, &self.batch);

        let raw_input = gpu.hud.state.take_egui_input(window);
        let egui_ctx = gpu.hud.state.egui_ctx().clone();
        let fps = gpu.hud.fps;
        let full_output = egui_ctx.run(raw_input, |ctx| draw_hud(ctx, session, &status, fps));
        gpu.hud.state.handle_platform_output(window, full_output.platform_output);
        let clipped_primitives = egui_ctx.tessellate(full_output.shapes, full_output.pixels_per_point);

        let context = &gpu.context;
        for (id, delta) in &full_output.textures_delta.set {
            gpu.hud.renderer.update_texture(&context.device, &context.queue, *id, delta);
        }
        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [context.size.width, context.size.height],
            pixels_per_point: full_output.pixels_per_point,
        };
        gpu.hud.renderer.update_buffers(
            &context.device,
            &context.queue,
            &mut encoder,
            &clipped_primitives,
            &screen_descriptor,
        );
        {
            let render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("HUD Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                timestamp_writes: None,
                occlusion_query_set: None,
            });
            let mut render_pass = render_pass.forget_lifetime();
            gpu.hud.renderer.render(&mut render_pass, &clipped_primitives, &screen_descriptor);
        }
        for id in &full_output.textures_delta.free {
            gpu.hud.renderer.free_texture(id);
        }

        context.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

fn draw_hud(ctx: &egui::Context, session: &Session, status: &FrameStatus, fps: f32) {
    egui::Window::new("Room")
        .default_pos([10.0, 10.0])
        .resizable(false)
        .show(ctx, |ui| {
            if let FramePhase::Loading { progress } = status.phase {
                ui.label("Loading models");
                ui.add(egui::ProgressBar::new(progress).show_percentage());
                return;
            }

            ui.label(format!("{fps:.0} fps"));
            match session.controller() {
                Some(controller) => ui.label(format!(
                    "Controller: {}{}",
                    controller.mode,
                    if controller.select_pressed { " (select)" } else { "" }
                )),
                None => ui.label("No controller. C: pointer, G: gaze"),
            };

            let dolly = session.stage().dolly_position();
            ui.label(format!("Dolly: {:.2} {:.2} {:.2}", dolly.x, dolly.y, dolly.z));
            if let Some(step) = status.step {
                let ahead = step
                    .forward_distance
                    .map(|d| format!("{d:.2} m"))
                    .unwrap_or_else(|| "clear".to_string());
                ui.label(format!(
                    "Ahead: {ahead}{}",
                    if step.moved_forward { "" } else { " (blocked)" }
                ));
                if step.corrected() {
                    ui.label(format!(
                        "Side push: {:+.2} / {:+.2}",
                        step.left_correction, step.right_correction
                    ));
                }
            }

            ui.label(format!(
                "Video: {:.1} s{}",
                session.video().current_time(),
                if status.video_playing { "" } else { " (paused)" }
            ));
            for (label, reason) in session.tracker().failures() {
                ui.colored_label(egui::Color32::LIGHT_RED, format!("{label}: {reason}"));
            }
        });
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(err) = self.init(event_loop) {
            self.error = Some(err);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        if let (Some(gpu), Some(window)) = (self.gpu.as_mut(), self.window.as_ref()) {
            let response = gpu.hud.state.on_window_event(window, &event);
            if response.consumed {
                return;
            }
        }

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => {
                if let Some(gpu) = self.gpu.as_mut() {
                    gpu.context.resize(size);
                }
                if let Some(session) = self.session.as_mut() {
                    session.resize(size.width, size.height);
                }
            }
            WindowEvent::KeyboardInput { event, .. } => {
                let pressed = event.state == ElementState::Pressed;
                if let PhysicalKey::Code(code) = event.physical_key {
                    let key = match code {
                        KeyCode::Escape => {
                            event_loop.exit();
                            return;
                        }
                        KeyCode::Space => EmulatorKey::Select,
                        KeyCode::KeyC => EmulatorKey::ConnectPointer,
                        KeyCode::KeyG => EmulatorKey::ConnectGaze,
                        KeyCode::KeyX => EmulatorKey::Disconnect,
                        _ => return,
                    };
                    if event.repeat {
                        return;
                    }
                    let command = self.emulator.on_key(key, pressed);
                    self.push(command);
                }
            }
            WindowEvent::MouseInput { state, button, .. } => {
                let pressed = state == ElementState::Pressed;
                let command = match button {
                    MouseButton::Left => self.emulator.on_mouse_button(0, pressed),
                    MouseButton::Right => self.emulator.on_mouse_button(1, pressed),
                    _ => None,
                };
                self.push(command);
            }
            WindowEvent::CursorMoved { position, .. } => {
                self.emulator.on_mouse_move(position.x as f32, position.y as f32);
                if let Some(session) = self.session.as_mut() {
                    session.set_head_rotation(self.emulator.head_rotation());
                }
            }
            WindowEvent::RedrawRequested => {
                self.frame();
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
            }
            _ => {}
        }
    }
}

fn load_config() -> Result<AppConfig> {
    match std::env::args_os().nth(1).map(PathBuf::from) {
        Some(path) => AppConfig::load(&path).with_context(|| format!("loading {}", path.display())),
        None => {
            let path = PathBuf::from(DEFAULT_CONFIG);
            if path.exists() {
                AppConfig::load(&path).with_context(|| format!("loading {}", path.display()))
            } else {
                log::info!("no {DEFAULT_CONFIG} found, using built-in room");
                Ok(AppConfig::default())
            }
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = load_config()?;
    let event_loop = EventLoop::new().context("creating event loop")?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).context("running event loop")?;

    match app.error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
