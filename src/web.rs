//! WASM entry point: the room in a `<canvas id="canvas">`, with the page's
//! `<video id="video">` as the screen's source and models fetched over HTTP.

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{HtmlCanvasElement, HtmlVideoElement};
use winit::application::ApplicationHandler;
use winit::dpi::PhysicalSize;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::platform::web::EventLoopExtWebSys;
use winit::platform::web::WindowAttributesExtWebSys;
use winit::window::{Window, WindowId};

use crate::assets::{parse_model, LoadReporter};
use crate::config::AppConfig;
use crate::error::{AssetError, VideoError};
use crate::frame::Session;
use crate::input::{DesktopEmulator, EmulatorKey, InputCommand};
use crate::render::{DebugRenderer, GpuContext, LineBatch};
use crate::video::{PlaybackClock, VideoSource};

/// The page's video element.
pub struct HtmlVideoSource {
    element: HtmlVideoElement,
}

impl HtmlVideoSource {
    pub fn find(id: &str) -> Option<Self> {
        let element = web_sys::window()?
            .document()?
            .get_element_by_id(id)?
            .dyn_into::<HtmlVideoElement>()
            .ok()?;
        Some(Self { element })
    }
}

impl VideoSource for HtmlVideoSource {
    fn is_playing(&self) -> bool {
        !self.element.paused()
    }

    fn play(&mut self) -> Result<(), VideoError> {
        let promise = self
            .element
            .play()
            .map_err(|err| VideoError(format!("{err:?}")))?;
        // Autoplay refusals arrive asynchronously; the next frame retries.
        wasm_bindgen_futures::spawn_local(async move {
            if let Err(err) = JsFuture::from(promise).await {
                log::debug!("video play rejected: {err:?}");
            }
        });
        Ok(())
    }

    fn current_time(&self) -> f64 {
        self.element.current_time()
    }
}

async fn fetch_bytes(url: &str) -> Result<Vec<u8>, AssetError> {
    let fetch_err = |reason: String| AssetError::Fetch {
        url: url.to_string(),
        reason,
    };
    let window = web_sys::window().ok_or_else(|| fetch_err("no window".into()))?;

    let response: web_sys::Response = JsFuture::from(window.fetch_with_str(url))
        .await
        .and_then(|value| value.dyn_into())
        .map_err(|err| fetch_err(format!("{err:?}")))?;
    if !response.ok() {
        return Err(fetch_err(format!("HTTP {}", response.status())));
    }

    let buffer = response.array_buffer().map_err(|err| fetch_err(format!("{err:?}")))?;
    let buffer = JsFuture::from(buffer)
        .await
        .map_err(|err| fetch_err(format!("{err:?}")))?;
    Ok(js_sys::Uint8Array::new(&buffer).to_vec())
}

fn spawn_fetch(reporter: LoadReporter) {
    wasm_bindgen_futures::spawn_local(async move {
        let url = reporter.path().to_string_lossy().into_owned();
        reporter.progress(0, None);
        let result = match fetch_bytes(&url).await {
            Ok(bytes) => {
                let total = bytes.len() as u64;
                reporter.progress(total, Some(total));
                parse_model(reporter.path(), &bytes)
            }
            Err(err) => Err(err),
        };
        reporter.finish(result);
    });
}

struct GpuState {
    context: Option<GpuContext>,
    renderer: Option<DebugRenderer>,
}

struct App {
    config: AppConfig,
    window: Option<Arc<Window>>,
    gpu: Rc<RefCell<GpuState>>,
    session: Option<Session>,
    batch: LineBatch,
    emulator: DesktopEmulator,
}

impl App {
    fn new(config: AppConfig) -> Self {
        Self {
            config,
            window: None,
            gpu: Rc::new(RefCell::new(GpuState {
                context: None,
                renderer: None,
            })),
            session: None,
            batch: LineBatch::new(),
            emulator: DesktopEmulator::new(),
        }
    }

    fn push(&mut self, command: Option<InputCommand>) {
        if let (Some(command), Some(session)) = (command, self.session.as_mut()) {
            session.push_input(command);
        }
    }

    fn frame(&mut self) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        session.tick(&mut self.batch);

        let mut gpu = self.gpu.borrow_mut();
        let GpuState { context, renderer } = &mut *gpu;
        if let (Some(context), Some(renderer)) = (context.as_mut(), renderer.as_mut()) {
            renderer.render(context, &self.batch);
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }

        let Some(canvas) = web_sys::window()
            .and_then(|w| w.document())
            .and_then(|d| d.get_element_by_id("canvas"))
            .and_then(|e| e.dyn_into::<HtmlCanvasElement>().ok())
        else {
            log::error!("no <canvas id=\"canvas\"> on the page");
            return;
        };

        let width = canvas.width().max(1);
        let height = canvas.height().max(1);
        let window_attrs = Window::default_attributes()
            .with_canvas(Some(canvas))
            .with_inner_size(PhysicalSize::new(width, height));
        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(err) => {
                log::error!("could not create window: {err}");
                return;
            }
        };
        self.window = Some(window.clone());

        let video: Box<dyn VideoSource> = match HtmlVideoSource::find(&self.config.video.element_id) {
            Some(video) => Box::new(video),
            None => {
                log::warn!("no <video id=\"{}\">; screen stays blank", self.config.video.element_id);
                Box::new(PlaybackClock::new())
            }
        };
        let mut session = Session::new(self.config.clone(), width as f32 / height as f32, video);
        for placement in self.config.assets.models.clone() {
            spawn_fetch(session.begin_load(placement));
        }
        self.session = Some(session);

        let gpu = self.gpu.clone();
        wasm_bindgen_futures::spawn_local(async move {
            match GpuContext::new(window.clone()).await {
                Ok(context) => {
                    let renderer = DebugRenderer::new(&context);
                    let mut gpu = gpu.borrow_mut();
                    gpu.context = Some(context);
                    gpu.renderer = Some(renderer);
                }
                Err(err) => log::error!("GPU initialisation failed: {err}"),
            }
            window.request_redraw();
        });
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => event_loop.exit(),

            WindowEvent::Resized(size) => {
                if let Some(context) = self.gpu.borrow_mut().context.as_mut() {
                    context.resize(size);
                }
                if let Some(session) = self.session.as_mut() {
                    session.resize(size.width, size.height);
                }
            }

            WindowEvent::KeyboardInput { event, .. } => {
                if event.repeat {
                    return;
                }
                let pressed = event.state == ElementState::Pressed;
                let key = match event.physical_key {
                    PhysicalKey::Code(KeyCode::Space) => EmulatorKey::Select,
                    PhysicalKey::Code(KeyCode::KeyC) => EmulatorKey::ConnectPointer,
                    PhysicalKey::Code(KeyCode::KeyG) => EmulatorKey::ConnectGaze,
                    PhysicalKey::Code(KeyCode::KeyX) => EmulatorKey::Disconnect,
                    _ => return,
                };
                let command = self.emulator.on_key(key, pressed);
                self.push(command);
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

#[wasm_bindgen(start)]
pub fn main() {
    console_error_panic_hook::set_once();
    if let Err(err) = console_log::init_with_level(log::Level::Info) {
        web_sys::console::error_1(&format!("logger: {err}").into());
    }

    let event_loop = match EventLoop::new() {
        Ok(event_loop) => event_loop,
        Err(err) => {
            log::error!("could not create event loop: {err}");
            return;
        }
    };
    event_loop.spawn_app(App::new(AppConfig::default()));
}
