use std::any::Any;
use std::env;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use glam::Vec2;
use log::{debug, error, info, warn};
use pollster::block_on;
use winit::application::ApplicationHandler;
use winit::dpi::{LogicalSize, PhysicalSize};
use winit::event::{
    ElementState, KeyEvent, MouseButton as WinitMouseButton, MouseScrollDelta, WindowEvent,
};
use winit::event_loop::{ActiveEventLoop, EventLoop};
use winit::keyboard::{KeyCode, ModifiersState, PhysicalKey};
use winit::window::{Window, WindowId};

use disco_scene::app::{self, DEFAULT_VIEWPORT};
use disco_scene::{
    Clock, DataModel, DebugPanel, InputState, ManualClock, MouseButton, RenderLoop, Renderer,
    Resize, Scheduler, SystemClock, Viewport,
};

const WINDOW_TITLE: &str = "Disco Scene";

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    env_logger::init();
    if let Err(err) = run() {
        eprintln!("Error: {err:?}");
        std::process::exit(1);
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {}

fn run() -> Result<()> {
    let options = CliOptions::parse()?;
    let scene = app::load_scene(options.scene.as_deref())?;
    println!("{}", app::describe_scene(&scene));

    let model = DataModel::new(scene);

    if options.summary_only {
        return run_headless(&options, model);
    }

    let result = match options.time_ms {
        Some(time_ms) => run_interactive(model.clone(), ManualClock::new(time_ms)),
        None => run_interactive(model.clone(), SystemClock),
    };
    match result {
        Ok(()) => Ok(()),
        Err(err) if err.downcast_ref::<WindowInitError>().is_some() => {
            eprintln!(
                "{err}. Falling back to --summary-only mode (set DISPLAY or install X11 libs to enable rendering)."
            );
            run_headless(&options, model)
        }
        Err(err) => Err(err),
    }
}

fn run_headless(options: &CliOptions, model: DataModel) -> Result<()> {
    let frames = match options.time_ms {
        Some(time_ms) => app::run_headless(model.clone(), options.frames, ManualClock::new(time_ms)),
        None => app::run_headless(model.clone(), options.frames, SystemClock),
    };
    app::print_final_state(&model, frames);
    Ok(())
}

fn run_interactive<C: Clock>(model: DataModel, clock: C) -> Result<()> {
    let default_hook = panic::take_hook();
    panic::set_hook(Box::new(|_| {}));
    let event_loop = panic::catch_unwind(AssertUnwindSafe(EventLoop::new));
    panic::set_hook(default_hook);
    let event_loop = event_loop
        .map_err(|panic| WindowInitError::from_panic("event loop", panic))?
        .map_err(|err| WindowInitError::from_error("event loop", err))?;

    let mut app = App::new(model, clock);
    event_loop
        .run_app(&mut app)
        .context("event loop terminated abnormally")?;
    app.finish()
}

/// Schedules the next tick by asking winit for a redraw.
struct RedrawScheduler<'a>(&'a Window);

impl Scheduler for RedrawScheduler<'_> {
    fn request_frame(&mut self) {
        self.0.request_redraw();
    }
}

struct WindowState<C: Clock> {
    window: Arc<Window>,
    renderer: Renderer,
    render_loop: RenderLoop<C>,
}

struct App<C: Clock> {
    model: DataModel,
    clock: Option<C>,
    input: Arc<InputState>,
    panel: DebugPanel,
    modifiers: ModifiersState,
    state: Option<WindowState<C>>,
    last_error: Option<anyhow::Error>,
}

impl<C: Clock> App<C> {
    fn new(model: DataModel, clock: C) -> Self {
        Self {
            panel: DebugPanel::new(model.clone()),
            model,
            clock: Some(clock),
            input: Arc::new(InputState::new()),
            modifiers: ModifiersState::empty(),
            state: None,
            last_error: None,
        }
    }

    fn init_window(&self, event_loop: &ActiveEventLoop, clock: C) -> Result<WindowState<C>> {
        let (width, height) = DEFAULT_VIEWPORT;
        let attributes = Window::default_attributes()
            .with_title(WINDOW_TITLE)
            .with_inner_size(LogicalSize::new(width as f64, height as f64));
        let window = Arc::new(
            event_loop
                .create_window(attributes)
                .map_err(|err| WindowInitError::from_error("window", err))?,
        );

        let size = window.inner_size();
        let scene = self.model.snapshot();
        let renderer = block_on(Renderer::new(
            Arc::clone(&window),
            (size.width.max(1), size.height.max(1)),
            &scene,
        ))
        .context("failed to initialize renderer")?;

        let scale_factor = window.scale_factor();
        let logical: LogicalSize<u32> = size.to_logical(scale_factor);
        let mut render_loop = RenderLoop::new(
            self.model.clone(),
            Viewport::new(logical.width, logical.height, scale_factor),
            clock,
        );
        let resize = render_loop.handle_resize(logical.width, logical.height, scale_factor);
        log_uncapped_surface(&resize);
        info!("window ready at {}x{} (scale {scale_factor})", size.width, size.height);

        Ok(WindowState {
            window,
            renderer,
            render_loop,
        })
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, err: anyhow::Error) {
        self.last_error = Some(err);
        event_loop.exit();
    }

    fn finish(mut self) -> Result<()> {
        if let Some(err) = self.last_error.take() {
            return Err(err);
        }
        let frames = self
            .state
            .as_ref()
            .map(|state| state.render_loop.frames())
            .unwrap_or(0);
        app::print_final_state(&self.model, frames);
        Ok(())
    }

    fn resize(&mut self, size: PhysicalSize<u32>) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let scale_factor = state.window.scale_factor();
        let logical: LogicalSize<u32> = size.to_logical(scale_factor);
        let resize = state
            .render_loop
            .handle_resize(logical.width, logical.height, scale_factor);
        log_uncapped_surface(&resize);
        state.renderer.resize(size.width, size.height);
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(state) = self.state.as_mut() else {
            return;
        };
        let window = Arc::clone(&state.window);

        state.render_loop.apply_input(&self.input);
        let result = state
            .render_loop
            .tick(&mut state.renderer, &mut RedrawScheduler(&window));
        match result {
            Ok(_) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => {
                let size = window.inner_size();
                state.renderer.resize(size.width, size.height);
                window.request_redraw();
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                error!("GPU is out of memory");
                self.fail(event_loop, anyhow!("GPU is out of memory"));
            }
            Err(err) => {
                warn!("surface error: {err}; retrying next frame");
                window.request_redraw();
            }
        }
    }

    fn handle_key(&mut self, event_loop: &ActiveEventLoop, event: &KeyEvent) {
        if event.state != ElementState::Pressed {
            return;
        }
        let PhysicalKey::Code(code) = event.physical_key else {
            return;
        };
        let shift = self.modifiers.shift_key();
        match code {
            KeyCode::Escape => {
                event_loop.exit();
                return;
            }
            KeyCode::Tab if shift => self.panel.select_previous(),
            KeyCode::Tab => self.panel.select_next(),
            KeyCode::ArrowUp | KeyCode::ArrowRight => {
                self.panel.nudge_selected(1.0, shift);
            }
            KeyCode::ArrowDown | KeyCode::ArrowLeft => {
                self.panel.nudge_selected(-1.0, shift);
            }
            _ => return,
        }
        if let Some(state) = self.state.as_ref() {
            state
                .window
                .set_title(&format!("{WINDOW_TITLE} | {}", self.panel.summary()));
        }
    }

    fn handle_mouse_button(&self, state: ElementState, button: WinitMouseButton) {
        let button = match button {
            WinitMouseButton::Left => MouseButton::LEFT,
            WinitMouseButton::Middle => MouseButton::MIDDLE,
            WinitMouseButton::Right => MouseButton::RIGHT,
            _ => return,
        };
        match state {
            ElementState::Pressed => self.input.press(button),
            ElementState::Released => self.input.release(button),
        }
    }
}

impl<C: Clock> ApplicationHandler for App<C> {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let Some(clock) = self.clock.take() else {
            return;
        };
        match self.init_window(event_loop, clock) {
            Ok(state) => {
                println!("{}", self.panel);
                state.window.request_redraw();
                self.state = Some(state);
            }
            Err(err) => self.fail(event_loop, err),
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
        let scale_factor = match self.state.as_ref() {
            Some(state) if state.window.id() == window_id => state.window.scale_factor(),
            _ => return,
        };

        match event {
            WindowEvent::CloseRequested => event_loop.exit(),
            WindowEvent::Resized(size) => self.resize(size),
            WindowEvent::ScaleFactorChanged { .. } => {
                if let Some(size) = self.state.as_ref().map(|state| state.window.inner_size()) {
                    self.resize(size);
                }
            }
            WindowEvent::ModifiersChanged(modifiers) => self.modifiers = modifiers.state(),
            WindowEvent::KeyboardInput { event, .. } => self.handle_key(event_loop, &event),
            WindowEvent::MouseInput { state, button, .. } => {
                self.handle_mouse_button(state, button);
            }
            WindowEvent::CursorMoved { position, .. } => {
                let logical = position.to_logical::<f32>(scale_factor);
                self.input.move_to(Vec2::new(logical.x, logical.y));
            }
            WindowEvent::CursorLeft { .. } => self.input.leave(),
            WindowEvent::MouseWheel { delta, .. } => {
                // winit reports scrolling up as positive; the controls expect
                // the browser convention where that is negative
                let delta_y = match delta {
                    MouseScrollDelta::LineDelta(_, y) => -y,
                    MouseScrollDelta::PixelDelta(position) => -position.y as f32,
                };
                self.input.scroll(delta_y);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}

/// The window surface must match the window's physical size, so the density
/// cap only reaches the camera here.
fn log_uncapped_surface(resize: &Resize) {
    if resize.is_density_capped() {
        debug!(
            "scale factor {} exceeds the {}x cap; surface stays at physical size instead of {}x{}",
            resize.device_pixel_ratio, resize.pixel_ratio, resize.buffer_width, resize.buffer_height
        );
    }
}

#[derive(Debug)]
struct WindowInitError {
    message: String,
}

impl WindowInitError {
    fn from_panic(stage: &str, panic: Box<dyn Any + Send>) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {}", panic_message(panic)),
        }
    }

    fn from_error(stage: &str, err: impl fmt::Display) -> Self {
        Self {
            message: format!("failed to initialize {stage}: {err}"),
        }
    }
}

impl fmt::Display for WindowInitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for WindowInitError {}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    match panic.downcast::<String>() {
        Ok(msg) => *msg,
        Err(panic) => match panic.downcast::<&'static str>() {
            Ok(msg) => (*msg).to_string(),
            Err(_) => "unknown panic".into(),
        },
    }
}

struct CliOptions {
    scene: Option<PathBuf>,
    summary_only: bool,
    frames: u64,
    time_ms: Option<f64>,
}

const USAGE: &str =
    "Usage: disco-scene [--scene <file.xml>] [--summary-only] [--frames <n>] [--time-ms <t>]";

impl CliOptions {
    fn parse() -> Result<Self> {
        let mut args = env::args().skip(1);
        let mut options = Self {
            scene: None,
            summary_only: false,
            frames: 1,
            time_ms: None,
        };
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--scene" => {
                    let path = args
                        .next()
                        .ok_or_else(|| anyhow!("--scene needs a file path. {USAGE}"))?;
                    options.scene = Some(PathBuf::from(path));
                }
                "--summary-only" => options.summary_only = true,
                "--frames" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--frames needs a count. {USAGE}"))?;
                    options.frames = value
                        .parse()
                        .with_context(|| format!("invalid frame count {value:?}"))?;
                }
                "--time-ms" => {
                    let value = args
                        .next()
                        .ok_or_else(|| anyhow!("--time-ms needs a value. {USAGE}"))?;
                    let time_ms: f64 = value
                        .parse()
                        .with_context(|| format!("invalid time {value:?}"))?;
                    if !time_ms.is_finite() {
                        return Err(anyhow!("invalid time {value:?}: must be finite"));
                    }
                    options.time_ms = Some(time_ms);
                }
                other => {
                    return Err(anyhow!("Unknown argument: {other}. {USAGE}"));
                }
            }
        }
        Ok(options)
    }
}
