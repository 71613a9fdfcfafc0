#![cfg(target_arch = "wasm32")]

use std::cell::RefCell;
use std::rc::Rc;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use gloo_events::EventListener;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{window, Document, HtmlCanvasElement, HtmlInputElement};

use crate::input::wasm::WasmInputHandler;
use crate::{
    DataModel, DebugPanel, InputState, RenderLoop, Renderer, Resize, Scene, Scheduler,
    SystemClock, Viewport,
};

const PANEL_STYLE: &str = "position:fixed;top:8px;right:8px;padding:8px 12px;\
background:rgba(20,20,24,0.85);color:#eee;font:12px monospace;border-radius:4px;z-index:10";

/// Starts the disco scene on the canvas matched by `canvas_selector`
/// (for example `canvas.webgl`).
#[wasm_bindgen]
pub async fn run(canvas_selector: String) -> Result<(), JsValue> {
    console_error_panic_hook::set_once();
    start(&canvas_selector)
        .await
        .map_err(|err| JsValue::from_str(&format!("{err:#}")))
}

async fn start(canvas_selector: &str) -> Result<()> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    let document = window
        .document()
        .ok_or_else(|| anyhow!("document not available"))?;
    let canvas = document
        .query_selector(canvas_selector)
        .map_err(js_error)?
        .ok_or_else(|| anyhow!("no element matches {canvas_selector:?}"))?
        .dyn_into::<HtmlCanvasElement>()
        .map_err(|_| anyhow!("{canvas_selector:?} is not a canvas"))?;

    let scene = Scene::disco()?;
    log_scene_summary(&scene);
    let model = DataModel::new(scene);

    let (width, height) = window_size(&window);
    let device_pixel_ratio = window.device_pixel_ratio();
    let mut render_loop = RenderLoop::new(
        model.clone(),
        Viewport::new(width, height, device_pixel_ratio),
        SystemClock,
    );
    let resize = render_loop.handle_resize(width, height, device_pixel_ratio);
    apply_canvas_size(&canvas, &resize);

    let renderer = Renderer::new(
        wgpu::SurfaceTarget::Canvas(canvas.clone()),
        (resize.buffer_width.max(1), resize.buffer_height.max(1)),
        &model.snapshot(),
    )
    .await
    .context("failed to initialize renderer")?;

    let input = Arc::new(InputState::new());
    let input_handler = WasmInputHandler::attach(&canvas, Arc::clone(&input));
    let panel_listeners = build_debug_panel(&document, Rc::new(DebugPanel::new(model)))?;

    let app = Rc::new(RefCell::new(AppState {
        renderer,
        render_loop,
        input,
        canvas,
        _input_handler: input_handler,
        _panel_listeners: panel_listeners,
        _resize_listener: None,
        animation_closure: None,
    }));

    let resize_listener = {
        let app = Rc::clone(&app);
        EventListener::new(&window, "resize", move |_event| {
            if let Ok(mut state) = app.try_borrow_mut() {
                state.handle_window_resize();
            }
        })
    };
    app.borrow_mut()._resize_listener = Some(resize_listener);

    start_animation_loop(&app)
}

struct AppState {
    renderer: Renderer,
    render_loop: RenderLoop<SystemClock>,
    input: Arc<InputState>,
    canvas: HtmlCanvasElement,
    _input_handler: WasmInputHandler,
    _panel_listeners: Vec<EventListener>,
    _resize_listener: Option<EventListener>,
    animation_closure: Option<Closure<dyn FnMut()>>,
}

impl AppState {
    fn render_frame(&mut self) {
        let Some(closure) = self.animation_closure.as_ref() else {
            return;
        };
        let mut scheduler = AnimationFrame { closure };

        self.render_loop.apply_input(&self.input);
        if let Err(err) = self.render_loop.tick(&mut self.renderer, &mut scheduler) {
            match err {
                wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated => {
                    let (width, height) = self.render_loop.viewport().buffer_size();
                    self.renderer.resize(width, height);
                }
                other => console_error(&format!("render failed: {other}")),
            }
            // the page keeps animating after a failed frame
            scheduler.request_frame();
        }
    }

    fn handle_window_resize(&mut self) {
        let Some(window) = window() else {
            return;
        };
        let (width, height) = window_size(&window);
        let resize = self
            .render_loop
            .handle_resize(width, height, window.device_pixel_ratio());
        apply_canvas_size(&self.canvas, &resize);
        self.renderer.resize(resize.buffer_width, resize.buffer_height);
    }
}

/// Schedules the next tick with `requestAnimationFrame`.
struct AnimationFrame<'a> {
    closure: &'a Closure<dyn FnMut()>,
}

impl Scheduler for AnimationFrame<'_> {
    fn request_frame(&mut self) {
        if let Err(err) = request_animation_frame(self.closure) {
            console_error(&err.to_string());
        }
    }
}

fn start_animation_loop(app: &Rc<RefCell<AppState>>) -> Result<()> {
    let app_clone = Rc::clone(app);
    let closure = Closure::wrap(Box::new(move || {
        app_clone.borrow_mut().render_frame();
    }) as Box<dyn FnMut()>);

    let mut state = app.borrow_mut();
    request_animation_frame(&closure)?;
    state.animation_closure = Some(closure);
    Ok(())
}

fn request_animation_frame(closure: &Closure<dyn FnMut()>) -> Result<i32> {
    let window = window().ok_or_else(|| anyhow!("window not available"))?;
    window
        .request_animation_frame(closure.as_ref().unchecked_ref())
        .map_err(|err| anyhow!("requestAnimationFrame failed: {err:?}"))
}

fn build_debug_panel(document: &Document, panel: Rc<DebugPanel>) -> Result<Vec<EventListener>> {
    let body = document
        .body()
        .ok_or_else(|| anyhow!("document has no body"))?;
    let container = document.create_element("div").map_err(js_error)?;
    container
        .set_attribute("class", "debug-panel")
        .map_err(js_error)?;
    container
        .set_attribute("style", PANEL_STYLE)
        .map_err(js_error)?;

    let mut listeners = Vec::with_capacity(panel.sliders().len());
    for (index, slider) in panel.sliders().iter().enumerate() {
        let row = document.create_element("label").map_err(js_error)?;
        row.set_attribute("style", "display:block;margin:4px 0")
            .map_err(js_error)?;
        let caption = document.create_element("div").map_err(js_error)?;
        caption.set_text_content(Some(&slider_caption(slider.label, panel.value(index))));

        let input = document
            .create_element("input")
            .map_err(js_error)?
            .dyn_into::<HtmlInputElement>()
            .map_err(|_| anyhow!("failed to create slider input"))?;
        input.set_type("range");
        input.set_min(&slider.min.to_string());
        input.set_max(&slider.max.to_string());
        input.set_step(&slider.step.to_string());
        if let Some(value) = panel.value(index) {
            input.set_value(&value.to_string());
        }

        row.append_child(&caption).map_err(js_error)?;
        row.append_child(&input).map_err(js_error)?;
        container.append_child(&row).map_err(js_error)?;

        let handle = Rc::clone(&panel);
        let source = input.clone();
        let label = slider.label;
        listeners.push(EventListener::new(&input, "input", move |_event| {
            if let Some(stored) = handle.set(index, source.value_as_number() as f32) {
                caption.set_text_content(Some(&slider_caption(label, Some(stored))));
            }
        }));
    }

    body.append_child(&container).map_err(js_error)?;
    Ok(listeners)
}

fn slider_caption(label: &str, value: Option<f32>) -> String {
    match value {
        Some(value) => format!("{label}: {value:.3}"),
        None => format!("{label}: (unbound)"),
    }
}

fn window_size(window: &web_sys::Window) -> (u32, u32) {
    let read = |value: Result<JsValue, JsValue>| {
        value
            .ok()
            .and_then(|value| value.as_f64())
            .unwrap_or(0.0)
            .max(0.0) as u32
    };
    (read(window.inner_width()), read(window.inner_height()))
}

fn apply_canvas_size(canvas: &HtmlCanvasElement, resize: &Resize) {
    canvas.set_width(resize.buffer_width);
    canvas.set_height(resize.buffer_height);
    let style = canvas.style();
    let _ = style.set_property("width", &format!("{}px", resize.width));
    let _ = style.set_property("height", &format!("{}px", resize.height));
}

fn log_scene_summary(scene: &Scene) {
    log_to_console(&crate::app::describe_scene(scene));
}

fn log_to_console(message: &str) {
    web_sys::console::log_1(&JsValue::from_str(message));
}

fn console_error(message: &str) {
    web_sys::console::error_1(&JsValue::from_str(message));
}

fn js_error(err: JsValue) -> anyhow::Error {
    anyhow!("{err:?}")
}
