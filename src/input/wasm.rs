use std::sync::Arc;

use glam::Vec2;
use gloo_events::{EventListener, EventListenerOptions};
use wasm_bindgen::JsCast;
use web_sys::{HtmlCanvasElement, MouseEvent, WheelEvent};

use super::{InputState, MouseButton};

/// Handles canvas pointer events and updates the shared [`InputState`].
pub struct WasmInputHandler {
    listeners: Vec<EventListener>,
}

impl WasmInputHandler {
    pub fn attach(canvas: &HtmlCanvasElement, input: Arc<InputState>) -> Self {
        let mut listeners = Vec::new();

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "mousedown", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    input_state.move_to(offset(event));
                    input_state.press(MouseButton::new(event.button() as u8));
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "mouseup", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    input_state.release(MouseButton::new(event.button() as u8));
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "mousemove", move |event| {
                if let Some(event) = event.dyn_ref::<MouseEvent>() {
                    input_state.move_to(offset(event));
                }
            }));
        }

        {
            let input_state = Arc::clone(&input);
            listeners.push(EventListener::new(canvas, "mouseleave", move |_event| {
                input_state.release_all();
                input_state.leave();
            }));
        }

        {
            let input_state = Arc::clone(&input);
            let options = EventListenerOptions::enable_prevent_default();
            listeners.push(EventListener::new_with_options(
                canvas,
                "wheel",
                options,
                move |event| {
                    if let Some(event) = event.dyn_ref::<WheelEvent>() {
                        event.prevent_default();
                        input_state.scroll(event.delta_y() as f32);
                    }
                },
            ));
        }

        // right-drag pans, so the context menu must stay closed
        listeners.push(EventListener::new_with_options(
            canvas,
            "contextmenu",
            EventListenerOptions::enable_prevent_default(),
            |event| event.prevent_default(),
        ));

        Self { listeners }
    }
}

impl Drop for WasmInputHandler {
    fn drop(&mut self) {
        self.listeners.clear();
    }
}

fn offset(event: &MouseEvent) -> Vec2 {
    Vec2::new(event.offset_x() as f32, event.offset_y() as f32)
}
