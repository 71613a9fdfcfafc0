use std::collections::HashSet;

use glam::Vec2;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::controls::OrbitControls;
use crate::viewport::ViewportProvider;

#[cfg(target_arch = "wasm32")]
pub mod wasm;

/// Identifier for a mouse button, numbered like DOM `MouseEvent.button`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MouseButton(u8);

impl MouseButton {
    pub const LEFT: Self = Self(0);
    pub const MIDDLE: Self = Self(1);
    pub const RIGHT: Self = Self(2);

    pub fn new(index: u8) -> Self {
        Self(index)
    }
}

/// Camera gesture a held button maps to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Gesture {
    Rotate,
    Dolly,
    Pan,
}

impl Gesture {
    fn for_button(button: MouseButton) -> Option<Self> {
        match button {
            MouseButton::LEFT => Some(Self::Rotate),
            MouseButton::MIDDLE => Some(Self::Dolly),
            MouseButton::RIGHT => Some(Self::Pan),
            _ => None,
        }
    }
}

/// Pointer movement gathered between two frames.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerDelta {
    /// Pixels dragged with the rotate button held.
    pub rotate: Vec2,
    /// Pixels dragged with the pan button held.
    pub pan: Vec2,
    /// Net zoom steps; positive moves the camera away.
    pub dolly_steps: i32,
}

impl PointerDelta {
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// Pointer state shared between event handlers and the render loop.
#[derive(Debug, Default)]
pub struct InputState {
    buttons: RwLock<HashSet<MouseButton>>,
    cursor: RwLock<Option<Vec2>>,
    pending: RwLock<PointerDelta>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn press(&self, button: MouseButton) {
        self.buttons.write().insert(button);
    }

    pub fn release(&self, button: MouseButton) {
        self.buttons.write().remove(&button);
    }

    pub fn release_all(&self) {
        self.buttons.write().clear();
    }

    pub fn cursor(&self) -> Option<Vec2> {
        *self.cursor.read()
    }

    /// Records a cursor position and turns the movement into drag deltas for
    /// every held button.
    pub fn move_to(&self, position: Vec2) {
        let previous = self.cursor.write().replace(position);
        let Some(previous) = previous else {
            return;
        };
        let delta = position - previous;
        if delta == Vec2::ZERO {
            return;
        }

        let buttons = self.buttons.read();
        let mut pending = self.pending.write();
        for gesture in buttons.iter().copied().filter_map(Gesture::for_button) {
            match gesture {
                Gesture::Rotate => pending.rotate += delta,
                Gesture::Pan => pending.pan += delta,
                Gesture::Dolly if delta.y > 0.0 => pending.dolly_steps += 1,
                Gesture::Dolly if delta.y < 0.0 => pending.dolly_steps -= 1,
                Gesture::Dolly => {}
            }
        }
    }

    /// Forgets the cursor so the next move does not produce a jump.
    pub fn leave(&self) {
        *self.cursor.write() = None;
    }

    /// Wheel input in browser convention: positive `delta_y` zooms out.
    pub fn scroll(&self, delta_y: f32) {
        let mut pending = self.pending.write();
        if delta_y > 0.0 {
            pending.dolly_steps += 1;
        } else if delta_y < 0.0 {
            pending.dolly_steps -= 1;
        }
    }

    pub fn take_pending(&self) -> PointerDelta {
        std::mem::take(&mut *self.pending.write())
    }

    /// Hands everything gathered since the last call to the controls.
    pub fn apply_to(&self, controls: &mut OrbitControls, viewport: &impl ViewportProvider) {
        let delta = self.take_pending();
        if delta.is_empty() {
            return;
        }
        if delta.rotate != Vec2::ZERO {
            controls.rotate_by_pixels(delta.rotate.x, delta.rotate.y, viewport);
        }
        if delta.pan != Vec2::ZERO {
            controls.pan_by_pixels(delta.pan.x, delta.pan.y, viewport);
        }
        let direction = delta.dolly_steps.signum() as f32;
        for _ in 0..delta.dolly_steps.unsigned_abs() {
            controls.dolly(direction);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controls::PerspectiveCamera;
    use crate::scene::CameraSpec;
    use crate::viewport::Viewport;
    use approx::assert_relative_eq;

    #[test]
    fn first_move_only_places_the_cursor() {
        let input = InputState::new();
        input.press(MouseButton::LEFT);
        input.move_to(Vec2::new(10.0, 10.0));
        assert!(input.take_pending().is_empty());
        input.move_to(Vec2::new(15.0, 7.0));
        assert_eq!(input.take_pending().rotate, Vec2::new(5.0, -3.0));
    }

    #[test]
    fn buttons_map_to_gestures() {
        let input = InputState::new();
        input.move_to(Vec2::ZERO);
        input.press(MouseButton::RIGHT);
        input.move_to(Vec2::new(4.0, 0.0));
        input.release(MouseButton::RIGHT);
        input.press(MouseButton::MIDDLE);
        input.move_to(Vec2::new(4.0, 6.0));
        input.move_to(Vec2::new(4.0, 9.0));

        let delta = input.take_pending();
        assert_eq!(delta.pan, Vec2::new(4.0, 0.0));
        assert_eq!(delta.rotate, Vec2::ZERO);
        assert_eq!(delta.dolly_steps, 2);
    }

    #[test]
    fn hover_without_buttons_is_ignored() {
        let input = InputState::new();
        input.move_to(Vec2::ZERO);
        input.move_to(Vec2::new(30.0, 30.0));
        assert!(input.take_pending().is_empty());
        assert_eq!(input.cursor(), Some(Vec2::new(30.0, 30.0)));
    }

    #[test]
    fn wheel_steps_reach_the_controls() {
        let input = InputState::new();
        input.scroll(-100.0);
        input.scroll(-100.0);

        let mut controls =
            OrbitControls::new(PerspectiveCamera::from_spec(&CameraSpec::default(), 1.0));
        let distance = controls.camera().position.length();
        input.apply_to(&mut controls, &Viewport::new(800, 600, 1.0));
        controls.update();
        assert_relative_eq!(
            controls.camera().position.length(),
            distance * 0.95 * 0.95,
            epsilon = 1e-4
        );
        assert!(input.take_pending().is_empty());
    }

    #[test]
    fn leaving_resets_the_drag_origin() {
        let input = InputState::new();
        input.press(MouseButton::LEFT);
        input.move_to(Vec2::ZERO);
        input.leave();
        input.move_to(Vec2::new(500.0, 0.0));
        assert!(input.take_pending().is_empty());
    }
}
