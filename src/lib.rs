//! Disco-ball light show rendered with wgpu.
//!
//! The crate splits the demo into small building blocks: a typed scene
//! description, a shared data model, procedural geometry, a damped orbit
//! camera and the per-frame [`RenderLoop`]. GPU output and frame scheduling
//! sit behind the [`FrameTarget`] and [`Scheduler`] traits so the loop runs
//! unchanged in a native window, on a browser canvas, or headless in tests.

pub mod animation;
pub mod app;
pub mod clock;
pub mod controls;
pub mod data_model;
pub mod debug_panel;
pub mod driver;
pub mod geometry;
pub mod input;
pub mod render;
pub mod scene;
pub mod viewport;
#[cfg(target_arch = "wasm32")]
pub mod web;

pub use animation::{orbit_target, DISCO_BALL_SPIN};
pub use clock::{Clock, ElapsedClock, ManualClock, SystemClock};
pub use controls::{OrbitControls, PerspectiveCamera};
pub use data_model::DataModel;
pub use debug_panel::{DebugPanel, Slider, SliderBinding};
pub use driver::{FrameRequest, FrameStats, FrameTarget, HeadlessTarget, RenderLoop, Scheduler};
pub use geometry::Mesh;
pub use input::{InputState, MouseButton};
pub use render::{CameraParams, RenderError, Renderer};
pub use scene::{Geometry, Light, LightKind, Scene, SceneObject};
pub use viewport::{Resize, Viewport, ViewportProvider};
