//! Per-frame driver for the scene.
//!
//! [`RenderLoop::tick`] is called once per host frame. It moves the shared
//! light target, spins the disco ball, steps the orbit-control damping, draws,
//! and then asks the host for the next frame. Time and frame scheduling are
//! injected so the loop runs the same way under a window, a browser canvas, or
//! a test.

use std::convert::Infallible;

use glam::Vec3;
use log::{debug, info};

use crate::animation::orbit_target;
use crate::clock::{Clock, ElapsedClock};
use crate::controls::{OrbitControls, PerspectiveCamera};
use crate::data_model::DataModel;
use crate::input::InputState;
use crate::render::CameraParams;
use crate::scene::Scene;
use crate::viewport::{Resize, Viewport};

/// Anything that can turn a scene snapshot into a frame.
pub trait FrameTarget {
    type Error;

    fn draw(&mut self, scene: &Scene, camera: &CameraParams) -> Result<(), Self::Error>;
}

/// Host hook that arranges for the next tick.
pub trait Scheduler {
    fn request_frame(&mut self);
}

/// Scheduler that only records the request; the host polls it after a tick.
#[derive(Debug, Default, Clone, Copy)]
pub struct FrameRequest {
    requested: bool,
}

impl FrameRequest {
    /// Returns whether a frame was requested and clears the flag.
    pub fn take(&mut self) -> bool {
        std::mem::take(&mut self.requested)
    }
}

impl Scheduler for FrameRequest {
    fn request_frame(&mut self) {
        self.requested = true;
    }
}

/// Frame target that draws nothing and remembers what it was given.
#[derive(Debug, Default)]
pub struct HeadlessTarget {
    pub frames: u64,
    pub last_camera: Option<CameraParams>,
}

impl FrameTarget for HeadlessTarget {
    type Error = Infallible;

    fn draw(&mut self, _scene: &Scene, camera: &CameraParams) -> Result<(), Infallible> {
        self.frames += 1;
        self.last_camera = Some(*camera);
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameStats {
    /// One-based index of the frame just drawn.
    pub frame: u64,
    pub elapsed_seconds: f64,
    pub light_target: Vec3,
    pub camera_moved: bool,
}

pub struct RenderLoop<C: Clock> {
    model: DataModel,
    controls: OrbitControls,
    viewport: Viewport,
    clock: C,
    elapsed: ElapsedClock,
    frames: u64,
    report_frame: u64,
    report_seconds: f64,
}

impl<C: Clock> RenderLoop<C> {
    /// Places the camera from the scene description and enables damping.
    pub fn new(model: DataModel, viewport: Viewport, clock: C) -> Self {
        let spec = model.read(|scene| scene.camera);
        let mut controls =
            OrbitControls::new(PerspectiveCamera::from_spec(&spec, viewport.aspect()));
        controls.enable_damping = true;
        let elapsed = ElapsedClock::start(&clock);
        Self {
            model,
            controls,
            viewport,
            clock,
            elapsed,
            frames: 0,
            report_frame: 0,
            report_seconds: 0.0,
        }
    }

    /// Advances the scene by one frame and draws it.
    ///
    /// A draw error is returned as-is and the next frame is not requested.
    pub fn tick<T, S>(&mut self, target: &mut T, scheduler: &mut S) -> Result<FrameStats, T::Error>
    where
        T: FrameTarget + ?Sized,
        S: Scheduler + ?Sized,
    {
        let now_ms = self.clock.now_ms();
        let elapsed_seconds = self.elapsed.elapsed_seconds(&self.clock);

        let light_target = orbit_target(now_ms);
        self.model.set_light_target(light_target);
        self.model.advance_spin();

        let camera_moved = self.controls.update();
        let camera = self.controls.camera_params();
        self.model.read(|scene| target.draw(scene, &camera))?;

        scheduler.request_frame();
        self.frames += 1;
        self.report(elapsed_seconds);

        Ok(FrameStats {
            frame: self.frames,
            elapsed_seconds,
            light_target,
            camera_moved,
        })
    }

    /// Applies a viewport change to the camera and returns the new
    /// drawing-buffer size for the host's surface.
    pub fn handle_resize(&mut self, width: u32, height: u32, device_pixel_ratio: f64) -> Resize {
        let resize = self.viewport.resize(width, height, device_pixel_ratio);
        self.controls.set_aspect(resize.aspect);
        info!(
            "viewport {}x{} @{}x -> buffer {}x{}",
            resize.width, resize.height, resize.pixel_ratio, resize.buffer_width, resize.buffer_height
        );
        resize
    }

    /// Feeds pointer movement gathered since the last frame to the controls.
    pub fn apply_input(&mut self, input: &InputState) {
        input.apply_to(&mut self.controls, &self.viewport);
    }

    pub fn model(&self) -> &DataModel {
        &self.model
    }

    pub fn controls(&self) -> &OrbitControls {
        &self.controls
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    fn report(&mut self, elapsed_seconds: f64) {
        let window = elapsed_seconds - self.report_seconds;
        if window < 1.0 {
            return;
        }
        let frames = self.frames - self.report_frame;
        debug!(
            "{:.1} fps over the last {:.1}s ({} frames total)",
            frames as f64 / window,
            window,
            self.frames
        );
        self.report_frame = self.frames;
        self.report_seconds = elapsed_seconds;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::DISCO_BALL_SPIN;
    use crate::clock::ManualClock;
    use approx::assert_relative_eq;

    fn render_loop(clock: ManualClock) -> RenderLoop<ManualClock> {
        let model = DataModel::new(Scene::disco().unwrap());
        RenderLoop::new(model, Viewport::new(800, 600, 1.0), clock)
    }

    #[derive(Default)]
    struct Recorder {
        seen: Vec<(Vec3, f32)>,
    }

    impl FrameTarget for Recorder {
        type Error = Infallible;

        fn draw(&mut self, scene: &Scene, _camera: &CameraParams) -> Result<(), Infallible> {
            let spin = scene.object("DiscoBall").map(|o| o.rotation.y).unwrap_or_default();
            self.seen.push((scene.light_target, spin));
            Ok(())
        }
    }

    struct Broken;

    impl FrameTarget for Broken {
        type Error = &'static str;

        fn draw(&mut self, _scene: &Scene, _camera: &CameraParams) -> Result<(), &'static str> {
            Err("context lost")
        }
    }

    #[derive(Default)]
    struct CountingScheduler(u32);

    impl Scheduler for CountingScheduler {
        fn request_frame(&mut self) {
            self.0 += 1;
        }
    }

    #[test]
    fn tick_updates_state_before_drawing() {
        let clock = ManualClock::new(1_000.0);
        let mut driver = render_loop(clock.clone());
        let mut target = Recorder::default();
        let mut scheduler = CountingScheduler::default();

        driver.tick(&mut target, &mut scheduler).unwrap();

        let (light_target, spin) = target.seen[0];
        assert_relative_eq!(light_target.x, 5.403_023, epsilon = 1e-5);
        assert_eq!(light_target.x, light_target.y);
        assert_eq!(light_target.y, light_target.z);
        assert_eq!(spin, DISCO_BALL_SPIN);
        assert_eq!(scheduler.0, 1);
    }

    #[test]
    fn target_starts_at_ten_on_the_epoch() {
        let mut driver = render_loop(ManualClock::new(0.0));
        let stats = driver
            .tick(&mut HeadlessTarget::default(), &mut FrameRequest::default())
            .unwrap();
        assert_eq!(stats.light_target, Vec3::splat(10.0));
        assert_eq!(driver.model().light_target(), Vec3::splat(10.0));
    }

    #[test]
    fn hundred_ticks_turn_the_ball_one_radian() {
        let clock = ManualClock::new(0.0);
        let mut driver = render_loop(clock.clone());
        let mut target = HeadlessTarget::default();
        let mut request = FrameRequest::default();

        for _ in 0..100 {
            clock.advance(16.0);
            driver.tick(&mut target, &mut request).unwrap();
            assert!(request.take());
        }

        assert_eq!(driver.frames(), 100);
        assert_eq!(target.frames, 100);
        let scene = driver.model().snapshot();
        assert_relative_eq!(scene.object("DiscoBall").unwrap().rotation.y, 1.0, epsilon = 1e-4);
        assert_eq!(scene.object("Sphere").unwrap().rotation.y, 0.0);
    }

    #[test]
    fn failed_draw_is_returned_and_not_rescheduled() {
        let mut driver = render_loop(ManualClock::new(0.0));
        let mut scheduler = CountingScheduler::default();
        let err = driver.tick(&mut Broken, &mut scheduler).unwrap_err();
        assert_eq!(err, "context lost");
        assert_eq!(scheduler.0, 0);
        assert_eq!(driver.frames(), 0);
    }

    #[test]
    fn resize_updates_aspect_and_density() {
        let mut driver = render_loop(ManualClock::new(0.0));
        let resize = driver.handle_resize(1280, 720, 3.0);
        assert_eq!(driver.viewport().width(), 1280);
        assert_eq!(driver.viewport().height(), 720);
        assert_eq!(driver.controls().camera().aspect, 1280.0 / 720.0);
        assert_eq!(resize.pixel_ratio, 2.0);
        assert_eq!((resize.buffer_width, resize.buffer_height), (2560, 1440));

        let resize = driver.handle_resize(300, 200, 0.75);
        assert_eq!(resize.pixel_ratio, 0.75);
        assert_eq!((resize.buffer_width, resize.buffer_height), (225, 150));
    }

    #[test]
    fn pointer_drag_moves_the_camera_over_several_ticks() {
        let mut driver = render_loop(ManualClock::new(0.0));
        let input = InputState::new();
        input.press(crate::input::MouseButton::LEFT);
        input.move_to(glam::Vec2::ZERO);
        input.move_to(glam::Vec2::new(60.0, 0.0));
        driver.apply_input(&input);

        let start = driver.controls().camera().position;
        let mut target = HeadlessTarget::default();
        let stats = driver.tick(&mut target, &mut FrameRequest::default()).unwrap();
        assert!(stats.camera_moved);
        let first = driver.controls().camera().position;
        driver.tick(&mut target, &mut FrameRequest::default()).unwrap();
        let second = driver.controls().camera().position;
        assert!(first.distance(start) > 0.0);
        assert!(second.distance(first) < first.distance(start));
        assert_eq!(target.last_camera.map(|c| c.position), Some(second));
    }

    #[test]
    fn elapsed_time_tracks_the_injected_clock() {
        let clock = ManualClock::new(10_000.0);
        let mut driver = render_loop(clock.clone());
        clock.advance(2_500.0);
        let stats = driver
            .tick(&mut HeadlessTarget::default(), &mut FrameRequest::default())
            .unwrap();
        assert_eq!(stats.elapsed_seconds, 2.5);
        assert_eq!(stats.frame, 1);
    }
}
