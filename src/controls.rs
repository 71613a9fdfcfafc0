//! Damped orbit camera.
//!
//! The camera circles a target point. Pointer input accumulates rotation,
//! pan and dolly requests; every [`OrbitControls::update`] call applies a
//! fraction of the pending rotation and pan (the damping factor) and lets the
//! remainder decay, which gives the view its inertia.

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Vec3};

use crate::render::CameraParams;
use crate::scene::CameraSpec;
use crate::viewport::ViewportProvider;

const EPS: f32 = 1e-6;

/// Perspective projection parameters plus the eye position.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PerspectiveCamera {
    /// Vertical field of view in degrees.
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
    pub position: Vec3,
}

impl PerspectiveCamera {
    pub fn from_spec(spec: &CameraSpec, aspect: f32) -> Self {
        Self {
            fov: spec.fov,
            aspect,
            near: spec.near,
            far: spec.far,
            position: spec.position,
        }
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(
            self.fov.to_radians(),
            self.aspect.max(0.01),
            self.near,
            self.far,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Spherical {
    radius: f32,
    /// Polar angle from +Y.
    phi: f32,
    /// Azimuth around +Y, measured from +Z.
    theta: f32,
}

impl Spherical {
    fn from_offset(offset: Vec3) -> Self {
        let radius = offset.length();
        if radius == 0.0 {
            return Self {
                radius,
                phi: 0.0,
                theta: 0.0,
            };
        }
        Self {
            radius,
            theta: offset.x.atan2(offset.z),
            phi: (offset.y / radius).clamp(-1.0, 1.0).acos(),
        }
    }

    fn to_offset(self) -> Vec3 {
        let sin_phi_radius = self.phi.sin() * self.radius;
        Vec3::new(
            sin_phi_radius * self.theta.sin(),
            self.phi.cos() * self.radius,
            sin_phi_radius * self.theta.cos(),
        )
    }
}

#[derive(Debug, Clone)]
pub struct OrbitControls {
    camera: PerspectiveCamera,
    target: Vec3,
    pub enable_damping: bool,
    pub damping_factor: f32,
    pub rotate_speed: f32,
    pub zoom_speed: f32,
    pub pan_speed: f32,
    pub min_distance: f32,
    pub max_distance: f32,
    delta_theta: f32,
    delta_phi: f32,
    pan_offset: Vec3,
    scale: f32,
}

impl OrbitControls {
    /// Controls aimed at the origin. Damping starts disabled.
    pub fn new(camera: PerspectiveCamera) -> Self {
        Self {
            camera,
            target: Vec3::ZERO,
            enable_damping: false,
            damping_factor: 0.05,
            rotate_speed: 1.0,
            zoom_speed: 1.0,
            pan_speed: 1.0,
            min_distance: 0.0,
            max_distance: f32::INFINITY,
            delta_theta: 0.0,
            delta_phi: 0.0,
            pan_offset: Vec3::ZERO,
            scale: 1.0,
        }
    }

    pub fn camera(&self) -> &PerspectiveCamera {
        &self.camera
    }

    pub fn target(&self) -> Vec3 {
        self.target
    }

    pub fn set_aspect(&mut self, aspect: f32) {
        self.camera.aspect = aspect;
    }

    pub fn rotate_left(&mut self, angle: f32) {
        self.delta_theta -= angle;
    }

    pub fn rotate_up(&mut self, angle: f32) {
        self.delta_phi -= angle;
    }

    /// Converts a pointer drag into rotation; a drag across the full viewport
    /// height turns the camera once around.
    pub fn rotate_by_pixels(&mut self, dx: f32, dy: f32, viewport: &impl ViewportProvider) {
        let height = viewport.viewport_size().1.max(1) as f32;
        self.rotate_left(TAU * dx / height * self.rotate_speed);
        self.rotate_up(TAU * dy / height * self.rotate_speed);
    }

    /// Screen-space pan; the target follows the pointer at its own depth.
    pub fn pan_by_pixels(&mut self, dx: f32, dy: f32, viewport: &impl ViewportProvider) {
        let height = viewport.viewport_size().1.max(1) as f32;
        let offset = self.camera.position - self.target;
        let target_distance = offset.length() * (self.camera.fov.to_radians() * 0.5).tan();
        let (right, up) = self.camera_axes();
        let left = 2.0 * dx * target_distance / height * self.pan_speed;
        let upward = 2.0 * dy * target_distance / height * self.pan_speed;
        self.pan_offset += right * -left + up * upward;
    }

    /// Wheel input in browser convention: negative `delta_y` zooms in.
    pub fn dolly(&mut self, delta_y: f32) {
        let zoom_scale = 0.95_f32.powf(self.zoom_speed);
        if delta_y < 0.0 {
            self.scale *= zoom_scale;
        } else if delta_y > 0.0 {
            self.scale /= zoom_scale;
        }
    }

    /// Applies one step of pending input. Returns whether the camera moved.
    pub fn update(&mut self) -> bool {
        let previous_position = self.camera.position;
        let previous_target = self.target;

        let mut spherical = Spherical::from_offset(self.camera.position - self.target);
        let step = if self.enable_damping {
            self.damping_factor
        } else {
            1.0
        };
        spherical.theta += self.delta_theta * step;
        spherical.phi = (spherical.phi + self.delta_phi * step).clamp(EPS, PI - EPS);
        spherical.radius = (spherical.radius * self.scale).clamp(self.min_distance, self.max_distance);

        self.target += self.pan_offset * step;
        self.camera.position = self.target + spherical.to_offset();

        if self.enable_damping {
            let decay = 1.0 - self.damping_factor;
            self.delta_theta *= decay;
            self.delta_phi *= decay;
            self.pan_offset *= decay;
        } else {
            self.delta_theta = 0.0;
            self.delta_phi = 0.0;
            self.pan_offset = Vec3::ZERO;
        }
        self.scale = 1.0;

        previous_position.distance_squared(self.camera.position) > EPS
            || previous_target.distance_squared(self.target) > EPS
    }

    pub fn view(&self) -> Mat4 {
        Mat4::look_at_rh(self.camera.position, self.target, Vec3::Y)
    }

    pub fn camera_params(&self) -> CameraParams {
        CameraParams {
            view_proj: self.camera.projection() * self.view(),
            position: self.camera.position,
        }
    }

    fn camera_axes(&self) -> (Vec3, Vec3) {
        let forward = (self.target - self.camera.position).normalize_or_zero();
        let right = forward.cross(Vec3::Y).normalize_or_zero();
        let up = right.cross(forward);
        (right, up)
    }
}
