use std::f32::consts::TAU;
use std::sync::Arc;

use glam::Vec3;
use parking_lot::RwLock;

use crate::scene::{Light, Scene};

/// Shared handle to the mutable scene graph.
///
/// The render loop and the debug panel hold clones of the same handle; every
/// mutation is visible to the next frame.
#[derive(Debug, Default)]
pub struct DataModel {
    scene: Arc<RwLock<Scene>>,
}

impl Clone for DataModel {
    fn clone(&self) -> Self {
        Self {
            scene: Arc::clone(&self.scene),
        }
    }
}

impl DataModel {
    pub fn new(scene: Scene) -> Self {
        Self {
            scene: Arc::new(RwLock::new(scene)),
        }
    }

    /// Returns a copy of the current scene.
    pub fn snapshot(&self) -> Scene {
        self.scene.read().clone()
    }

    /// Runs `reader` against the scene without copying it.
    pub fn read<R>(&self, reader: impl FnOnce(&Scene) -> R) -> R {
        reader(&self.scene.read())
    }

    /// Applies a mutation to the named light.
    pub fn update_light<F, R>(&self, name: &str, updater: F) -> Option<R>
    where
        F: FnOnce(&mut Light) -> R,
    {
        let mut guard = self.scene.write();
        let light = guard.light_mut(name)?;
        Some(updater(light))
    }

    pub fn light_target(&self) -> Vec3 {
        self.scene.read().light_target
    }

    pub fn set_light_target(&self, target: Vec3) {
        self.scene.write().light_target = target;
    }

    /// Advances every spinning object by its per-tick step, wrapping the
    /// angle into `[0, TAU)` so the step never drops below f32 precision.
    pub fn advance_spin(&self) {
        let mut guard = self.scene.write();
        for object in guard.objects.iter_mut().filter(|o| o.spin != 0.0) {
            object.rotation.y = (object.rotation.y + object.spin).rem_euclid(TAU);
        }
    }

    pub fn set_light_intensity(&self, name: &str, intensity: f32) -> bool {
        self.update_light(name, |light| light.intensity = intensity)
            .is_some()
    }

    pub fn set_light_position(&self, name: &str, position: Vec3) -> bool {
        self.update_light(name, |light| light.position = position)
            .is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clones_share_state() {
        let model = DataModel::new(Scene::disco().unwrap());
        let other = model.clone();
        other.set_light_target(Vec3::splat(2.0));
        assert_eq!(model.light_target(), Vec3::splat(2.0));
    }

    #[test]
    fn advance_spin_only_moves_spinning_objects() {
        let model = DataModel::new(Scene::disco().unwrap());
        model.advance_spin();
        model.advance_spin();
        let scene = model.snapshot();
        let ball = scene.object("DiscoBall").unwrap();
        assert!((ball.rotation.y - 0.02).abs() < 1e-6);
        assert_eq!(scene.object("Sphere").unwrap().rotation, Vec3::ZERO);
    }

    #[test]
    fn spin_keeps_its_step_after_long_runs() {
        let mut scene = Scene::disco().unwrap();
        if let Some(ball) = scene.objects.iter_mut().find(|o| o.name == "DiscoBall") {
            ball.rotation.y = 262_144.0;
        }
        let model = DataModel::new(scene);
        let angle = || model.read(|s| s.object("DiscoBall").map(|o| o.rotation.y)).unwrap();

        model.advance_spin();
        let mut previous = angle();
        assert!((0.0..TAU).contains(&previous));
        for _ in 0..10_000 {
            model.advance_spin();
            let current = angle();
            let step = (current - previous).rem_euclid(TAU);
            assert!((step - 0.01).abs() < 1e-5, "step was {step}");
            assert!((0.0..TAU).contains(&current));
            previous = current;
        }
    }

    #[test]
    fn spin_wraps_past_a_full_turn() {
        let model = DataModel::new(Scene::disco().unwrap());
        for _ in 0..700 {
            model.advance_spin();
        }
        let angle = model.read(|s| s.object("DiscoBall").map(|o| o.rotation.y)).unwrap();
        assert!((angle - (7.0 - TAU)).abs() < 1e-3);
    }

    #[test]
    fn update_returns_false_for_missing_light() {
        let model = DataModel::new(Scene::disco().unwrap());
        assert!(!model.set_light_intensity("Unknown", 1.0));
        assert!(model.set_light_intensity("AmbientLight", 0.25));
        assert_eq!(
            model.read(|s| s.light("AmbientLight").map(|l| l.intensity)),
            Some(0.25)
        );
    }
}
