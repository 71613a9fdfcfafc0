use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use glam::Vec3;
use log::info;

use crate::clock::Clock;
use crate::data_model::DataModel;
use crate::driver::{FrameRequest, HeadlessTarget, RenderLoop};
use crate::scene::{LightKind, Scene};
use crate::viewport::Viewport;

/// Logical size of the window, and of the viewport used for headless runs.
pub const DEFAULT_VIEWPORT: (u32, u32) = (1280, 720);

/// Loads the scene from `path`, or the built-in disco scene when absent.
pub fn load_scene(path: Option<&Path>) -> Result<Scene> {
    let scene = match path {
        Some(path) => {
            let xml = fs::read_to_string(path)
                .with_context(|| format!("failed to read scene {}", path.display()))?;
            Scene::from_xml(&xml)
                .with_context(|| format!("failed to parse scene XML in {}", path.display()))?
        }
        None => Scene::disco().context("failed to parse built-in scene")?,
    };
    info!(
        "scene ready: {} objects, {} lights",
        scene.objects.len(),
        scene.lights.len()
    );
    Ok(scene)
}

pub fn describe_scene(scene: &Scene) -> String {
    let mut out = format!(
        "Loaded scene with {} objects ({} lights)",
        scene.objects.len(),
        scene.lights.len()
    );
    for object in &scene.objects {
        let _ = write!(out, "\n - {} ({})", object.name, object.geometry.kind());
    }
    for light in &scene.lights {
        let _ = write!(out, "\n - {} ({})", light.name, light_kind(&light.kind));
    }
    out
}

/// Runs `frames` ticks against a [`HeadlessTarget`] and returns how many
/// frames were drawn.
pub fn run_headless<C: Clock>(model: DataModel, frames: u64, clock: C) -> u64 {
    let (width, height) = DEFAULT_VIEWPORT;
    let mut render_loop = RenderLoop::new(model, Viewport::new(width, height, 1.0), clock);
    let mut target = HeadlessTarget::default();
    let mut request = FrameRequest::default();
    for _ in 0..frames {
        if let Err(never) = render_loop.tick(&mut target, &mut request) {
            match never {}
        }
        if !request.take() {
            break;
        }
    }
    info!("headless run finished after {} frames", render_loop.frames());
    render_loop.frames()
}

pub fn final_state(model: &DataModel, frames: u64) -> String {
    model.read(|scene| {
        let mut out = format!("Final scene state after {frames} frame(s):");
        for object in &scene.objects {
            let _ = write!(
                out,
                "\n - {} pos={} rotation={}",
                object.name,
                fmt_vec3(object.position),
                fmt_vec3(object.rotation)
            );
        }
        for light in &scene.lights {
            let _ = write!(
                out,
                "\n - {} {} intensity={:.2} pos={}",
                light.name,
                light_kind(&light.kind),
                light.intensity,
                fmt_vec3(light.position)
            );
        }
        let _ = write!(out, "\nLight target={}", fmt_vec3(scene.light_target));
        out
    })
}

pub fn print_final_state(model: &DataModel, frames: u64) {
    println!("{}", final_state(model, frames));
}

fn light_kind(kind: &LightKind) -> &'static str {
    match kind {
        LightKind::Ambient => "ambient",
        LightKind::Directional => "directional",
        LightKind::Spot { .. } => "spot",
    }
}

fn fmt_vec3(v: Vec3) -> String {
    format!("({:.2}, {:.2}, {:.2})", v.x, v.y, v.z)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::io::Write;

    #[test]
    fn headless_run_reports_spin_and_target() {
        let model = DataModel::new(Scene::disco().unwrap());
        let frames = run_headless(model.clone(), 100, ManualClock::new(1_000.0));
        assert_eq!(frames, 100);

        let state = final_state(&model, frames);
        assert!(state.starts_with("Final scene state after 100 frame(s):"));
        assert!(state.contains("DiscoBall pos=(0.00, 15.00, 0.00) rotation=(0.00, 1.00, 0.00)"));
        assert!(state.contains("Light target=(5.40, 5.40, 5.40)"));
        assert!(state.contains("MoonLight directional intensity=0.50 pos=(4.00, 5.00, -2.00)"));
    }

    #[test]
    fn describe_lists_objects_and_lights() {
        let text = describe_scene(&Scene::disco().unwrap());
        assert!(text.starts_with("Loaded scene with 3 objects (5 lights)"));
        assert!(text.contains(" - DiscoBall (octahedron)"));
        assert!(text.contains(" - PinkLight (spot)"));
    }

    #[test]
    fn scene_file_is_loaded_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "<scene><object><name>Ball</name><geometry>sphere 2 8 6</geometry><spin>0.5</spin></object></scene>"
        )
        .unwrap();
        let scene = load_scene(Some(file.path())).unwrap();
        assert_eq!(scene.objects.len(), 1);
        assert_eq!(scene.objects[0].spin, 0.5);
    }

    #[test]
    fn unreadable_scene_names_the_path() {
        let err = load_scene(Some(Path::new("/nonexistent/scene.xml"))).unwrap_err();
        assert!(format!("{err:#}").contains("/nonexistent/scene.xml"));
    }
}
