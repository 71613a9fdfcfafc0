use bytemuck::{Pod, Zeroable};
use glam::{EulerRot, Mat3, Mat4, Vec3};

use crate::scene::{LightKind, Scene, SceneObject};

/// Spot lights beyond this count are not drawn.
pub const MAX_SPOT_LIGHTS: usize = 4;

/// Camera parameters consumed by the renderer's uniform buffer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CameraParams {
    pub view_proj: Mat4,
    pub position: Vec3,
}

#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Pod, Zeroable)]
pub struct SpotUniform {
    /// `xyz` position, `w` range (0 = unlimited).
    pub position: [f32; 4],
    /// `xyz` unit direction the cone points along, `w` decay exponent.
    pub direction: [f32; 4],
    /// `rgb` colour, `w` intensity.
    pub color: [f32; 4],
    /// `x` cosine of the outer edge, `y` cosine where the penumbra ends.
    pub cone: [f32; 4],
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct GlobalUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_position: [f32; 4],
    /// Sum of ambient colour times intensity.
    pub ambient: [f32; 4],
    /// Unit vector from the surface towards the directional light.
    pub directional_direction: [f32; 4],
    pub directional_color: [f32; 4],
    pub spot_count: [u32; 4],
    pub spots: [SpotUniform; MAX_SPOT_LIGHTS],
}

impl GlobalUniform {
    /// Packs the camera and every light of `scene`.
    ///
    /// Only the first directional light is used.
    pub fn new(scene: &Scene, camera: &CameraParams) -> Self {
        let mut uniform = Self {
            view_proj: camera.view_proj.to_cols_array_2d(),
            camera_position: camera.position.extend(1.0).into(),
            ambient: [0.0; 4],
            directional_direction: [0.0, 1.0, 0.0, 0.0],
            directional_color: [0.0; 4],
            spot_count: [0; 4],
            spots: [SpotUniform::default(); MAX_SPOT_LIGHTS],
        };

        let mut ambient = Vec3::ZERO;
        let mut has_directional = false;
        let mut spots = 0;

        for light in &scene.lights {
            let aim = scene.aim_point(light);
            match light.kind {
                LightKind::Ambient => ambient += light.color * light.intensity,
                LightKind::Directional if !has_directional => {
                    has_directional = true;
                    let towards_light = (light.position - aim).normalize_or_zero();
                    uniform.directional_direction = towards_light.extend(0.0).into();
                    uniform.directional_color =
                        (light.color * light.intensity).extend(1.0).into();
                }
                LightKind::Directional => {}
                LightKind::Spot {
                    angle,
                    penumbra,
                    distance,
                    decay,
                } => {
                    if spots == MAX_SPOT_LIGHTS {
                        continue;
                    }
                    let direction = (aim - light.position).normalize_or_zero();
                    uniform.spots[spots] = SpotUniform {
                        position: light.position.extend(distance).into(),
                        direction: direction.extend(decay).into(),
                        color: light.color.extend(light.intensity).into(),
                        cone: [
                            angle.cos(),
                            (angle * (1.0 - penumbra.clamp(0.0, 1.0))).cos(),
                            0.0,
                            0.0,
                        ],
                    };
                    spots += 1;
                }
            }
        }

        uniform.ambient = ambient.extend(1.0).into();
        uniform.spot_count[0] = spots as u32;
        uniform
    }
}

#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectConstants {
    pub model: [[f32; 4]; 4],
    pub normal: [[f32; 4]; 3],
    pub color: [f32; 4],
    /// `x` metalness, `y` roughness, `z` reflectivity.
    pub material: [f32; 4],
}

impl ObjectConstants {
    pub fn new(object: &SceneObject) -> Self {
        let model = object_model_matrix(object);
        let normal = Mat3::from_mat4(model).inverse().transpose();
        let material = &object.material;
        Self {
            model: model.to_cols_array_2d(),
            normal: mat3_to_3x4(normal),
            color: material.color.extend(1.0).into(),
            material: [
                material.metalness,
                material.roughness,
                material.reflectivity,
                0.0,
            ],
        }
    }
}

/// Translation, then XYZ Euler rotation, then scale.
pub fn object_model_matrix(object: &SceneObject) -> Mat4 {
    let rotation = Mat4::from_euler(
        EulerRot::XYZ,
        object.rotation.x,
        object.rotation.y,
        object.rotation.z,
    );
    Mat4::from_translation(object.position) * rotation * Mat4::from_scale(object.scale)
}

fn mat3_to_3x4(matrix: Mat3) -> [[f32; 4]; 3] {
    let cols = matrix.to_cols_array();
    [
        [cols[0], cols[1], cols[2], 0.0],
        [cols[3], cols[4], cols[5], 0.0],
        [cols[6], cols[7], cols[8], 0.0],
    ]
}
