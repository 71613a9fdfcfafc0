use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::scene::Geometry;

/// Floats per vertex: `position.xyz` followed by `normal.xyz`.
pub const VERTEX_STRIDE: usize = 6;

/// GPU ready mesh buffers with interleaved position/normal vertices.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<f32>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / VERTEX_STRIDE
    }

    pub fn position(&self, index: usize) -> Vec3 {
        let base = index * VERTEX_STRIDE;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    pub fn normal(&self, index: usize) -> Vec3 {
        let base = index * VERTEX_STRIDE + 3;
        Vec3::from_slice(&self.vertices[base..base + 3])
    }

    fn push_vertex(&mut self, position: Vec3, normal: Vec3) {
        self.vertices.extend_from_slice(&position.to_array());
        self.vertices.extend_from_slice(&normal.to_array());
    }
}

/// Builds the mesh for a scene geometry description.
pub fn build_mesh(geometry: &Geometry) -> Mesh {
    match *geometry {
        Geometry::Octahedron { radius, detail } => octahedron(radius, detail),
        Geometry::Sphere {
            radius,
            width_segments,
            height_segments,
        } => sphere(radius, width_segments, height_segments),
        Geometry::Plane { width, height } => plane(width, height),
    }
}

const OCTAHEDRON_CORNERS: [Vec3; 6] = [
    Vec3::X,
    Vec3::NEG_X,
    Vec3::Y,
    Vec3::NEG_Y,
    Vec3::Z,
    Vec3::NEG_Z,
];

const OCTAHEDRON_FACES: [[usize; 3]; 8] = [
    [0, 2, 4],
    [0, 4, 3],
    [0, 3, 5],
    [0, 5, 2],
    [1, 2, 5],
    [1, 5, 3],
    [1, 3, 4],
    [1, 4, 2],
];

/// Octahedron whose faces are split into `(detail + 1)^2` triangles and
/// pushed out onto a sphere of the given radius.
///
/// Triangles do not share vertices, so the index buffer is `0..n`.
pub fn octahedron(radius: f32, detail: u32) -> Mesh {
    let cols = detail as usize + 1;
    let mut mesh = Mesh::default();

    for face in OCTAHEDRON_FACES {
        let [a, b, c] = face.map(|i| OCTAHEDRON_CORNERS[i]);

        // rows[i] holds the points of the i-th strip from edge ab towards c
        let rows: Vec<Vec<Vec3>> = (0..=cols)
            .map(|i| {
                let t = i as f32 / cols as f32;
                let start = a.lerp(c, t);
                let end = b.lerp(c, t);
                let count = cols - i;
                (0..=count)
                    .map(|j| {
                        if count == 0 {
                            start
                        } else {
                            start.lerp(end, j as f32 / count as f32)
                        }
                    })
                    .collect()
            })
            .collect();

        for i in 0..cols {
            for j in 0..2 * (cols - i) - 1 {
                let k = j / 2;
                let triangle = if j % 2 == 0 {
                    [rows[i][k + 1], rows[i + 1][k], rows[i][k]]
                } else {
                    [rows[i][k + 1], rows[i + 1][k + 1], rows[i + 1][k]]
                };
                for corner in triangle {
                    let normal = corner.normalize();
                    mesh.push_vertex(normal * radius, normal);
                }
            }
        }
    }

    mesh.indices = (0..mesh.vertex_count() as u32).collect();
    mesh
}

/// Latitude/longitude sphere centred on the origin with the north pole at +Y.
pub fn sphere(radius: f32, width_segments: u32, height_segments: u32) -> Mesh {
    let width_segments = width_segments.max(3);
    let height_segments = height_segments.max(2);
    let mut mesh = Mesh::default();

    for iy in 0..=height_segments {
        let v = iy as f32 / height_segments as f32;
        for ix in 0..=width_segments {
            let u = ix as f32 / width_segments as f32;
            let normal = Vec3::new(
                -(u * 2.0 * PI).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * 2.0 * PI).sin() * (v * PI).sin(),
            );
            mesh.push_vertex(normal * radius, normal);
        }
    }

    let row = width_segments + 1;
    for iy in 0..height_segments {
        for ix in 0..width_segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;
            // pole rows collapse to a single triangle per segment
            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != height_segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

/// Rectangle in the XY plane facing +Z.
pub fn plane(width: f32, height: f32) -> Mesh {
    let (hw, hh) = (width * 0.5, height * 0.5);
    let mut mesh = Mesh::default();
    for position in [
        Vec3::new(-hw, hh, 0.0),
        Vec3::new(hw, hh, 0.0),
        Vec3::new(-hw, -hh, 0.0),
        Vec3::new(hw, -hh, 0.0),
    ] {
        mesh.push_vertex(position, Vec3::Z);
    }
    mesh.indices = vec![0, 2, 1, 2, 3, 1];
    mesh
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{EulerRot, Mat4};

    #[test]
    fn octahedron_vertex_count_grows_with_detail() {
        assert_eq!(octahedron(1.0, 0).vertex_count(), 8 * 3);
        assert_eq!(octahedron(4.0, 3).vertex_count(), 8 * 16 * 3);
    }

    #[test]
    fn octahedron_vertices_sit_on_the_radius() {
        let mesh = octahedron(4.0, 3);
        for i in 0..mesh.vertex_count() {
            assert!((mesh.position(i).length() - 4.0).abs() < 1e-4);
            assert!((mesh.normal(i).length() - 1.0).abs() < 1e-5);
        }
    }

    #[test]
    fn octahedron_triangles_face_outwards() {
        let mesh = octahedron(1.0, 2);
        for tri in mesh.indices.chunks(3) {
            let [a, b, c] = [0, 1, 2].map(|k| mesh.position(tri[k] as usize));
            let face_normal = (b - a).cross(c - a);
            let centre = (a + b + c) / 3.0;
            assert!(face_normal.dot(centre) > 0.0);
        }
    }

    #[test]
    fn sphere_counts_match_segments() {
        let mesh = sphere(1.0, 32, 32);
        assert_eq!(mesh.vertex_count(), 33 * 33);
        assert_eq!(mesh.indices.len(), 32 * (2 * 32 - 2) * 3);
        assert!((mesh.position(0) - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn rotated_plane_faces_up() {
        let mesh = build_mesh(&Geometry::Plane {
            width: 50.0,
            height: 50.0,
        });
        let rotation = Mat4::from_euler(EulerRot::XYZ, -PI * 0.5, 0.0, 0.0);
        let up = rotation.transform_vector3(mesh.normal(0));
        assert!((up - Vec3::Y).length() < 1e-6);
        assert_eq!(mesh.position(3), Vec3::new(25.0, -25.0, 0.0));
    }
}
