//! Mesh builders for the static room geometry.
//!
//! Everything is generated at startup and uploaded once; only transforms
//! and colors change per frame.

use bytemuck::{Pod, Zeroable};
use std::f32::consts::TAU;

/// Vertex data (position + normal)
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// A CPU-side mesh ready for upload
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Axis-aligned cube with per-face normals, centered at the origin
pub fn cube(size: f32) -> Mesh {
    let h = size / 2.0;

    // (normal, four corners counter-clockwise seen from outside)
    let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
        (
            [0.0, 0.0, 1.0],
            [[-h, -h, h], [h, -h, h], [h, h, h], [-h, h, h]],
        ),
        (
            [0.0, 0.0, -1.0],
            [[h, -h, -h], [-h, -h, -h], [-h, h, -h], [h, h, -h]],
        ),
        (
            [1.0, 0.0, 0.0],
            [[h, -h, h], [h, -h, -h], [h, h, -h], [h, h, h]],
        ),
        (
            [-1.0, 0.0, 0.0],
            [[-h, -h, -h], [-h, -h, h], [-h, h, h], [-h, h, -h]],
        ),
        (
            [0.0, 1.0, 0.0],
            [[-h, h, h], [h, h, h], [h, h, -h], [-h, h, -h]],
        ),
        (
            [0.0, -1.0, 0.0],
            [[-h, -h, -h], [h, -h, -h], [h, -h, h], [-h, -h, h]],
        ),
    ];

    let mut vertices = Vec::with_capacity(24);
    let mut indices = Vec::with_capacity(36);

    for (normal, corners) in faces {
        let base = vertices.len() as u32;
        for position in corners {
            vertices.push(Vertex { position, normal });
        }
        indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    Mesh { vertices, indices }
}

/// Cube edge list for line rendering: 8 corners, 12 edges
pub fn cube_edges(size: f32) -> Mesh {
    let h = size / 2.0;
    let corners = [
        [-h, -h, -h],
        [h, -h, -h],
        [h, h, -h],
        [-h, h, -h],
        [-h, -h, h],
        [h, -h, h],
        [h, h, h],
        [-h, h, h],
    ];

    let vertices = corners
        .iter()
        .map(|&position| Vertex {
            position,
            normal: [0.0, 1.0, 0.0],
        })
        .collect();

    let indices = vec![
        0, 1, 1, 2, 2, 3, 3, 0, // back face
        4, 5, 5, 6, 6, 7, 7, 4, // front face
        0, 4, 1, 5, 2, 6, 3, 7, // connecting edges
    ];

    Mesh { vertices, indices }
}

/// Latitude/longitude sphere; normals point radially outward
pub fn uv_sphere(radius: f32, segments: u32, rings: u32) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for ring in 0..=rings {
        let v = ring as f32 / rings as f32;
        let phi = v * std::f32::consts::PI;
        let (sin_phi, cos_phi) = phi.sin_cos();

        for segment in 0..=segments {
            let u = segment as f32 / segments as f32;
            let theta = u * TAU;
            let (sin_theta, cos_theta) = theta.sin_cos();

            let normal = [sin_phi * cos_theta, cos_phi, sin_phi * sin_theta];
            vertices.push(Vertex {
                position: [normal[0] * radius, normal[1] * radius, normal[2] * radius],
                normal,
            });
        }
    }

    let stride = segments + 1;
    for ring in 0..rings {
        for segment in 0..segments {
            let a = ring * stride + segment;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    Mesh { vertices, indices }
}

/// Torus in the XY plane (ring around the Z axis), matching the upright
/// orientation the camera faces
pub fn torus(major_radius: f32, minor_radius: f32, radial_segments: u32, tubular_segments: u32) -> Mesh {
    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for j in 0..=radial_segments {
        let v = j as f32 / radial_segments as f32 * TAU;
        let (sin_v, cos_v) = v.sin_cos();

        for i in 0..=tubular_segments {
            let u = i as f32 / tubular_segments as f32 * TAU;
            let (sin_u, cos_u) = u.sin_cos();

            let cx = major_radius * cos_u;
            let cy = major_radius * sin_u;

            let position = [
                (major_radius + minor_radius * cos_v) * cos_u,
                (major_radius + minor_radius * cos_v) * sin_u,
                minor_radius * sin_v,
            ];
            let normal = [position[0] - cx, position[1] - cy, position[2]];
            let len = (normal[0] * normal[0] + normal[1] * normal[1] + normal[2] * normal[2])
                .sqrt()
                .max(1e-6);

            vertices.push(Vertex {
                position,
                normal: [normal[0] / len, normal[1] / len, normal[2] / len],
            });
        }
    }

    let stride = tubular_segments + 1;
    for j in 0..radial_segments {
        for i in 0..tubular_segments {
            let a = j * stride + i;
            let b = a + stride;
            indices.extend_from_slice(&[a, b, a + 1, a + 1, b, b + 1]);
        }
    }

    Mesh { vertices, indices }
}

/// Ground grid helper on the XZ plane: (divisions + 1) lines each way
pub fn grid(extent: f32, divisions: usize) -> Mesh {
    let half = extent / 2.0;
    let step = extent / divisions as f32;

    let mut vertices = Vec::new();
    let mut indices = Vec::new();

    for i in 0..=divisions {
        let offset = -half + i as f32 * step;

        // Line parallel to X
        let base = vertices.len() as u32;
        vertices.push(Vertex {
            position: [-half, 0.0, offset],
            normal: [0.0, 1.0, 0.0],
        });
        vertices.push(Vertex {
            position: [half, 0.0, offset],
            normal: [0.0, 1.0, 0.0],
        });
        indices.extend_from_slice(&[base, base + 1]);

        // Line parallel to Z
        let base = vertices.len() as u32;
        vertices.push(Vertex {
            position: [offset, 0.0, -half],
            normal: [0.0, 1.0, 0.0],
        });
        vertices.push(Vertex {
            position: [offset, 0.0, half],
            normal: [0.0, 1.0, 0.0],
        });
        indices.extend_from_slice(&[base, base + 1]);
    }

    Mesh { vertices, indices }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cube_counts() {
        let mesh = cube(1.0);
        assert_eq!(mesh.vertices.len(), 24); // 6 faces * 4 corners
        assert_eq!(mesh.indices.len(), 36); // 6 faces * 2 triangles * 3
    }

    #[test]
    fn test_cube_edges_counts() {
        let mesh = cube_edges(1.0);
        assert_eq!(mesh.vertices.len(), 8);
        assert_eq!(mesh.indices.len(), 24); // 12 edges * 2 endpoints
    }

    #[test]
    fn test_sphere_counts_and_normals() {
        let mesh = uv_sphere(1.0, 32, 16);
        assert_eq!(mesh.vertices.len(), 33 * 17);
        assert_eq!(mesh.indices.len(), (32 * 16 * 6) as usize);

        for v in &mesh.vertices {
            let len = (v.normal[0].powi(2) + v.normal[1].powi(2) + v.normal[2].powi(2)).sqrt();
            assert!((len - 1.0).abs() < 1e-4);

            // Position sits on the radius-1 shell
            let r = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2)).sqrt();
            assert!((r - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_torus_stays_within_bounding_radius() {
        let mesh = torus(1.0, 0.4, 16, 32);
        assert!(!mesh.vertices.is_empty());

        for v in &mesh.vertices {
            let r = (v.position[0].powi(2) + v.position[1].powi(2) + v.position[2].powi(2)).sqrt();
            assert!(r <= 1.4 + 1e-4);
            assert!(r >= 0.6 - 1e-4);
        }
    }

    #[test]
    fn test_grid_line_counts() {
        let mesh = grid(10.0, 10);
        // 11 lines per axis, 2 vertices each, both axes
        assert_eq!(mesh.vertices.len(), 11 * 2 * 2);
        assert_eq!(mesh.indices.len(), 11 * 2 * 2);
    }
}
