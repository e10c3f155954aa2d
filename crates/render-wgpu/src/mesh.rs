//! CPU-side tessellation of scene geometry.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use orbitview_scene::{CapsuleGeometry, Geometry};
use std::f32::consts::{FRAC_PI_2, TAU};

#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

/// Indexed triangle list, counter-clockwise front faces.
#[derive(Debug, Clone, Default)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// Key for the GPU mesh cache. Floats are compared by bit pattern, which is
/// exact for parameters that came from the same config value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GeometryKey {
    Capsule {
        radius: u32,
        length: u32,
        cap_segments: u32,
        radial_segments: u32,
    },
    Cuboid([u32; 3]),
}

impl GeometryKey {
    pub fn of(geometry: &Geometry) -> Self {
        match geometry {
            Geometry::Capsule(c) => Self::Capsule {
                radius: c.radius().to_bits(),
                length: c.length().to_bits(),
                cap_segments: c.cap_segments(),
                radial_segments: c.radial_segments(),
            },
            Geometry::Cuboid { half_extents } => {
                Self::Cuboid(half_extents.to_array().map(f32::to_bits))
            }
        }
    }
}

pub fn tessellate(geometry: &Geometry) -> MeshData {
    match geometry {
        Geometry::Capsule(capsule) => capsule_mesh(capsule),
        Geometry::Cuboid { half_extents } => cuboid_mesh(*half_extents),
    }
}

/// Lathe a capsule profile around Y.
///
/// Rows run from the top pole down to the bottom pole: `cap_segments + 1`
/// rows on each hemisphere, the two equator rows bounding the cylinder.
/// Each row repeats its first vertex at the seam.
pub fn capsule_mesh(capsule: &CapsuleGeometry) -> MeshData {
    let r = capsule.radius();
    let half = capsule.length() / 2.0;
    let caps = capsule.cap_segments();
    let radial = capsule.radial_segments();

    let mut profile = Vec::with_capacity(2 * (caps as usize + 1));
    for i in 0..=caps {
        let a = FRAC_PI_2 * i as f32 / caps as f32;
        profile.push((a, half));
    }
    for i in 0..=caps {
        let a = FRAC_PI_2 + FRAC_PI_2 * i as f32 / caps as f32;
        profile.push((a, -half));
    }

    let columns = radial + 1;
    let mut mesh = MeshData {
        vertices: Vec::with_capacity(profile.len() * columns as usize),
        indices: Vec::with_capacity((profile.len() - 1) * radial as usize * 6),
    };
    for &(a, center_y) in &profile {
        let (sin_a, cos_a) = a.sin_cos();
        for k in 0..columns {
            let theta = TAU * k as f32 / radial as f32;
            let (sin_t, cos_t) = theta.sin_cos();
            mesh.vertices.push(Vertex {
                position: [r * sin_a * sin_t, center_y + r * cos_a, r * sin_a * cos_t],
                normal: [sin_a * sin_t, cos_a, sin_a * cos_t],
            });
        }
    }

    for row in 0..profile.len() as u32 - 1 {
        for k in 0..radial {
            let a = row * columns + k;
            let b = a + columns;
            let c = b + 1;
            let d = a + 1;
            mesh.indices.extend_from_slice(&[a, b, d, b, c, d]);
        }
    }
    mesh
}

/// Axis-aligned box with flat-shaded faces.
pub fn cuboid_mesh(half_extents: Vec3) -> MeshData {
    let [x, y, z] = half_extents.to_array();
    let v = |position: [f32; 3], normal: [f32; 3]| Vertex { position, normal };
    #[rustfmt::skip]
    let vertices = vec![
        // +Z
        v([-x, -y,  z], [0.0, 0.0, 1.0]), v([ x, -y,  z], [0.0, 0.0, 1.0]),
        v([ x,  y,  z], [0.0, 0.0, 1.0]), v([-x,  y,  z], [0.0, 0.0, 1.0]),
        // -Z
        v([ x, -y, -z], [0.0, 0.0, -1.0]), v([-x, -y, -z], [0.0, 0.0, -1.0]),
        v([-x,  y, -z], [0.0, 0.0, -1.0]), v([ x,  y, -z], [0.0, 0.0, -1.0]),
        // +X
        v([ x, -y,  z], [1.0, 0.0, 0.0]), v([ x, -y, -z], [1.0, 0.0, 0.0]),
        v([ x,  y, -z], [1.0, 0.0, 0.0]), v([ x,  y,  z], [1.0, 0.0, 0.0]),
        // -X
        v([-x, -y, -z], [-1.0, 0.0, 0.0]), v([-x, -y,  z], [-1.0, 0.0, 0.0]),
        v([-x,  y,  z], [-1.0, 0.0, 0.0]), v([-x,  y, -z], [-1.0, 0.0, 0.0]),
        // +Y
        v([-x,  y,  z], [0.0, 1.0, 0.0]), v([ x,  y,  z], [0.0, 1.0, 0.0]),
        v([ x,  y, -z], [0.0, 1.0, 0.0]), v([-x,  y, -z], [0.0, 1.0, 0.0]),
        // -Y
        v([-x, -y, -z], [0.0, -1.0, 0.0]), v([ x, -y, -z], [0.0, -1.0, 0.0]),
        v([ x, -y,  z], [0.0, -1.0, 0.0]), v([-x, -y,  z], [0.0, -1.0, 0.0]),
    ];
    let indices = (0..6u32)
        .flat_map(|face| [0, 1, 2, 2, 3, 0].map(|i| face * 4 + i))
        .collect();
    MeshData { vertices, indices }
}
