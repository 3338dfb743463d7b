//! Procedural mesh and point-cloud generators.
//!
//! Everything here is plain CPU data; the GL side uploads it once per
//! (re)built context.

use std::f32::consts::{PI, TAU};

use glam::Vec3;

use crate::{config::StarConfig, random::RandomSource};

/// Interleaved-ready triangle mesh: position, normal and texture coordinate per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshData {
    /// Vertex positions.
    pub positions: Vec<[f32; 3]>,
    /// Unit vertex normals.
    pub normals: Vec<[f32; 3]>,
    /// Texture coordinates.
    pub uvs: Vec<[f32; 2]>,
    /// Counter-clockwise triangle list.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Floats per vertex in the packed buffer.
    pub const FLOATS_PER_VERTEX: usize = 8;

    /// Number of vertices.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Packs `position, normal, uv` per vertex into one buffer.
    #[must_use]
    pub fn interleaved(&self) -> Vec<f32> {
        let mut data = Vec::with_capacity(self.vertex_count() * Self::FLOATS_PER_VERTEX);
        for ((p, n), uv) in self.positions.iter().zip(&self.normals).zip(&self.uvs) {
            data.extend_from_slice(p);
            data.extend_from_slice(n);
            data.extend_from_slice(uv);
        }
        data
    }
}

/// UV sphere centered on the origin.
///
/// Produces `(segments + 1)²` vertices; the seam column is duplicated so
/// texture coordinates wrap cleanly, and the degenerate triangles at both
/// poles are skipped.
#[must_use]
pub fn sphere(radius: f32, segments: u32) -> MeshData {
    let segments = segments.max(3);
    let row = segments + 1;
    let mut mesh = MeshData::default();

    for iy in 0..=segments {
        let v = iy as f32 / segments as f32;
        for ix in 0..=segments {
            let u = ix as f32 / segments as f32;
            let normal = Vec3::new(
                -(u * TAU).cos() * (v * PI).sin(),
                (v * PI).cos(),
                (u * TAU).sin() * (v * PI).sin(),
            );

            mesh.positions.push((normal * radius).to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push([u, 1.0 - v]);
        }
    }

    for iy in 0..segments {
        for ix in 0..segments {
            let a = iy * row + ix + 1;
            let b = iy * row + ix;
            let c = (iy + 1) * row + ix;
            let d = (iy + 1) * row + ix + 1;

            if iy != 0 {
                mesh.indices.extend_from_slice(&[a, b, d]);
            }
            if iy != segments - 1 {
                mesh.indices.extend_from_slice(&[b, c, d]);
            }
        }
    }

    mesh
}

/// Axis-aligned cube with per-face normals.
#[must_use]
pub fn cube(size: f32) -> MeshData {
    let h = size * 0.5;
    let faces: [(Vec3, Vec3, Vec3); 6] = [
        (Vec3::X, Vec3::NEG_Z, Vec3::Y),
        (Vec3::NEG_X, Vec3::Z, Vec3::Y),
        (Vec3::Y, Vec3::X, Vec3::NEG_Z),
        (Vec3::NEG_Y, Vec3::X, Vec3::Z),
        (Vec3::Z, Vec3::X, Vec3::Y),
        (Vec3::NEG_Z, Vec3::NEG_X, Vec3::Y),
    ];

    let mut mesh = MeshData::default();
    for (normal, right, up) in faces {
        let base = mesh.positions.len() as u32;
        let corners = [(-1.0, 1.0), (1.0, 1.0), (-1.0, -1.0), (1.0, -1.0)];
        for (sx, sy) in corners {
            let position = (normal + right * sx + up * sy) * h;
            mesh.positions.push(position.to_array());
            mesh.normals.push(normal.to_array());
            mesh.uvs.push([(sx + 1.0) * 0.5, (1.0 - sy) * 0.5]);
        }
        mesh.indices
            .extend_from_slice(&[base, base + 2, base + 1, base + 2, base + 3, base + 1]);
    }

    mesh
}

/// Upright plane in the XY plane facing +Z.
///
/// The top edge maps to `v = 0`, matching rasters whose first row is the
/// top of the image.
#[must_use]
pub fn plane(width: f32, height: f32) -> MeshData {
    let (hw, hh) = (width * 0.5, height * 0.5);
    MeshData {
        positions: vec![[-hw, hh, 0.0], [hw, hh, 0.0], [-hw, -hh, 0.0], [hw, -hh, 0.0]],
        normals: vec![[0.0, 0.0, 1.0]; 4],
        uvs: vec![[0.0, 0.0], [1.0, 0.0], [0.0, 1.0], [1.0, 1.0]],
        indices: vec![0, 2, 1, 2, 3, 1],
    }
}

/// One blinking point of the background starfield.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Star {
    /// World-space position.
    pub position: Vec3,
    /// Blink phase offset in radians.
    pub phase: f32,
}

/// Scatters stars over a flattened ring around the viewer.
#[must_use]
pub fn starfield(config: &StarConfig, rng: &mut dyn RandomSource) -> Vec<Star> {
    (0..config.count)
        .map(|_| {
            let r = rng.range(config.min_radius, config.max_radius);
            let theta = rng.range(0.0, TAU);
            let lift = (rng.next_f32() - 0.5) * 0.7;
            Star {
                position: Vec3::new(theta.cos() * r, lift * r * 0.3, theta.sin() * r),
                phase: rng.range(0.0, TAU),
            }
        })
        .collect()
}

/// Blink factor shared by star size and alpha.
#[must_use]
pub fn star_blink(phase: f32, t_ms: f64) -> f32 {
    (phase + t_ms as f32 * 0.002).sin()
}
