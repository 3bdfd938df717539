//! Shared builders for the integration tests.

#![allow(dead_code)]

use std::collections::HashMap;

use cubemarch::{FieldGenerator, Grid, MeshBuffers, MesherConfig, Pt3, Vec3};

pub fn cubic_grid(extent: f32, cell_radius: f32, generator: FieldGenerator) -> Grid {
    Grid::build(Pt3::origin(), Vec3::repeat(extent), cell_radius, &generator).unwrap()
}

pub fn noise_config(seed: f32) -> MesherConfig {
    MesherConfig {
        extent: Vec3::repeat(6.0),
        generator: FieldGenerator::Noise3d {
            offset: Vec3::new(seed, seed * 0.5, seed * 2.0),
            scale: 0.3,
        },
        ..MesherConfig::default()
    }
}

/// Vertex position snapped to a half-unit lattice so shared corners compare equal.
pub fn snap(v: [f32; 3]) -> [i64; 3] {
    v.map(|c| (c * 2.0).round() as i64)
}

/// Directed edge -> number of triangles using it, keyed by snapped positions.
pub fn directed_edges(mesh: &MeshBuffers) -> HashMap<([i64; 3], [i64; 3]), usize> {
    let mut edges = HashMap::new();
    for tri in mesh.triangles.chunks_exact(3) {
        let p: [[i64; 3]; 3] = std::array::from_fn(|k| snap(mesh.vertices[tri[k] as usize]));
        for a in 0..3 {
            *edges.entry((p[a], p[(a + 1) % 3])).or_insert(0) += 1;
        }
    }
    edges
}

pub fn assert_well_formed(mesh: &MeshBuffers) {
    assert_eq!(mesh.triangles.len() % 3, 0, "index count must be a multiple of 3");
    assert_eq!(mesh.uvs.len(), mesh.vertices.len());
    let n = mesh.vertices.len() as u32;
    assert!(
        mesh.triangles.iter().all(|&i| i < n),
        "index out of range for {} vertices",
        n
    );
}
