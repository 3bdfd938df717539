//! Property-based tests for classification, assembly and editing laws.

mod common;

use cubemarch::mesh::tables::{EDGE_TABLE, TRI_TABLE};
use cubemarch::{
    apply_brush, assemble_mesh, classify, Brush, EditMode, FieldGenerator, Grid, IsoFace, Pt3,
    Vec3,
};
use common::*;
use proptest::prelude::*;

fn noise_grid(seed: f32, scale: f32, extent: f32, cell_radius: f32) -> Grid {
    Grid::build(
        Pt3::origin(),
        Vec3::repeat(extent),
        cell_radius,
        &FieldGenerator::Noise3d {
            offset: Vec3::new(seed, seed * 1.7, seed * 0.3),
            scale,
        },
    )
    .unwrap()
}

#[test]
fn edge_table_and_triangle_table_agree() {
    for config in 0..256usize {
        let no_triangles = TRI_TABLE[config][0] == -1;
        assert_eq!(EDGE_TABLE[config] == 0, no_triangles, "config {}", config);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Bit i of the code is set exactly when corner i is strictly below the threshold.
    #[test]
    fn classify_is_strict_per_corner(
        values in prop::array::uniform8(0.0f32..1.0),
        threshold in 0.0f32..1.0,
    ) {
        let code = classify(&values, threshold);
        for (i, v) in values.iter().enumerate() {
            prop_assert_eq!(code & (1 << i) != 0, *v < threshold);
        }
    }

    /// A cell emits a face iff its code has crossed edges, and every crossing
    /// lies on the segment between its two corners.
    #[test]
    fn faces_follow_edge_table(
        values in prop::array::uniform8(0.0f32..1.0),
        threshold in 0.05f32..0.95,
    ) {
        let grid = Grid::build(
            Pt3::origin(),
            Vec3::repeat(1.0),
            1.0,
            &FieldGenerator::Sphere { radius: None },
        )
        .unwrap();
        let mut cell = grid.cells()[0].clone();
        cell.val = values;

        let code = classify(&values, threshold);
        match IsoFace::from_cell(&cell, threshold) {
            None => {
                prop_assert_eq!(EDGE_TABLE[code as usize], 0);
            }
            Some(face) => {
                prop_assert_ne!(EDGE_TABLE[code as usize], 0);
                prop_assert!(face.triangle_count() > 0);
                for tri in &face.triangles {
                    for &slot in tri {
                        prop_assert!(face.vertices[slot as usize].is_some());
                    }
                }
                for v in face.vertices.iter().flatten() {
                    prop_assert!(v.iter().all(|&c| (-1e-6..=1.0 + 1e-6).contains(&c)));
                }
            }
        }
    }

    /// Assembled buffers are always well formed and reproducible.
    #[test]
    fn noise_meshes_are_well_formed(
        seed in 0.0f32..50.0,
        scale in 0.05f32..0.6,
        threshold in 0.35f32..0.65,
        invert in any::<bool>(),
    ) {
        let mut grid = noise_grid(seed, scale, 5.0, 1.0);
        let mesh = assemble_mesh(&mut grid, threshold, invert);
        assert_well_formed(&mesh);
        prop_assert!(!grid.is_dirty());
        prop_assert_eq!(&assemble_mesh(&mut grid, threshold, invert), &mesh);
        if let Some(bounds) = mesh.bounds() {
            prop_assert!(grid.bounds().contains(&bounds.min));
            prop_assert!(grid.bounds().contains(&bounds.max));
        }
    }

    /// Adding never lowers a value, subtracting never raises one, and
    /// every value stays inside [0, 1].
    #[test]
    fn edits_are_monotone_and_clamped(
        seed in 0.0f32..50.0,
        x in -1.0f32..5.0,
        y in -1.0f32..5.0,
        z in -1.0f32..5.0,
        radius in 0.0f32..3.0,
        strength in 0.0f32..20.0,
        dt in 0.0f32..1.0,
        add in any::<bool>(),
        heightmap in any::<bool>(),
        height in -2.0f32..4.0,
    ) {
        let mut grid = if heightmap {
            Grid::build(
                Pt3::origin(),
                Vec3::repeat(4.0),
                1.0,
                &FieldGenerator::Noise2d {
                    offset: Vec3::new(seed, 0.0, seed * 0.6),
                    scale: 0.3,
                    height,
                },
            )
            .unwrap()
        } else {
            noise_grid(seed, 0.3, 4.0, 1.0)
        };
        for cell in grid.cells() {
            prop_assert!(cell.val.iter().all(|v| (0.0..=1.0).contains(v)));
        }
        grid.mark_clean();
        let before = grid.cells().to_vec();
        let brush = Brush::new(Pt3::new(x, y, z), radius, strength);
        let mode = EditMode::from_add(add);

        let matched = apply_brush(&mut grid, &brush, dt, mode);
        prop_assert_eq!(matched, grid.is_dirty());
        if radius == 0.0 {
            prop_assert!(!matched);
        }

        for (old, new) in before.iter().zip(grid.cells()) {
            for (corner, (&a, &b)) in old.val.iter().zip(new.val.iter()).enumerate() {
                prop_assert!((0.0..=1.0).contains(&b));
                match mode {
                    EditMode::Add => {
                        prop_assert!(b >= a);
                    }
                    EditMode::Subtract => {
                        prop_assert!(b <= a);
                    }
                }
                if nalgebra::distance(&old.pos[corner], &brush.center) > radius {
                    prop_assert_eq!(a, b);
                }
            }
        }
    }

    /// The indexed neighbourhood lookup agrees with a scan of every corner.
    #[test]
    fn cells_near_matches_brute_force(
        x in -2.0f32..7.0,
        y in -2.0f32..7.0,
        z in -2.0f32..7.0,
        radius in 0.0f32..2.5,
        cell_radius in 0.4f32..1.5,
    ) {
        let grid = noise_grid(3.0, 0.2, 5.0, cell_radius);
        let point = Pt3::new(x, y, z);
        let expected: Vec<usize> = grid
            .cells()
            .iter()
            .enumerate()
            .filter(|(_, c)| {
                radius > 0.0 && c.pos.iter().any(|p| nalgebra::distance(p, &point) <= radius)
            })
            .map(|(i, _)| i)
            .collect();
        prop_assert_eq!(grid.cells_near(&point, radius), expected);
    }

    /// Cells never reach past the requested extent.
    #[test]
    fn grid_respects_extent(
        ex in 0.5f32..6.0,
        ey in 0.5f32..6.0,
        ez in 0.5f32..6.0,
        cell_radius in 0.3f32..2.0,
    ) {
        let grid = Grid::build(
            Pt3::new(-1.0, 2.0, 0.5),
            Vec3::new(ex, ey, ez),
            cell_radius,
            &FieldGenerator::Cube { radius: None },
        )
        .unwrap();
        let max = grid.bounds().max;
        for cell in grid.cells() {
            for p in &cell.pos {
                prop_assert!(p.x <= max.x && p.y <= max.y && p.z <= max.z);
            }
        }
        let [nx, ny, nz] = grid.dims();
        prop_assert_eq!(grid.len(), (nx * ny * nz) as usize);
    }
}
