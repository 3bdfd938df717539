// Brush edits applied directly to grid corner values.

use serde::{Deserialize, Serialize};

use crate::mesh::grid::Grid;
use crate::mesh::types::Pt3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EditMode {
    /// Raise values (pushes corners outside).
    Add,
    /// Lower values (pulls corners inside).
    Subtract,
}

impl EditMode {
    pub fn from_add(add: bool) -> Self {
        if add {
            EditMode::Add
        } else {
            EditMode::Subtract
        }
    }
}

/// Spherical brush with linear falloff.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Brush {
    pub center: Pt3,
    pub radius: f32,
    /// Change per second at the brush center.
    pub strength: f32,
}

impl Brush {
    pub fn new(center: Pt3, radius: f32, strength: f32) -> Self {
        Self {
            center,
            radius,
            strength,
        }
    }

    /// Weight in `[0, 1]` for a corner `distance` away, falling to 0 at the rim.
    #[inline]
    pub fn falloff(&self, distance: f32) -> f32 {
        (1.0 - distance / self.radius).clamp(0.0, 1.0)
    }
}

/// Applies `brush` for `dt` seconds to every corner within its radius.
///
/// Every touched value ends up clamped to `[0, 1]`. Returns false, leaving
/// the grid untouched, when no corner lies within the radius; a radius of
/// zero never matches. On success the grid is marked dirty.
pub fn apply_brush(grid: &mut Grid, brush: &Brush, dt: f32, mode: EditMode) -> bool {
    let amount = brush.strength * dt;
    if !amount.is_finite() {
        log::warn!("ignoring brush edit with non-finite amount {}", amount);
        return false;
    }
    let amount = amount.max(0.0);

    let hits = grid.cells_near(&brush.center, brush.radius);
    if hits.is_empty() {
        log::debug!(
            "brush at {:?} (r = {}) matched no cell",
            brush.center.coords.as_slice(),
            brush.radius
        );
        return false;
    }

    let mut touched = 0usize;
    let cells = grid.cells_mut();
    for &index in &hits {
        let cell = &mut cells[index];
        for (pos, val) in cell.pos.iter().zip(cell.val.iter_mut()) {
            let distance = nalgebra::distance(pos, &brush.center);
            if distance > brush.radius {
                continue;
            }
            let delta = amount * brush.falloff(distance);
            let next = match mode {
                EditMode::Add => *val + delta,
                EditMode::Subtract => *val - delta,
            };
            *val = next.clamp(0.0, 1.0);
            touched += 1;
        }
    }

    grid.mark_dirty();
    log::debug!(
        "brush {:?}: {} cells, {} corners touched",
        mode,
        hits.len(),
        touched
    );
    true
}

/// Flat-argument form of [`apply_brush`].
pub fn edit_field(
    grid: &mut Grid,
    point: Pt3,
    radius: f32,
    strength: f32,
    dt: f32,
    add: bool,
) -> bool {
    apply_brush(
        grid,
        &Brush::new(point, radius, strength),
        dt,
        EditMode::from_add(add),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::field::FieldGenerator;
    use crate::mesh::types::Vec3;

    fn noise_grid() -> Grid {
        Grid::build(
            Pt3::origin(),
            Vec3::repeat(4.0),
            1.0,
            &FieldGenerator::Noise3d {
                offset: Vec3::new(1.3, 2.1, 0.7),
                scale: 0.35,
            },
        )
        .unwrap()
    }

    #[test]
    fn zero_radius_never_matches() {
        let mut grid = noise_grid();
        grid.mark_clean();
        let before = grid.cells().to_vec();
        // exactly on a lattice corner
        assert!(!edit_field(&mut grid, Pt3::new(1.0, 1.0, 1.0), 0.0, 1.0, 1.0, true));
        assert!(!edit_field(&mut grid, Pt3::new(1.5, 1.5, 1.5), 0.0, 1.0, 1.0, false));
        assert_eq!(grid.cells(), &before[..]);
        assert!(!grid.is_dirty());
    }

    #[test]
    fn far_point_is_a_no_op() {
        let mut grid = noise_grid();
        grid.mark_clean();
        assert!(!edit_field(&mut grid, Pt3::new(50.0, 0.0, 0.0), 2.0, 1.0, 1.0, true));
        assert!(!grid.is_dirty());
    }

    #[test]
    fn add_raises_with_linear_falloff() {
        let mut grid = Grid::build(
            Pt3::origin(),
            Vec3::repeat(4.0),
            1.0,
            &FieldGenerator::Sphere { radius: Some(100.0) },
        )
        .unwrap();
        grid.mark_clean();

        let center = Pt3::new(2.0, 2.0, 2.0);
        assert!(apply_brush(
            &mut grid,
            &Brush::new(center, 2.0, 0.5),
            0.5,
            EditMode::Add
        ));
        assert!(grid.is_dirty());

        for cell in grid.cells() {
            for (p, v) in cell.pos.iter().zip(cell.val.iter()) {
                let d = nalgebra::distance(p, &center);
                let expected = if d <= 2.0 { 0.25 * (1.0 - d / 2.0) } else { 0.0 };
                assert!((v - expected).abs() < 1e-6, "corner {p:?}: {v} vs {expected}");
            }
        }
    }

    #[test]
    fn subtract_clamps_at_zero() {
        let mut grid = noise_grid();
        let center = Pt3::new(2.0, 2.0, 2.0);
        assert!(edit_field(&mut grid, center, 1.5, 100.0, 1.0, false));
        let cell = grid.cell(crate::mesh::grid::CellKey::new(1, 1, 1)).unwrap();
        // corner 5 of cell (1,1,1) is the lattice point (2,2,2)
        assert_eq!(cell.pos[5], center);
        assert_eq!(cell.val[5], 0.0);
    }
}
