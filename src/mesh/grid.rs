use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::mesh::field::FieldGenerator;
use crate::mesh::types::{Aabb, Pt3, Vec3};

/// Upper bound on the number of cells a single grid may hold.
pub const MAX_CELLS: u64 = 1 << 22;

/// Lattice offsets of the 8 corners: the four low corners, then the four
/// high ones, each ring ordered front-left, front-right, back-right, back-left.
pub const CORNER_OFFSETS: [[u32; 3]; 8] = [
    [0, 0, 1],
    [1, 0, 1],
    [1, 0, 0],
    [0, 0, 0],
    [0, 1, 1],
    [1, 1, 1],
    [1, 1, 0],
    [0, 1, 0],
];

/// Step indices of a cell along each axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellKey {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl CellKey {
    pub fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Lattice point of corner `corner` of this cell.
    pub fn corner(&self, corner: usize) -> [u32; 3] {
        let [ox, oy, oz] = CORNER_OFFSETS[corner];
        [self.x + ox, self.y + oy, self.z + oz]
    }
}

/// One cube of the sampling lattice. `pos[i]` and `val[i]` describe the same corner.
#[derive(Debug, Clone, PartialEq)]
pub struct GridCell {
    pub key: CellKey,
    pub pos: [Pt3; 8],
    pub val: [f32; 8],
}

impl GridCell {
    fn sample(
        key: CellKey,
        origin: &Pt3,
        cell_radius: f32,
        generator: &FieldGenerator,
        bounds: &Aabb,
    ) -> Self {
        let pos: [Pt3; 8] = std::array::from_fn(|i| lattice_point(origin, cell_radius, key.corner(i)));
        let val: [f32; 8] = std::array::from_fn(|i| generator.sample(&pos[i], bounds));
        Self { key, pos, val }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GridState {
    /// Values match the last assembled mesh.
    Clean,
    /// Values changed since the last assembly (or never assembled).
    Dirty,
}

fn lattice_point(origin: &Pt3, cell_radius: f32, [i, j, k]: [u32; 3]) -> Pt3 {
    origin
        + Vec3::new(
            i as f32 * cell_radius,
            j as f32 * cell_radius,
            k as f32 * cell_radius,
        )
}

/// Number of whole cells that fit in `[min, max]`; the fractional remainder is dropped.
fn axis_steps(min: f32, max: f32, cell_radius: f32) -> u64 {
    let fits = |n: u64| min + n as f32 * cell_radius <= max;

    // The quotient can be off by one step either way after rounding. Both
    // corrections are bounded so huge extents cannot spin on f32 precision.
    let mut n = ((max - min) / cell_radius).floor().max(0.0) as u64;
    for _ in 0..2 {
        if n > 0 && !fits(n) {
            n -= 1;
        }
    }
    for _ in 0..2 {
        let next = n.saturating_add(1);
        if next == n || !fits(next) {
            break;
        }
        n = next;
    }
    n
}

/// Rejects bounds/radius combinations before anything is allocated.
pub fn validate_bounds(origin: &Pt3, extent: &Vec3, cell_radius: f32) -> Result<()> {
    if !(cell_radius.is_finite() && cell_radius > 0.0) {
        return Err(MeshError::NonPositiveCellRadius(cell_radius));
    }
    if !origin.iter().all(|c| c.is_finite()) {
        return Err(MeshError::NonFiniteParameter("origin"));
    }
    for (axis, extent) in ['x', 'y', 'z'].into_iter().zip(extent.iter().copied()) {
        if !(extent.is_finite() && extent > 0.0) {
            return Err(MeshError::DegenerateBounds { axis, extent });
        }
    }
    Ok(())
}

/// Ordered cells covering `[origin, origin + extent)`, stored x-major, then z, then y.
#[derive(Debug, Clone)]
pub struct Grid {
    bounds: Aabb,
    cell_radius: f32,
    dims: [u32; 3],
    cells: Vec<GridCell>,
    state: GridState,
}

impl Grid {
    /// Enumerates every whole cell inside the bounds and samples its corners.
    ///
    /// Cells whose far corner would pass `origin + extent` are skipped, so an
    /// extent that is not a multiple of `cell_radius` leaves a strip unmeshed.
    pub fn build(
        origin: Pt3,
        extent: Vec3,
        cell_radius: f32,
        generator: &FieldGenerator,
    ) -> Result<Self> {
        validate_bounds(&origin, &extent, cell_radius)?;
        generator.validate()?;

        let bounds = Aabb::new(origin, origin + extent);
        let steps: [u64; 3] =
            std::array::from_fn(|a| axis_steps(bounds.min[a], bounds.max[a], cell_radius));
        let count = steps[0]
            .saturating_mul(steps[1])
            .saturating_mul(steps[2]);
        if count > MAX_CELLS {
            log::warn!("rejecting grid of {} cells ({:?})", count, steps);
            return Err(MeshError::TooManyCells {
                cells: count,
                limit: MAX_CELLS,
            });
        }
        let dims = steps.map(|n| n as u32);

        let cells: Vec<GridCell> = (0..count as usize)
            .into_par_iter()
            .map(|index| {
                let key = key_for(index, dims);
                GridCell::sample(key, &origin, cell_radius, generator, &bounds)
            })
            .collect();

        if cells.is_empty() {
            log::warn!(
                "grid extent {:?} holds no whole cell of radius {}",
                extent.as_slice(),
                cell_radius
            );
        }
        log::debug!(
            "built {} grid: {} cells ({} x {} x {})",
            generator.name(),
            cells.len(),
            dims[0],
            dims[1],
            dims[2]
        );

        Ok(Self {
            bounds,
            cell_radius,
            dims,
            cells,
            state: GridState::Dirty,
        })
    }

    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    pub fn cell_radius(&self) -> f32 {
        self.cell_radius
    }

    /// Cell counts along x, y and z.
    pub fn dims(&self) -> [u32; 3] {
        self.dims
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cells(&self) -> &[GridCell] {
        &self.cells
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [GridCell] {
        &mut self.cells
    }

    pub fn state(&self) -> GridState {
        self.state
    }

    pub fn is_dirty(&self) -> bool {
        self.state == GridState::Dirty
    }

    pub fn mark_dirty(&mut self) {
        self.state = GridState::Dirty;
    }

    pub fn mark_clean(&mut self) {
        self.state = GridState::Clean;
    }

    /// Storage index of `key`, if the cell exists.
    #[inline]
    pub fn cell_index(&self, key: CellKey) -> Option<usize> {
        let [nx, ny, nz] = self.dims;
        if key.x >= nx || key.y >= ny || key.z >= nz {
            return None;
        }
        Some(((key.x as usize * nz as usize) + key.z as usize) * ny as usize + key.y as usize)
    }

    pub fn cell(&self, key: CellKey) -> Option<&GridCell> {
        self.cell_index(key).map(|i| &self.cells[i])
    }

    /// World position of lattice point `(i, j, k)`.
    pub fn lattice_position(&self, point: [u32; 3]) -> Pt3 {
        lattice_point(&self.bounds.min, self.cell_radius, point)
    }

    /// Sets the value of one lattice point in every cell sharing it.
    ///
    /// `value` is clamped to `[0, 1]`. Returns false, leaving the grid
    /// untouched, for a non-finite value or when no cell has that corner.
    pub fn set_corner_value(&mut self, point: [u32; 3], value: f32) -> bool {
        if !value.is_finite() {
            log::warn!("ignoring non-finite value {} for corner {:?}", value, point);
            return false;
        }
        let value = value.clamp(0.0, 1.0);
        let mut found = false;
        for (corner, offset) in CORNER_OFFSETS.iter().enumerate() {
            let (Some(x), Some(y), Some(z)) = (
                point[0].checked_sub(offset[0]),
                point[1].checked_sub(offset[1]),
                point[2].checked_sub(offset[2]),
            ) else {
                continue;
            };
            if let Some(index) = self.cell_index(CellKey::new(x, y, z)) {
                self.cells[index].val[corner] = value;
                found = true;
            }
        }
        if found {
            self.mark_dirty();
        }
        found
    }

    /// Indices (in storage order) of cells with a corner within `radius` of `point`.
    ///
    /// Only the key range around `point` is visited; the result is the same as
    /// testing every corner of every cell.
    pub fn cells_near(&self, point: &Pt3, radius: f32) -> Vec<usize> {
        if !(radius.is_finite() && radius > 0.0) || self.cells.is_empty() {
            return Vec::new();
        }
        if !point.iter().all(|c| c.is_finite()) {
            return Vec::new();
        }

        // Candidate cell range per axis, padded by one step against rounding.
        let mut range = [(0u32, 0u32); 3];
        for a in 0..3 {
            let last = self.dims[a] as f32 - 1.0;
            let lo = ((point[a] - radius - self.bounds.min[a]) / self.cell_radius).floor() - 2.0;
            let hi = ((point[a] + radius - self.bounds.min[a]) / self.cell_radius).floor() + 1.0;
            if hi < 0.0 || lo > last {
                return Vec::new();
            }
            range[a] = (lo.max(0.0) as u32, hi.min(last) as u32);
        }

        let mut found = Vec::new();
        for x in range[0].0..=range[0].1 {
            for z in range[2].0..=range[2].1 {
                for y in range[1].0..=range[1].1 {
                    let Some(index) = self.cell_index(CellKey::new(x, y, z)) else {
                        continue;
                    };
                    let cell = &self.cells[index];
                    if cell
                        .pos
                        .iter()
                        .any(|c| nalgebra::distance(c, point) <= radius)
                    {
                        found.push(index);
                    }
                }
            }
        }
        found
    }
}

fn key_for(index: usize, dims: [u32; 3]) -> CellKey {
    let ny = dims[1] as usize;
    let nz = dims[2] as usize;
    let y = index % ny;
    let z = (index / ny) % nz;
    let x = index / (ny * nz);
    CellKey::new(x as u32, y as u32, z as u32)
}
