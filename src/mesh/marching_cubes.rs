//! Marching-cubes polygonization over a [`Grid`].
//!
//! Each cell is classified into one of 256 corner configurations, the
//! configuration selects the crossed edges and the triangle fan from the
//! lookup tables, and the resulting face is appended to shared buffers.

use crate::mesh::grid::{CellKey, Grid, GridCell};
use crate::mesh::tables::{EDGE_CORNERS, EDGE_TABLE, TRI_TABLE};
use crate::mesh::types::{MeshBuffers, Pt3};

/// Snap distance used by [`interpolate_vertex`].
pub const INTERPOLATION_EPSILON: f32 = 1e-5;

pub const UV_A: [f32; 2] = [0.0, 0.0];
pub const UV_B: [f32; 2] = [0.0, 1.0];
pub const UV_C: [f32; 2] = [1.0, 1.0];
pub const UV_D: [f32; 2] = [1.0, 0.0];

/// Configuration code: bit `i` is set iff `values[i] < threshold`.
#[inline]
pub fn classify(values: &[f32; 8], threshold: f32) -> u8 {
    values
        .iter()
        .enumerate()
        .fold(0u8, |config, (i, &v)| if v < threshold { config | (1 << i) } else { config })
}

/// Point where the isosurface crosses the edge `p1`-`p2`.
///
/// Snaps to an endpoint when the threshold is within epsilon of it, and
/// returns `p1` when both values are (nearly) equal.
pub fn interpolate_vertex(threshold: f32, p1: &Pt3, p2: &Pt3, val1: f32, val2: f32) -> Pt3 {
    if (threshold - val1).abs() < INTERPOLATION_EPSILON {
        return *p1;
    }
    if (threshold - val2).abs() < INTERPOLATION_EPSILON {
        return *p2;
    }
    if (val1 - val2).abs() < INTERPOLATION_EPSILON {
        return *p1;
    }
    let t = (threshold - val1) / (val2 - val1);
    p1 + (p2 - p1) * t
}

/// Surface patch of a single cell, before it is merged into the buffers.
#[derive(Debug, Clone, PartialEq)]
pub struct IsoFace {
    pub key: CellKey,
    pub config: u8,
    /// Crossing point per edge; `Some` exactly for edges in `EDGE_TABLE[config]`.
    pub vertices: [Option<Pt3>; 12],
    /// Triangles over local edge slots, in table order.
    pub triangles: Vec<[u8; 3]>,
}

impl IsoFace {
    /// Polygonizes `cell`; `None` when the cell is entirely inside or outside.
    pub fn from_cell(cell: &GridCell, threshold: f32) -> Option<Self> {
        let config = classify(&cell.val, threshold);
        let edges = EDGE_TABLE[config as usize];
        if edges == 0 {
            return None;
        }

        let vertices = std::array::from_fn(|edge| {
            if edges & (1 << edge) == 0 {
                return None;
            }
            let [a, b] = EDGE_CORNERS[edge];
            Some(interpolate_vertex(
                threshold,
                &cell.pos[a],
                &cell.pos[b],
                cell.val[a],
                cell.val[b],
            ))
        });

        let triangles = TRI_TABLE[config as usize]
            .chunks_exact(3)
            .take_while(|tri| tri[0] != -1)
            .map(|tri| [tri[0] as u8, tri[1] as u8, tri[2] as u8])
            .collect();

        Some(Self {
            key: cell.key,
            config,
            vertices,
            triangles,
        })
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.iter().flatten().count()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }
}

/// Placeholder UV for the `n`-th vertex of a cell's run: groups of three
/// alternate between `A, C, D` and `A, B, C`.
#[inline]
pub fn placeholder_uv(n: usize) -> [f32; 2] {
    let phase = n % 3;
    if (n / 3) % 2 == 0 {
        [UV_A, UV_C, UV_D][phase]
    } else {
        [UV_A, UV_B, UV_C][phase]
    }
}

/// Appends `face` to `buffers`.
///
/// Crossing vertices are appended in edge order and the table's local
/// slots are remapped onto them. Without `invert_winding` the face's index
/// list is appended back to front, which flips every triangle.
pub fn emit_iso_face(face: &IsoFace, buffers: &mut MeshBuffers, invert_winding: bool) {
    let base = buffers.vertices.len() as u32;
    let mut slots = [u32::MAX; 12];
    let mut added = 0usize;

    for (edge, vertex) in face.vertices.iter().enumerate() {
        if let Some(v) = vertex {
            slots[edge] = base + added as u32;
            buffers.vertices.push([v.x, v.y, v.z]);
            buffers.uvs.push(placeholder_uv(added));
            added += 1;
        }
    }

    let local = face.triangles.iter().flatten();
    if invert_winding {
        buffers
            .triangles
            .extend(local.map(|&slot| slots[slot as usize]));
    } else {
        let flat: Vec<u8> = local.copied().collect();
        buffers
            .triangles
            .extend(flat.iter().rev().map(|&slot| slots[slot as usize]));
    }
}

/// Faces of every emitting cell, in grid order.
///
/// Each call to `next` advances past exactly one emitting cell, so a frame
/// loop can spread assembly over several steps. Call [`Mesher::faces`]
/// again to restart from the first cell.
pub struct IsoFaces<'g> {
    cells: std::slice::Iter<'g, GridCell>,
    threshold: f32,
}

impl Iterator for IsoFaces<'_> {
    type Item = IsoFace;

    fn next(&mut self) -> Option<IsoFace> {
        let threshold = self.threshold;
        self.cells
            .by_ref()
            .find_map(|cell| IsoFace::from_cell(cell, threshold))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.cells.len()))
    }
}

/// Owns the output buffers of one surface and refills them on every pass.
#[derive(Debug, Default, Clone)]
pub struct Mesher {
    buffers: MeshBuffers,
}

impl Mesher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn faces<'g>(&self, grid: &'g Grid, threshold: f32) -> IsoFaces<'g> {
        IsoFaces {
            cells: grid.cells().iter(),
            threshold,
        }
    }

    /// Clears the buffers, polygonizes every cell of `grid` and marks it clean.
    pub fn assemble(
        &mut self,
        grid: &mut Grid,
        threshold: f32,
        invert_winding: bool,
    ) -> &MeshBuffers {
        self.buffers.clear();

        let mut emitted = 0usize;
        for face in self.faces(grid, threshold) {
            emit_iso_face(&face, &mut self.buffers, invert_winding);
            emitted += 1;
        }

        log::debug!(
            "assembled {} of {} cells: {} vertices, {} triangles",
            emitted,
            grid.len(),
            self.buffers.vertex_count(),
            self.buffers.triangle_count()
        );
        grid.mark_clean();
        &self.buffers
    }

    pub fn buffers(&self) -> &MeshBuffers {
        &self.buffers
    }

    pub fn into_buffers(self) -> MeshBuffers {
        self.buffers
    }
}

/// One-shot assembly into fresh buffers.
pub fn assemble_mesh(grid: &mut Grid, threshold: f32, invert_winding: bool) -> MeshBuffers {
    let mut mesher = Mesher::new();
    mesher.assemble(grid, threshold, invert_winding);
    mesher.into_buffers()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::field::FieldGenerator;
    use crate::mesh::types::Vec3;

    fn cell_with(values: [f32; 8]) -> GridCell {
        let pos = std::array::from_fn(|i| {
            let [x, y, z] = crate::mesh::grid::CORNER_OFFSETS[i];
            Pt3::new(x as f32, y as f32, z as f32)
        });
        GridCell {
            key: CellKey::new(0, 0, 0),
            pos,
            val: values,
        }
    }

    #[test]
    fn classify_uses_strict_less_than() {
        assert_eq!(classify(&[0.5; 8], 0.5), 0);
        assert_eq!(classify(&[0.0; 8], 0.5), 0xff);
        let mut values = [1.0; 8];
        values[0] = 0.2;
        values[6] = 0.4999;
        assert_eq!(classify(&values, 0.5), 0b0100_0001);
    }

    #[test]
    fn interpolation_midpoint_and_guards() {
        let a = Pt3::new(0.0, 0.0, 0.0);
        let b = Pt3::new(2.0, 0.0, 0.0);
        assert_eq!(interpolate_vertex(0.5, &a, &b, 0.0, 1.0), Pt3::new(1.0, 0.0, 0.0));
        assert_eq!(interpolate_vertex(0.25, &a, &b, 0.0, 1.0), Pt3::new(0.5, 0.0, 0.0));
        // equal values never divide by zero
        assert_eq!(interpolate_vertex(0.5, &a, &b, 0.3, 0.3), a);
        assert_eq!(interpolate_vertex(0.5, &a, &b, 0.5, 1.0), a);
        assert_eq!(interpolate_vertex(0.5, &a, &b, 0.0, 0.500001), b);
    }

    #[test]
    fn uniform_cells_emit_nothing() {
        assert!(IsoFace::from_cell(&cell_with([0.0; 8]), 0.5).is_none());
        assert!(IsoFace::from_cell(&cell_with([1.0; 8]), 0.5).is_none());
    }

    #[test]
    fn single_corner_face() {
        let mut values = [1.0; 8];
        values[3] = 0.0;
        let face = IsoFace::from_cell(&cell_with(values), 0.5).unwrap();
        assert_eq!(face.config, 0b1000);
        assert_eq!(face.vertex_count(), 3);
        assert_eq!(face.triangle_count(), 1);
        for (edge, v) in face.vertices.iter().enumerate() {
            assert_eq!(v.is_some(), EDGE_TABLE[8] & (1 << edge) != 0);
        }
        // corner 3 sits at the origin; every crossing is half a unit away
        for v in face.vertices.iter().flatten() {
            assert!((v.coords.magnitude() - 0.5).abs() < 1e-6);
        }
    }

    #[test]
    fn winding_flag_reverses_indices() {
        let mut values = [1.0; 8];
        values[0] = 0.0;
        values[1] = 0.0;
        let face = IsoFace::from_cell(&cell_with(values), 0.5).unwrap();

        let mut forward = MeshBuffers::new();
        emit_iso_face(&face, &mut forward, true);
        let mut reversed = MeshBuffers::new();
        emit_iso_face(&face, &mut reversed, false);

        assert_eq!(forward.vertices, reversed.vertices);
        let mut flipped = forward.triangles.clone();
        flipped.reverse();
        assert_eq!(flipped, reversed.triangles);
    }

    #[test]
    fn emitted_indices_are_offset_by_existing_vertices() {
        let mut values = [1.0; 8];
        values[5] = 0.0;
        let face = IsoFace::from_cell(&cell_with(values), 0.5).unwrap();

        let mut buffers = MeshBuffers::new();
        emit_iso_face(&face, &mut buffers, true);
        emit_iso_face(&face, &mut buffers, true);

        assert_eq!(buffers.vertex_count(), 6);
        assert_eq!(buffers.uvs.len(), 6);
        assert!(buffers.triangles[..3].iter().all(|&i| i < 3));
        assert!(buffers.triangles[3..].iter().all(|&i| (3..6).contains(&i)));
    }

    #[test]
    fn uv_pattern_alternates_per_group() {
        let uvs: Vec<[f32; 2]> = (0..7).map(placeholder_uv).collect();
        assert_eq!(uvs, vec![UV_A, UV_C, UV_D, UV_A, UV_B, UV_C, UV_A]);
    }

    #[test]
    fn faces_iterator_matches_assembly() {
        let mut grid = Grid::build(
            Pt3::origin(),
            Vec3::repeat(6.0),
            1.0,
            &FieldGenerator::Sphere { radius: Some(2.0) },
        )
        .unwrap();

        let mut mesher = Mesher::new();
        let triangles: usize = mesher.faces(&grid, 0.5).map(|f| f.triangle_count()).sum();
        let mesh = mesher.assemble(&mut grid, 0.5, false);
        assert!(triangles > 0);
        assert_eq!(mesh.triangle_count(), triangles);
    }

    #[test]
    fn assembly_marks_grid_clean() {
        let mut grid = Grid::build(
            Pt3::origin(),
            Vec3::repeat(4.0),
            1.0,
            &FieldGenerator::Sphere { radius: Some(1.5) },
        )
        .unwrap();
        assert!(grid.is_dirty());
        let mesh = assemble_mesh(&mut grid, 0.5, false);
        assert!(!mesh.is_empty());
        assert_eq!(grid.state(), crate::mesh::grid::GridState::Clean);

        grid.set_corner_value([2, 2, 2], 1.0);
        assert!(grid.is_dirty());
        Mesher::new().assemble(&mut grid, 0.5, false);
        assert!(!grid.is_dirty());
    }
}
