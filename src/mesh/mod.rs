pub mod editor;
pub mod field;
pub mod grid;
pub mod marching_cubes;
pub mod noise;
pub mod tables;
pub mod types;

// Re-export commonly used items
pub use editor::{apply_brush, edit_field, Brush, EditMode};
pub use field::FieldGenerator;
pub use grid::{CellKey, Grid, GridCell, GridState};
pub use marching_cubes::{assemble_mesh, classify, IsoFace, IsoFaces, Mesher};
pub use types::{Aabb, MeshBuffers, Pt3, Vec3};
