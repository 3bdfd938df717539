//! Marching-cubes isosurface extraction from a scalar field sampled on a
//! regular grid, with brush edits that change corner values in place.

pub mod error;
pub mod mesh;
pub mod mesh_generation;
pub mod settings;

pub use error::{MeshError, Result};
pub use mesh::{
    apply_brush, assemble_mesh, classify, edit_field, Aabb, Brush, CellKey, EditMode,
    FieldGenerator, Grid, GridCell, GridState, IsoFace, IsoFaces, MeshBuffers, Mesher, Pt3, Vec3,
};
pub use mesh_generation::IsoSurface;
pub use settings::MesherConfig;
