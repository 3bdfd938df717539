use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::grid::validate_bounds;
use crate::mesh::{FieldGenerator, Pt3, Vec3};

/// Options record for building and meshing one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MesherConfig {
    /// Low corner of the grid.
    pub origin: Pt3,
    /// Size of the grid; the high corner is `origin + extent`.
    pub extent: Vec3,
    /// Edge length of one cell.
    pub cell_radius: f32,
    /// Isovalue; corner values below it are inside.
    pub threshold: f32,
    pub generator: FieldGenerator,
    /// Keep the lookup table's triangle order instead of reversing it.
    pub invert_winding: bool,
}

impl Default for MesherConfig {
    fn default() -> Self {
        Self {
            origin: Pt3::origin(),
            extent: Vec3::repeat(8.0),
            cell_radius: 1.0,
            threshold: 0.5,
            generator: FieldGenerator::default(),
            invert_winding: false,
        }
    }
}

impl MesherConfig {
    pub fn max(&self) -> Pt3 {
        self.origin + self.extent
    }

    pub fn validate(&self) -> Result<()> {
        validate_bounds(&self.origin, &self.extent, self.cell_radius)?;
        if !self.threshold.is_finite() {
            return Err(MeshError::NonFiniteParameter("threshold"));
        }
        self.generator.validate()
    }

    pub fn from_json_str(content: &str) -> Result<Self> {
        let config: MesherConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| MeshError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&content)
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
