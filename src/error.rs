//! Error types for grid construction and configuration loading.

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while validating a configuration or building a grid.
///
/// Edits that miss every cell are not errors: they return `false`.
#[derive(Debug, Error)]
pub enum MeshError {
    /// Cell radius is zero, negative or not finite.
    #[error("cell radius must be positive and finite, got {0}")]
    NonPositiveCellRadius(f32),

    /// Grid extent collapses (or is inverted) on one axis.
    #[error("degenerate bounds on {axis} axis: extent {extent}")]
    DegenerateBounds { axis: char, extent: f32 },

    /// A parameter is NaN or infinite.
    #[error("parameter `{0}` is not finite")]
    NonFiniteParameter(&'static str),

    /// An explicit sphere/cube radius that is zero or negative.
    #[error("shape radius must be positive, got {0}")]
    NonPositiveShapeRadius(f32),

    /// Bounds and cell radius would produce more cells than a grid may hold.
    #[error("grid would contain {cells} cells, limit is {limit}")]
    TooManyCells { cells: u64, limit: u64 },

    #[error("failed to read config {path}: {source}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    ConfigParse(#[from] serde_json::Error),
}

impl MeshError {
    /// True for the variants that reject a configuration before any allocation.
    pub fn is_invalid_configuration(&self) -> bool {
        matches!(
            self,
            MeshError::NonPositiveCellRadius(_)
                | MeshError::DegenerateBounds { .. }
                | MeshError::NonFiniteParameter(_)
                | MeshError::NonPositiveShapeRadius(_)
                | MeshError::TooManyCells { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, MeshError>;
