// Owner of one editable surface: config, grid and the cached mesh.
// Assembly only reruns when the grid or the meshing parameters changed.

use crate::error::Result;
use crate::mesh::{apply_brush, Brush, EditMode, Grid, MeshBuffers, Mesher};
use crate::settings::MesherConfig;

pub struct IsoSurface {
    config: MesherConfig,
    grid: Grid,
    mesher: Mesher,
    stale: bool,
}

impl IsoSurface {
    /// Validates `config` and builds the grid. Nothing is meshed until [`IsoSurface::mesh`].
    pub fn new(config: MesherConfig) -> Result<Self> {
        config.validate()?;
        let grid = build_grid(&config)?;
        log::info!(
            "{} surface ready: {} cells, threshold {}",
            config.generator.name(),
            grid.len(),
            config.threshold
        );
        Ok(Self {
            config,
            grid,
            mesher: Mesher::new(),
            stale: true,
        })
    }

    pub fn config(&self) -> &MesherConfig {
        &self.config
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// True when the next [`IsoSurface::mesh`] call will re-run assembly.
    pub fn needs_remesh(&self) -> bool {
        self.stale || self.grid.is_dirty()
    }

    /// Current mesh, reassembled first if anything changed since the last call.
    pub fn mesh(&mut self) -> &MeshBuffers {
        if self.needs_remesh() {
            self.mesher.assemble(
                &mut self.grid,
                self.config.threshold,
                self.config.invert_winding,
            );
            self.stale = false;
        }
        self.mesher.buffers()
    }

    /// Applies a brush edit; returns false when it touched nothing.
    pub fn edit(&mut self, brush: &Brush, dt: f32, mode: EditMode) -> bool {
        apply_brush(&mut self.grid, brush, dt, mode)
    }

    /// Sets one lattice point's value in every cell that shares it.
    pub fn set_corner_value(&mut self, point: [u32; 3], value: f32) -> bool {
        self.grid.set_corner_value(point, value)
    }

    pub fn set_threshold(&mut self, threshold: f32) -> Result<()> {
        if threshold == self.config.threshold {
            return Ok(());
        }
        let next = MesherConfig {
            threshold,
            ..self.config.clone()
        };
        next.validate()?;
        self.config = next;
        self.stale = true;
        Ok(())
    }

    pub fn set_invert_winding(&mut self, invert: bool) {
        if invert != self.config.invert_winding {
            self.config.invert_winding = invert;
            self.stale = true;
        }
    }

    /// Replaces the configuration and rebuilds the grid from scratch,
    /// discarding any edits. On error the current surface is kept.
    pub fn reconfigure(&mut self, config: MesherConfig) -> Result<()> {
        config.validate()?;
        self.grid = build_grid(&config)?;
        self.config = config;
        self.stale = true;
        Ok(())
    }
}

fn build_grid(config: &MesherConfig) -> Result<Grid> {
    Grid::build(
        config.origin,
        config.extent,
        config.cell_radius,
        &config.generator,
    )
}
