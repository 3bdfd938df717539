use serde::{Deserialize, Serialize};

use crate::error::{MeshError, Result};
use crate::mesh::noise::perlin2d;
use crate::mesh::types::{Aabb, Pt3, Vec3};

/// Value written for corners inside a sphere/cube shape.
pub const INSIDE: f32 = 0.0;
/// Value written for corners outside a sphere/cube shape.
pub const OUTSIDE: f32 = 1.0;

pub const DEFAULT_SPHERE_RADIUS: f32 = 2.0;
pub const DEFAULT_CUBE_RADIUS: f32 = 2.5;

fn default_noise_scale() -> f32 {
    0.1
}

fn default_height() -> f32 {
    1.0
}

/// Scalar field sampled at every grid corner, chosen once at grid-build time.
///
/// Shape generators are binary: `INSIDE` below the threshold, `OUTSIDE` above it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FieldGenerator {
    /// Mean of the six ordered-pair 2D noise samples over (x, y, z).
    Noise3d {
        #[serde(default = "Vec3::zeros")]
        offset: Vec3,
        #[serde(default = "default_noise_scale")]
        scale: f32,
    },
    /// Heightmap noise over (x, z) weighted by normalised height.
    Noise2d {
        #[serde(default = "Vec3::zeros")]
        offset: Vec3,
        #[serde(default = "default_noise_scale")]
        scale: f32,
        #[serde(default = "default_height")]
        height: f32,
    },
    /// Ball centred in the grid bounds. Radius defaults to 2.0.
    Sphere {
        #[serde(default)]
        radius: Option<f32>,
    },
    /// Axis-aligned cube centred in the grid bounds; `radius` is the half-extent
    /// used on all three axes. Defaults to 2.5.
    Cube {
        #[serde(default)]
        radius: Option<f32>,
    },
}

impl Default for FieldGenerator {
    fn default() -> Self {
        FieldGenerator::Noise3d {
            offset: Vec3::zeros(),
            scale: default_noise_scale(),
        }
    }
}

impl FieldGenerator {
    pub fn name(&self) -> &'static str {
        match self {
            FieldGenerator::Noise3d { .. } => "noise3d",
            FieldGenerator::Noise2d { .. } => "noise2d",
            FieldGenerator::Sphere { .. } => "sphere",
            FieldGenerator::Cube { .. } => "cube",
        }
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            FieldGenerator::Noise3d { offset, scale } => {
                check_vec(offset, "generator.offset")?;
                check_finite(*scale, "generator.scale")
            }
            FieldGenerator::Noise2d {
                offset,
                scale,
                height,
            } => {
                check_vec(offset, "generator.offset")?;
                check_finite(*scale, "generator.scale")?;
                check_finite(*height, "generator.height")
            }
            FieldGenerator::Sphere { radius } | FieldGenerator::Cube { radius } => match radius {
                Some(r) if !r.is_finite() => Err(MeshError::NonFiniteParameter("generator.radius")),
                Some(r) if *r <= 0.0 => Err(MeshError::NonPositiveShapeRadius(*r)),
                _ => Ok(()),
            },
        }
    }

    /// Density at `point` for a grid spanning `bounds`.
    pub fn sample(&self, point: &Pt3, bounds: &Aabb) -> f32 {
        match self {
            FieldGenerator::Noise3d { offset, scale } => noise3d(point, offset, *scale),
            FieldGenerator::Noise2d {
                offset,
                scale,
                height,
            } => noise2d(point, offset, *scale, *height, bounds),
            FieldGenerator::Sphere { radius } => sphere(
                point,
                &bounds.center(),
                radius.unwrap_or(DEFAULT_SPHERE_RADIUS),
            ),
            FieldGenerator::Cube { radius } => {
                cube(point, &bounds.center(), radius.unwrap_or(DEFAULT_CUBE_RADIUS))
            }
        }
    }
}

fn check_finite(value: f32, name: &'static str) -> Result<()> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(MeshError::NonFiniteParameter(name))
    }
}

fn check_vec(value: &Vec3, name: &'static str) -> Result<()> {
    if value.iter().all(|c| c.is_finite()) {
        Ok(())
    } else {
        Err(MeshError::NonFiniteParameter(name))
    }
}

/// Averages all six ordered coordinate pairs so no single projection
/// plane dominates the result.
pub fn noise3d(point: &Pt3, offset: &Vec3, scale: f32) -> f32 {
    let a = offset.x + scale * point.x;
    let b = offset.y + scale * point.y;
    let c = offset.z + scale * point.z;

    let ab = perlin2d(a, b);
    let bc = perlin2d(b, c);
    let ac = perlin2d(a, c);

    let ba = perlin2d(b, a);
    let cb = perlin2d(c, b);
    let ca = perlin2d(c, a);

    (ab + bc + ac + ba + cb + ca) / 6.0
}

/// Height-field density: `noise(nx, nz) * ny`, where `ny` is the point's
/// height normalised to the grid extent and scaled by `height`. The result
/// is clamped to `[0, 1]` like every other generator.
pub fn noise2d(point: &Pt3, offset: &Vec3, scale: f32, height: f32, bounds: &Aabb) -> f32 {
    let nx = offset.x + scale * point.x;
    let nz = offset.z + scale * point.z;

    let span = bounds.max.y - bounds.min.y;
    let ny = if span > 0.0 {
        height * (point.y - bounds.min.y) / span
    } else {
        0.0
    };

    (perlin2d(nx, nz) * ny).clamp(0.0, 1.0)
}

pub fn sphere(point: &Pt3, center: &Pt3, radius: f32) -> f32 {
    if nalgebra::distance(point, center) < radius {
        INSIDE
    } else {
        OUTSIDE
    }
}

pub fn cube(point: &Pt3, center: &Pt3, half_extent: f32) -> f32 {
    let d = (point - center).abs();
    if d.x < half_extent && d.y < half_extent && d.z < half_extent {
        INSIDE
    } else {
        OUTSIDE
    }
}
