//! Grid configuration.

use std::str::FromStr;

use glam::{DVec3, IVec3};
use kerf_core::constants::{MAX_GRID_VOXELS, TILE_SIZE};
use kerf_core::{Error, GridDims, Result};
use kerf_tool::directive_tokens;
use serde::{Deserialize, Serialize};

/// Fraction of a voxel forgiven when dividing bounds by resolution, so that
/// bounds stored as `f32` still produce the intended voxel count.
const STEP_TOLERANCE: f64 = 1e-3;

/// Placement and sampling of the stock lattice.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct GridConfig {
    /// World position of voxel (0, 0, 0)
    pub start: DVec3,
    /// World extent of the stock
    pub bounds: DVec3,
    /// World units per voxel edge
    pub resolution: f64,
    /// Tile edge length in voxels
    pub tile_size: i32,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            start: DVec3::ZERO,
            bounds: DVec3::ONE,
            resolution: 0.01,
            tile_size: TILE_SIZE,
        }
    }
}

impl GridConfig {
    pub fn new(start: DVec3, bounds: DVec3, resolution: f64) -> Self {
        Self {
            start,
            bounds,
            resolution,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_start(mut self, start: DVec3) -> Self {
        self.start = start;
        self
    }

    #[must_use]
    pub fn with_bounds(mut self, bounds: DVec3) -> Self {
        self.bounds = bounds;
        self
    }

    #[must_use]
    pub fn with_resolution(mut self, resolution: f64) -> Self {
        self.resolution = resolution;
        self
    }

    #[must_use]
    pub fn with_tile_size(mut self, tile_size: i32) -> Self {
        self.tile_size = tile_size;
        self
    }

    /// Stock voxels per axis.
    pub fn maxstep(&self) -> IVec3 {
        (self.bounds / self.resolution + STEP_TOLERANCE)
            .floor()
            .as_ivec3()
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.resolution.is_finite() && self.resolution > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "resolution must be positive, got {}",
                self.resolution
            )));
        }
        if !self.start.is_finite() || !self.bounds.is_finite() {
            return Err(Error::InvalidConfig("start and bounds must be finite".into()));
        }
        if self.bounds.cmple(DVec3::ZERO).any() {
            return Err(Error::InvalidConfig(format!(
                "bounds must be positive, got {}",
                self.bounds
            )));
        }
        if self.tile_size <= 0 {
            return Err(Error::InvalidConfig(format!(
                "tile size must be positive, got {}",
                self.tile_size
            )));
        }
        let steps = self.bounds / self.resolution;
        if steps.cmplt(DVec3::ONE).any() || steps.cmpgt(DVec3::splat(f64::from(i32::MAX / 4))).any()
        {
            return Err(Error::InvalidConfig(format!(
                "{steps} voxels per axis is out of range"
            )));
        }
        match GridDims::checked_padded_len(self.maxstep()) {
            Some(len) if len as u64 <= MAX_GRID_VOXELS => Ok(()),
            _ => Err(Error::InvalidConfig(format!(
                "a {} voxel grid is too large",
                self.maxstep()
            ))),
        }
    }
}

/// Rectangular stock named by a `RectSolid` directive.
///
/// The directive lists the sizes as X, Z, Y followed by a skipped value and
/// the origin as X, Y, Z.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct StockSpec {
    pub size: DVec3,
    pub origin: DVec3,
}

impl StockSpec {
    /// True when `line` is a stock directive.
    pub fn is_directive(line: &str) -> bool {
        directive_tokens(line).first() == Some(&"RectSolid")
    }

    /// Grid config covering this stock at `resolution`.
    pub fn grid_config(&self, resolution: f64) -> GridConfig {
        GridConfig::new(self.origin, self.size, resolution)
    }
}

impl FromStr for StockSpec {
    type Err = Error;

    fn from_str(line: &str) -> Result<Self> {
        let tokens = directive_tokens(line);
        if tokens.first() != Some(&"RectSolid") {
            return Err(Error::InvalidDirective(format!("not a stock directive: {line}")));
        }
        let arg = |i: usize| -> Result<f64> {
            tokens
                .get(i)
                .and_then(|raw| raw.parse::<f64>().ok())
                .ok_or_else(|| Error::InvalidDirective(format!("RectSolid: bad argument {i}")))
        };
        Ok(Self {
            size: DVec3::new(arg(1)?, arg(3)?, arg(2)?),
            origin: DVec3::new(arg(5)?, arg(6)?, arg(7)?),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = GridConfig::default();
        config.validate().unwrap();
        assert_eq!(config.maxstep(), IVec3::splat(100));
    }

    #[test]
    fn maxstep_survives_f32_bounds() {
        let config = GridConfig::new(DVec3::ZERO, DVec3::splat(f64::from(0.7_f32)), 0.01);
        assert_eq!(config.maxstep(), IVec3::splat(70));
        let partial = GridConfig::new(DVec3::ZERO, DVec3::new(1.05, 1.0, 1.0), 0.1);
        assert_eq!(partial.maxstep(), IVec3::new(10, 10, 10));
    }

    #[test]
    fn rejects_bad_values() {
        assert!(GridConfig::default().with_resolution(0.0).validate().is_err());
        assert!(GridConfig::default().with_resolution(f64::NAN).validate().is_err());
        assert!(GridConfig::default()
            .with_bounds(DVec3::new(1.0, -1.0, 1.0))
            .validate()
            .is_err());
        assert!(GridConfig::default().with_tile_size(0).validate().is_err());
        assert!(GridConfig::default()
            .with_bounds(DVec3::splat(0.001))
            .validate()
            .is_err());
    }

    #[test]
    fn rejects_oversized_grid() {
        let huge = GridConfig::default()
            .with_resolution(1.0)
            .with_bounds(DVec3::splat(1e7));
        assert!(matches!(huge.validate(), Err(Error::InvalidConfig(_))));
        let large = GridConfig::default()
            .with_resolution(1.0)
            .with_bounds(DVec3::splat(1500.0));
        large.validate().unwrap();
    }

    #[test]
    fn rect_solid_swaps_size_axes() {
        let stock: StockSpec = "(RectSolid 4 1 2 0 -1 -2 -3)".parse().unwrap();
        assert_eq!(stock.size, DVec3::new(4.0, 2.0, 1.0));
        assert_eq!(stock.origin, DVec3::new(-1.0, -2.0, -3.0));
        let config = stock.grid_config(0.5);
        assert_eq!(config.maxstep(), IVec3::new(8, 4, 2));
    }

    #[test]
    fn rect_solid_needs_all_arguments() {
        assert!("RectSolid 1 2 3".parse::<StockSpec>().is_err());
        assert!("FlatMill 1 2".parse::<StockSpec>().is_err());
        assert!(StockSpec::is_directive("( RectSolid 1 1 1 0 0 0 0 )"));
    }
}
