//! Core types and math for the kerf stock-removal simulator.
//!
//! This crate provides the foundational types used by every other crate:
//! - Voxel lattice addressing (padded flat indexing)
//! - Bounding boxes and the single-axis tool rotation
//! - Tool poses consumed from toolpaths
//! - Common error types

pub mod coords;
pub mod error;
pub mod math;
pub mod types;

pub use coords::{GridDims, VoxelIndex, CUBE_CORNERS};
pub use error::{Error, Result};
pub use math::{rotate_x, Aabb};
pub use types::ToolPose;

/// Simulator-wide constants
pub mod constants {
    /// Edge length of a mesh tile in voxels
    pub const TILE_SIZE: i32 = 200;
    /// Width of the air border around the stock, in voxels per side
    pub const PADDING: i32 = 1;
    /// Largest stored lattice, border included, that a grid may allocate
    pub const MAX_GRID_VOXELS: u64 = 1 << 34;
    /// Initial vertex capacity of a tile mesh buffer
    pub const TILE_MESH_CAPACITY: usize = 2 << 14;
}
