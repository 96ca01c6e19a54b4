//! Voxel storage primitives for the kerf simulator.
//!
//! - [`VoxelBits`]: one bit per padded voxel, packed MSB-first
//! - [`tables`] and [`cases`]: marching-cubes configuration data

pub mod bits;
pub mod cases;
pub mod tables;

pub use bits::VoxelBits;
pub use cases::{case_table, cube_config, CaseTable, CubeCase};
