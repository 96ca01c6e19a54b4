//! Voxel stock for the kerf simulator.
//!
//! [`VoxelGrid`] tracks which voxels of the workpiece have been cut away,
//! subtracts tool volumes from it and keeps a marching-cubes surface per
//! [`Tile`] up to date. Meshes are published through [`SurfaceMesh`].

pub mod config;
pub mod grid;
pub mod persist;
pub mod surface;
pub mod tile;

pub use config::{GridConfig, StockSpec};
pub use grid::VoxelGrid;
pub use surface::{MeshBuffers, SurfaceMesh};
pub use tile::Tile;
