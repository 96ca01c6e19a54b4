//! Simulation driver for the kerf stock-removal simulator.
//!
//! Toolpaths feed tool poses to a [`Simulation`], which carves a
//! [`kerf_stock::VoxelGrid`] in time-boxed bursts on a worker thread and
//! keeps the stock surface meshed for a renderer.

pub mod backplot;
pub mod driver;
pub mod toolpath;

pub use backplot::Backplot;
pub use driver::{
    BurstReport, SimCommand, SimConfig, SimEvent, SimHandle, SimOutcome, SimState, SimStats,
    Simulation,
};
pub use toolpath::{
    parse_pose_program, Segment, SegmentedToolpath, StopPolicy, Toolpath, DEFAULT_MIN_STEP,
};
