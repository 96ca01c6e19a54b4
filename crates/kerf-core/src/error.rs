//! Error types for the simulator.

use thiserror::Error;

/// Simulator-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed persisted data
    #[error("Invalid data: {0}")]
    InvalidData(String),

    /// Rejected configuration value
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Tool shape or tool number nobody knows about
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool or stock directive with missing or malformed arguments
    #[error("Invalid directive: {0}")]
    InvalidDirective(String),

    /// The simulation worker thread panicked
    #[error("Simulation worker panicked")]
    WorkerPanicked,
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;
