//! Error types for the data generator workspace.

use thiserror::Error;

/// Unified error type surfaced by the CLI.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors (10-19)
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    // Sink errors (20-29)
    #[error("sink unavailable: {0}")]
    SinkUnavailable(String),

    // Worker errors (30-39)
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: u32, message: String },

    #[error("failed to spawn worker thread: {0}")]
    Spawn(String),

    // Output errors (60-69)
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Reported as `error.code` in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::Config(_) => 10,
            Error::InvalidArgument(_) => 11,
            Error::SinkUnavailable(_) => 20,
            Error::WorkerPanicked { .. } => 30,
            Error::Spawn(_) => 31,
            Error::Json(_) => 60,
        }
    }
}
