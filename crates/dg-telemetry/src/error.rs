//! Error types for sink operations.

use thiserror::Error;

/// Errors a sink write or sink open can return.
#[derive(Error, Debug)]
pub enum SinkError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Arrow record batch construction error
    #[error("Arrow error: {0}")]
    Arrow(#[from] arrow::error::ArrowError),

    /// Parquet encoding error
    #[error("Parquet error: {0}")]
    Parquet(#[from] parquet::errors::ParquetError),

    /// Sink spec could not be parsed
    #[error("invalid sink spec '{0}' (expected memory, jsonl:<path>, sqlite:<path>, or parquet:<dir>)")]
    InvalidSpec(String),

    /// Sink refused the write
    #[error("write rejected: {0}")]
    Rejected(String),

    /// Sink implementation panicked during a write
    #[error("sink panicked: {0}")]
    Panicked(String),
}

impl From<SinkError> for dg_common::Error {
    fn from(err: SinkError) -> Self {
        match err {
            SinkError::InvalidSpec(_) => dg_common::Error::Config(err.to_string()),
            other => dg_common::Error::SinkUnavailable(other.to_string()),
        }
    }
}

impl SinkError {
    /// Short label for logs and counters.
    pub fn kind(&self) -> &'static str {
        match self {
            SinkError::Io(_) => "io",
            SinkError::Json(_) => "json",
            SinkError::Sqlite(_) => "sqlite",
            SinkError::Arrow(_) => "arrow",
            SinkError::Parquet(_) => "parquet",
            SinkError::InvalidSpec(_) => "invalid_spec",
            SinkError::Rejected(_) => "rejected",
            SinkError::Panicked(_) => "panicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_spec_is_a_config_error() {
        let err = dg_common::Error::from(SinkError::InvalidSpec("ftp:x".into()));
        assert_eq!(err.code(), 10);
        let err = dg_common::Error::from(SinkError::Rejected("full".into()));
        assert_eq!(err.code(), 20);
        assert_eq!(err.to_string(), "sink unavailable: write rejected: full");
    }
}
