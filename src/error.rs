//! Error types shared across the crate

use thiserror::Error;

/// Reasons a course cannot be built.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MapError {
    /// The requested tier is not one of `easy`, `normal` or `hard`.
    #[error("invalid mode '{0}' (expected easy, normal or hard)")]
    InvalidMode(String),
    /// Canvas dimensions must be finite and positive.
    #[error("invalid canvas size {width}x{height}")]
    InvalidCanvas { width: f32, height: f32 },
}

/// Failures reading or writing persisted values.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No backing store is available (private browsing, no window).
    #[error("storage is unavailable")]
    Unavailable,
    /// The store refused the write, usually a quota problem.
    #[error("storage rejected write for key '{0}'")]
    WriteRejected(String),
    #[error("could not encode value: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Rejected tuning files.
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("could not parse tuning: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("tuning value '{field}' out of range: {value}")]
    OutOfRange { field: &'static str, value: f64 },
}
