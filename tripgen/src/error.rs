//! Error types for tripgen

use crate::services::GeocodeError;
use thiserror::Error;

/// Pipeline error type
///
/// Per-record failures never reach this type; they are logged and absorbed
/// where they occur. Only run-level failures are reported here.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Geocoding client could not be created
    #[error("Geocoder error: {0}")]
    Geocoder(#[from] GeocodeError),

    /// A pipeline task panicked or was aborted
    #[error("Task failed: {0}")]
    TaskFailed(String),
}

impl From<tokio::task::JoinError> for PipelineError {
    fn from(err: tokio::task::JoinError) -> Self {
        PipelineError::TaskFailed(err.to_string())
    }
}

/// Result type for pipeline operations
pub type PipelineResult<T> = Result<T, PipelineError>;
