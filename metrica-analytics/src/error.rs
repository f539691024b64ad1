//! Error types for analytics evaluation.

use thiserror::Error;

/// Result type for analytics operations.
pub type Result<T> = std::result::Result<T, AnalyticsError>;

/// Errors that can occur while evaluating a visualization.
///
/// An empty cache lookup is not an error; it is reported as `Ok(None)`.
#[derive(Debug, Error)]
pub enum AnalyticsError {
    /// Database error from libSQL.
    #[error("database error: {0}")]
    Database(#[from] libsql::Error),

    /// JSON serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data in the cache store.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The indicator value source failed.
    #[error("value source error: {0}")]
    Source(String),

    /// I/O error preparing a store location.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}
