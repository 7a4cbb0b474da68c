//! Error types for convoy-store

use thiserror::Error;

/// Result type for store operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Store error type.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Document serialization failed
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// Domain-level rejection from convoy-core
    #[error(transparent)]
    Domain(#[from] convoy_core::Error),
}
