//! Error types for convoy-sched

use thiserror::Error;

/// Result type for scheduling operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Scheduling error type.
#[derive(Debug, Error)]
pub enum Error {
    /// Domain-level rejection
    #[error(transparent)]
    Domain(#[from] convoy_core::Error),

    /// Persistence failure
    #[error(transparent)]
    Store(#[from] convoy_store::Error),
}
