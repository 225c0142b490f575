//! Storage error types.

use thiserror::Error;

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Opening the store failed.
    #[error("connection failed: {0}")]
    ConnectionFailed(String),

    /// A read or write against the store failed.
    #[error("query failed: {0}")]
    QueryFailed(String),

    /// Caller supplied an unusable name or key.
    #[error("invalid input: {0}")]
    InvalidInput(String),
}
