//! Storage error types.

use thiserror::Error;

/// Errors raised inside the durable store. They never leave its public API;
/// callers see a `bool` or `Option` and the error is logged.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Import payload was blank.
    #[error("Import payload is empty")]
    Empty,

    /// Import payload exceeded the byte ceiling.
    #[error("Import payload too large: {size} bytes (limit {limit})")]
    TooLarge { size: usize, limit: usize },

    /// Import payload held too many tasks.
    #[error("Import has too many tasks: {count} (limit {limit})")]
    TooManyTasks { count: usize, limit: usize },
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;
