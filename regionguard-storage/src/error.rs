//! Error types for the storage layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors raised while loading or saving regions.
///
/// None of these touch the in-memory index; a failed load or save leaves
/// the current snapshot as it was.
#[derive(Debug, Error)]
pub enum StorageError {
    /// IO error (file system).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The document was written by a format this build cannot read.
    #[error("unsupported region document version {0}")]
    UnsupportedVersion(u64),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// Identity lookup failed as a whole.
    #[error("migration error: {0}")]
    Migration(String),
}
