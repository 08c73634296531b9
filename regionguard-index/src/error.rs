//! Error types for index mutations.

use regionguard_region::RegionError;
use regionguard_types::RegionId;
use thiserror::Error;

/// Result type for index operations.
pub type IndexResult<T> = Result<T, IndexError>;

/// Errors returned by mutation entry points. Queries never fail.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum IndexError {
    /// No region with this id exists in the index.
    #[error("region not found: {0}")]
    NotFound(RegionId),

    /// The requested parent is not in the index.
    #[error("parent '{parent}' of region '{region}' does not exist")]
    MissingParent { region: RegionId, parent: RegionId },

    /// The region itself rejected the change.
    #[error(transparent)]
    Region(#[from] RegionError),
}
