//! Error types for region mutation.

use regionguard_flags::FlagError;
use regionguard_types::RegionId;
use thiserror::Error;

/// Result type for region operations.
pub type RegionResult<T> = Result<T, RegionError>;

/// Errors that can occur while mutating a region.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RegionError {
    /// The new parent is the region itself or one of its descendants.
    #[error("setting parent of '{child}' to '{parent}' would create a cycle")]
    CircularInheritance { child: RegionId, parent: RegionId },

    /// A custom domain type was registered twice.
    #[error("domain type already registered: {0}")]
    DuplicateRegistration(String),

    /// No factory is registered for a persisted custom domain.
    #[error("unknown domain type: {0}")]
    UnknownDomainType(String),

    /// A flag value could not be marshalled.
    #[error("flag error: {0}")]
    Flag(#[from] FlagError),
}
