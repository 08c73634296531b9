//! Error types for the engine layer.

use regionguard_flags::FlagError;
use regionguard_index::IndexError;
use regionguard_region::RegionError;
use regionguard_storage::StorageError;
use regionguard_types::RegionId;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors returned by the context and region managers.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Flag(#[from] FlagError),

    #[error(transparent)]
    Region(#[from] RegionError),

    #[error("unknown flag: {0}")]
    UnknownFlag(String),

    #[error("world not loaded: {0}")]
    UnknownWorld(String),

    #[error("invalid world name: '{0}'")]
    InvalidWorldName(String),

    /// The actor already owns as many regions as the config allows.
    #[error("region limit reached ({limit} regions)")]
    RegionLimit { limit: usize },

    /// A claim uses an id that is already taken.
    #[error("region '{0}' already exists")]
    RegionExists(RegionId),

    /// A claim overlaps a region the actor does not own.
    #[error("region '{0}' overlaps a region owned by someone else")]
    OverlapsUnownedRegion(RegionId),

    /// A blocking task panicked or was cancelled.
    #[error("background task failed: {0}")]
    Task(String),
}
