//! Core type definitions for regionguard.
//!
//! This crate defines the small vocabulary shared by every
//! other crate in the workspace:
//! - Region identifiers (case-insensitive, validated)
//! - Player identifiers (UUID)
//! - Integer block coordinates in two and three dimensions
//!
//! Geometry, flags and the region graph live in their own crates.

mod ids;
mod vector;

pub use ids::{PlayerId, RegionId, GLOBAL_REGION_ID};
pub use vector::{BlockVector2, BlockVector3};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),

    #[error("invalid region id: '{0}'")]
    InvalidRegionId(String),
}
