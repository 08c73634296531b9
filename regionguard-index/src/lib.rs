//! Spatial index of protected regions.
//!
//! [`ConcurrentRegionIndex`] holds an immutable [`RegionSnapshot`] behind an
//! `Arc`. Queries clone the `Arc` and run lock-free against it; every
//! mutation builds a new snapshot, validates it, and swaps it in, so readers
//! always see either the old or the new set of regions in full.

mod chunk;
mod concurrent;
mod error;
mod index;
mod snapshot;

pub use concurrent::{ConcurrentRegionIndex, RegionDifference, DEFAULT_MAX_CHUNK_SPAN};
pub use error::{IndexError, IndexResult};
pub use index::{QueryMode, RegionIndex, RemovalStrategy};
pub use snapshot::RegionSnapshot;
