//! Region persistence for regionguard.
//!
//! The engine never touches storage on the query path. Hosts load and save
//! through a [`RegionDriver`]:
//!
//! - [`JsonRegionDriver`] keeps one JSON document per world and reads older
//!   document versions through an adapter at the boundary
//! - [`MemoryRegionDriver`] keeps regions in memory
//!
//! [`UuidMigration`] rewrites name-based owners and members to unique ids.

mod driver;
mod error;
mod json;
mod memory;
mod migration;
mod record;

pub use driver::RegionDriver;
pub use error::{StorageError, StorageResult};
pub use json::{JsonRegionDriver, FORMAT_VERSION};
pub use memory::MemoryRegionDriver;
pub use migration::{MigrationReport, ProfileResolver, UnresolvedIdentity, UuidMigration, RESOLVE_BATCH_SIZE};
pub use record::{DomainRecord, RegionRecord};
