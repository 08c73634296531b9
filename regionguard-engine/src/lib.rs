//! Host-facing entry point for regionguard.
//!
//! A host builds one [`GuardContext`] at start-up, registering any extra
//! flags and custom domain types before the registries are locked, and then
//! loads a [`RegionManager`] per world. Queries go through the manager's
//! [`ApplicableRegionSet`]s; persistence runs only when the host asks for it.

mod config;
mod context;
mod error;
pub mod logging;
mod manager;

pub use config::{ConfigError, EngineConfig, RegionsConfig, StorageConfig};
pub use context::{GuardContext, GuardContextBuilder};
pub use error::{EngineError, EngineResult};
pub use manager::RegionManager;

pub use regionguard_query::ApplicableRegionSet;
