//! The persistence contract.

use regionguard_index::{RegionDifference, RegionSnapshot};
use regionguard_region::ProtectedRegion;
use std::sync::Arc;

use crate::error::StorageResult;

/// Loads and saves the regions of one world.
///
/// Drivers are called by the host outside the query path and may block.
pub trait RegionDriver: Send + Sync {
    /// Reads every region with parent links restored.
    ///
    /// Individual records that cannot be read are logged and skipped; only
    /// failures of the store as a whole are errors.
    fn load_all(&self) -> StorageResult<Vec<ProtectedRegion>>;

    /// Replaces the stored set with `regions`.
    fn save_all(&self, regions: &[Arc<ProtectedRegion>]) -> StorageResult<()>;

    /// Persists the regions changed since the last save.
    ///
    /// Stores that cannot write partial updates rewrite everything from
    /// `snapshot`, which is the default.
    fn save_changes(&self, changes: &RegionDifference, snapshot: &RegionSnapshot) -> StorageResult<()> {
        let _ = changes;
        self.save_all(&snapshot.sorted())
    }

    /// Short description for log lines.
    fn describe(&self) -> String;
}
