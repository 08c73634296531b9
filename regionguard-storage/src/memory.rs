//! A driver that keeps regions in memory.

use parking_lot::Mutex;
use regionguard_index::{RegionDifference, RegionSnapshot};
use regionguard_region::ProtectedRegion;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use crate::driver::RegionDriver;
use crate::error::StorageResult;

/// In-memory store, for tests and hosts without persistence.
#[derive(Debug, Default)]
pub struct MemoryRegionDriver {
    regions: Mutex<BTreeMap<String, ProtectedRegion>>,
    saves: AtomicUsize,
}

impl MemoryRegionDriver {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that already holds `regions`.
    #[must_use]
    pub fn with_regions(regions: impl IntoIterator<Item = ProtectedRegion>) -> Self {
        let driver = Self::new();
        driver
            .regions
            .lock()
            .extend(regions.into_iter().map(|r| (r.id().to_string(), r)));
        driver
    }

    /// Number of completed saves, full or partial.
    #[must_use]
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl RegionDriver for MemoryRegionDriver {
    fn load_all(&self) -> StorageResult<Vec<ProtectedRegion>> {
        Ok(self.regions.lock().values().cloned().collect())
    }

    fn save_all(&self, regions: &[Arc<ProtectedRegion>]) -> StorageResult<()> {
        let mut stored = self.regions.lock();
        stored.clear();
        stored.extend(regions.iter().map(|r| (r.id().to_string(), ProtectedRegion::clone(r))));
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn save_changes(&self, changes: &RegionDifference, _snapshot: &RegionSnapshot) -> StorageResult<()> {
        let mut stored = self.regions.lock();
        for id in &changes.removed {
            stored.remove(id.as_str());
        }
        for region in &changes.changed {
            stored.insert(region.id().to_string(), ProtectedRegion::clone(region));
        }
        self.saves.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn describe(&self) -> String {
        "memory".to_string()
    }
}
