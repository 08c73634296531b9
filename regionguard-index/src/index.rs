//! The index contract.

use regionguard_geometry::Shape;
use regionguard_region::ProtectedRegion;
use regionguard_types::{BlockVector3, RegionId};
use std::sync::Arc;

use crate::error::IndexResult;
use crate::snapshot::RegionSnapshot;

/// How much of the index a query searches.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryMode {
    /// Every region.
    #[default]
    Full,
    /// Only regions marked as cache-worthy, for latency-sensitive callers.
    PreferCached,
}

/// What happens to the children of a removed region.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RemovalStrategy {
    /// Remove the whole subtree.
    #[default]
    RemoveChildren,
    /// Keep the children and clear their parent link.
    UnsetParentInChildren,
}

/// A set of regions for one world.
///
/// Query results contain only regions that match directly; ancestors are not
/// added implicitly. Results are sorted by id.
pub trait RegionIndex: Send + Sync {
    /// Regions whose shape contains `point`.
    fn query_contains(&self, point: BlockVector3) -> Vec<Arc<ProtectedRegion>>;

    /// Like [`RegionIndex::query_contains`], optionally restricted to the
    /// cached subset. Indexes without a cache search everything.
    fn query_contains_with(&self, point: BlockVector3, mode: QueryMode) -> Vec<Arc<ProtectedRegion>> {
        let _ = mode;
        self.query_contains(point)
    }

    /// Regions whose shape intersects `shape`.
    fn query_overlapping(&self, shape: &Shape) -> Vec<Arc<ProtectedRegion>>;

    fn get(&self, id: &RegionId) -> Option<Arc<ProtectedRegion>>;

    fn contains(&self, id: &RegionId) -> bool {
        self.get(id).is_some()
    }

    /// Adds or replaces a region.
    fn add(&self, region: ProtectedRegion) -> IndexResult<()>;

    /// Removes a region; a no-op returning nothing if it is absent.
    fn remove(&self, id: &RegionId, strategy: RemovalStrategy) -> Vec<Arc<ProtectedRegion>>;

    /// The current immutable view.
    fn snapshot(&self) -> Arc<RegionSnapshot>;

    fn len(&self) -> usize {
        self.snapshot().len()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
