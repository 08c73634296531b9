//! Copy-on-write region index.

use parking_lot::{Mutex, RwLock};
use regionguard_flags::{Flag, FlagValue, RegionGroup};
use regionguard_geometry::Shape;
use regionguard_region::{check_parent, ProtectedRegion};
use regionguard_types::{BlockVector3, RegionId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::error::{IndexError, IndexResult};
use crate::index::{QueryMode, RegionIndex, RemovalStrategy};
use crate::snapshot::RegionSnapshot;

/// Regions spanning more chunks than this are scanned on every query
/// instead of being bucketed.
pub const DEFAULT_MAX_CHUNK_SPAN: u64 = 1024;

/// Regions changed or removed since the last save.
#[derive(Debug, Clone, Default)]
pub struct RegionDifference {
    pub changed: Vec<Arc<ProtectedRegion>>,
    pub removed: Vec<RegionId>,
}

impl RegionDifference {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.changed.is_empty() && self.removed.is_empty()
    }
}

#[derive(Debug, Default)]
struct ChangeLog {
    changed: HashSet<RegionId>,
    removed: HashSet<RegionId>,
}

impl ChangeLog {
    fn touch(&mut self, id: &RegionId) {
        self.removed.remove(id);
        self.changed.insert(id.clone());
    }

    fn drop_region(&mut self, id: &RegionId) {
        self.changed.remove(id);
        self.removed.insert(id.clone());
    }

    fn merge(&mut self, other: ChangeLog) {
        for id in other.removed {
            self.drop_region(&id);
        }
        for id in other.changed {
            self.touch(&id);
        }
    }
}

/// Working copy handed to a mutation.
struct Draft<'a> {
    base: &'a RegionSnapshot,
    regions: HashMap<RegionId, Arc<ProtectedRegion>>,
    cached: HashSet<RegionId>,
    log: ChangeLog,
}

impl Draft<'_> {
    fn region_mut(&mut self, id: &RegionId) -> IndexResult<&mut ProtectedRegion> {
        let region = self
            .regions
            .get_mut(id)
            .ok_or_else(|| IndexError::NotFound(id.clone()))?;
        self.log.touch(id);
        Ok(Arc::make_mut(region))
    }

    /// Adds or replaces a region after checking its parent link.
    fn insert(&mut self, region: ProtectedRegion) -> IndexResult<()> {
        let id = region.id().clone();
        if let Some(parent) = region.parent() {
            self.require_parent(&id, parent)?;
            check_parent(self.base, &id, parent)?;
        }
        debug!(region = %id, "adding region");
        self.regions.insert(id.clone(), Arc::new(region));
        self.log.touch(&id);
        Ok(())
    }

    fn require_parent(&self, region: &RegionId, parent: &RegionId) -> IndexResult<()> {
        if self.regions.contains_key(parent) {
            Ok(())
        } else {
            Err(IndexError::MissingParent {
                region: region.clone(),
                parent: parent.clone(),
            })
        }
    }
}

/// A region index safe for concurrent readers.
///
/// Readers take a cheap `Arc` clone of the current snapshot. Writers are
/// serialised, build the next snapshot off to the side and publish it with
/// a single pointer swap.
pub struct ConcurrentRegionIndex {
    current: RwLock<Arc<RegionSnapshot>>,
    writer: Mutex<ChangeLog>,
    max_chunk_span: u64,
}

impl Default for ConcurrentRegionIndex {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_CHUNK_SPAN)
    }
}

impl ConcurrentRegionIndex {
    #[must_use]
    pub fn new(max_chunk_span: u64) -> Self {
        Self {
            current: RwLock::new(Arc::new(RegionSnapshot::empty(max_chunk_span))),
            writer: Mutex::new(ChangeLog::default()),
            max_chunk_span,
        }
    }

    fn mutate<R>(&self, f: impl FnOnce(&mut Draft<'_>) -> IndexResult<R>) -> IndexResult<R> {
        self.try_mutate(f)
    }

    /// Runs a mutation against a copy of the current snapshot and publishes
    /// the result. Nothing is published if `f` fails.
    fn try_mutate<R, E: From<IndexError>>(&self, f: impl FnOnce(&mut Draft<'_>) -> Result<R, E>) -> Result<R, E> {
        let mut log = self.writer.lock();
        let base = self.snapshot();
        let mut draft = Draft {
            base: &base,
            regions: base.regions().clone(),
            cached: base.cached().clone(),
            log: ChangeLog::default(),
        };

        let out = f(&mut draft)?;

        let Draft {
            regions,
            cached,
            log: delta,
            ..
        } = draft;
        let next = RegionSnapshot::build(regions, cached, self.max_chunk_span);
        *self.current.write() = Arc::new(next);
        log.merge(delta);
        Ok(out)
    }

    /// Reparents a region, or clears its parent with `None`.
    pub fn set_parent(&self, id: &RegionId, parent: Option<RegionId>) -> IndexResult<()> {
        self.mutate(|draft| {
            if let Some(parent) = &parent {
                draft.require_parent(id, parent)?;
            }
            let base = draft.base;
            draft.region_mut(id)?.set_parent(parent, base)?;
            Ok(())
        })
    }

    pub fn set_priority(&self, id: &RegionId, priority: i32) -> IndexResult<()> {
        self.mutate(|draft| {
            draft.region_mut(id)?.set_priority(priority);
            Ok(())
        })
    }

    /// Sets or clears a flag value on a region.
    pub fn set_flag(&self, id: &RegionId, flag: &Flag, value: Option<FlagValue>) -> IndexResult<()> {
        self.mutate(|draft| {
            draft.region_mut(id)?.set_flag(flag, value)?;
            Ok(())
        })
    }

    /// Sets or clears the `-group` sub-setting of a flag on a region.
    pub fn set_group(&self, id: &RegionId, flag: &Flag, group: Option<RegionGroup>) -> IndexResult<()> {
        self.mutate(|draft| {
            draft.region_mut(id)?.set_group(flag, group);
            Ok(())
        })
    }

    /// Applies an arbitrary edit to one region.
    ///
    /// A changed parent link is validated like [`Self::set_parent`].
    pub fn update<R>(&self, id: &RegionId, edit: impl FnOnce(&mut ProtectedRegion) -> R) -> IndexResult<R> {
        self.mutate(|draft| {
            let region = draft.region_mut(id)?;
            let before = region.parent().cloned();
            let out = edit(region);
            let after = region.parent().cloned();
            if after != before {
                if let Some(parent) = &after {
                    draft.require_parent(id, parent)?;
                    check_parent(draft.base, id, parent)?;
                }
            }
            Ok(out)
        })
    }

    /// Adds a region if `check` accepts it against the current snapshot.
    ///
    /// The check and the insert run under the writer lock, so no other
    /// mutation can slip in between them. Nothing is published if either
    /// fails.
    pub fn add_checked<E: From<IndexError>>(
        &self,
        region: ProtectedRegion,
        check: impl FnOnce(&RegionSnapshot, &ProtectedRegion) -> Result<(), E>,
    ) -> Result<(), E> {
        self.try_mutate(|draft| {
            check(draft.base, &region)?;
            draft.insert(region)?;
            Ok(())
        })
    }

    /// Marks a region as part of the cached subset searched by
    /// [`QueryMode::PreferCached`].
    pub fn set_cached(&self, id: &RegionId, cached: bool) -> IndexResult<()> {
        self.mutate(|draft| {
            if !draft.regions.contains_key(id) {
                return Err(IndexError::NotFound(id.clone()));
            }
            if cached {
                draft.cached.insert(id.clone());
            } else {
                draft.cached.remove(id);
            }
            Ok(())
        })
    }

    /// Replaces every region at once, as after a reload.
    ///
    /// The new set is repaired before it becomes visible: links to missing
    /// parents are cleared, and each parent cycle is broken at the link that
    /// closes it. Pending changes are discarded. Returns the number of links
    /// that had to be cleared.
    pub fn replace_all(&self, regions: impl IntoIterator<Item = ProtectedRegion>) -> usize {
        let mut map: HashMap<RegionId, Arc<ProtectedRegion>> = HashMap::new();
        for region in regions {
            if let Some(old) = map.insert(region.id().clone(), Arc::new(region)) {
                warn!(region = %old.id(), "duplicate region id in load, keeping the last one");
            }
        }

        let mut repaired = 0;
        let mut ids: Vec<RegionId> = map.keys().cloned().collect();
        ids.sort();

        for id in &ids {
            let missing = map[id].parent().filter(|p| !map.contains_key(*p)).cloned();
            if let Some(parent) = missing {
                warn!(region = %id, parent = %parent, "unlinking region from missing parent");
                if let Some(region) = map.get_mut(id) {
                    Arc::make_mut(region).clear_parent();
                }
                repaired += 1;
            }
        }

        let mut done: HashSet<RegionId> = HashSet::new();
        for start in &ids {
            let mut path: Vec<RegionId> = Vec::new();
            let mut on_path: HashSet<RegionId> = HashSet::new();
            let mut cursor = Some(start.clone());
            while let Some(id) = cursor {
                if done.contains(&id) {
                    break;
                }
                if !on_path.insert(id.clone()) {
                    if let Some(closer) = path.last() {
                        warn!(region = %closer, parent = %id, "breaking circular parent link");
                        if let Some(region) = map.get_mut(closer) {
                            Arc::make_mut(region).clear_parent();
                        }
                        repaired += 1;
                    }
                    break;
                }
                path.push(id.clone());
                cursor = map.get(&id).and_then(|r| r.parent().cloned());
            }
            done.extend(path);
        }

        let mut log = self.writer.lock();
        let cached = self.snapshot().cached().clone();
        let next = RegionSnapshot::build(map, cached, self.max_chunk_span);
        let count = next.len();
        *self.current.write() = Arc::new(next);
        *log = ChangeLog::default();
        info!(regions = count, repaired, "region set replaced");
        repaired
    }

    /// Returns and clears the set of regions changed since the last call.
    pub fn take_changes(&self) -> RegionDifference {
        let mut log = self.writer.lock();
        let snapshot = self.snapshot();
        let taken = std::mem::take(&mut *log);

        let mut changed: Vec<_> = taken
            .changed
            .iter()
            .filter_map(|id| snapshot.get(id).cloned())
            .collect();
        changed.sort_by(|a, b| a.id().cmp(b.id()));
        let mut removed: Vec<_> = taken.removed.into_iter().collect();
        removed.sort();

        RegionDifference { changed, removed }
    }

    /// Puts a difference back after a failed save. Newer changes win.
    pub fn requeue_changes(&self, difference: &RegionDifference) {
        let mut log = self.writer.lock();
        for region in &difference.changed {
            if !log.removed.contains(region.id()) {
                log.changed.insert(region.id().clone());
            }
        }
        for id in &difference.removed {
            if !log.changed.contains(id) {
                log.removed.insert(id.clone());
            }
        }
    }

    /// True if there are unsaved changes.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        let log = self.writer.lock();
        !log.changed.is_empty() || !log.removed.is_empty()
    }
}

impl RegionIndex for ConcurrentRegionIndex {
    fn query_contains(&self, point: BlockVector3) -> Vec<Arc<ProtectedRegion>> {
        self.snapshot().query_contains(point, QueryMode::Full)
    }

    fn query_contains_with(&self, point: BlockVector3, mode: QueryMode) -> Vec<Arc<ProtectedRegion>> {
        self.snapshot().query_contains(point, mode)
    }

    fn query_overlapping(&self, shape: &Shape) -> Vec<Arc<ProtectedRegion>> {
        self.snapshot().query_overlapping(shape, QueryMode::Full)
    }

    fn get(&self, id: &RegionId) -> Option<Arc<ProtectedRegion>> {
        self.snapshot().get(id).cloned()
    }

    fn contains(&self, id: &RegionId) -> bool {
        self.snapshot().contains(id)
    }

    /// Adds a region, replacing any region with the same id.
    ///
    /// The parent must already be indexed and must not be a descendant of
    /// the region. Children of a replaced region stay linked to it.
    fn add(&self, region: ProtectedRegion) -> IndexResult<()> {
        self.mutate(|draft| draft.insert(region))
    }

    fn remove(&self, id: &RegionId, strategy: RemovalStrategy) -> Vec<Arc<ProtectedRegion>> {
        let removed = self.mutate(|draft| {
            let Some(region) = draft.regions.remove(id) else {
                return Ok(Vec::new());
            };
            draft.log.drop_region(id);
            let mut removed = vec![region];

            match strategy {
                RemovalStrategy::RemoveChildren => {
                    for child in draft.base.descendants_of(id) {
                        if let Some(r) = draft.regions.remove(&child) {
                            draft.log.drop_region(&child);
                            removed.push(r);
                        }
                    }
                }
                RemovalStrategy::UnsetParentInChildren => {
                    for child in draft.base.children_of(id) {
                        if let Some(r) = draft.regions.get_mut(child) {
                            Arc::make_mut(r).clear_parent();
                            draft.log.touch(child);
                        }
                    }
                }
            }
            Ok(removed)
        });

        let removed = removed.unwrap_or_default();
        if !removed.is_empty() {
            debug!(region = %id, count = removed.len(), "removed regions");
        }
        removed
    }

    fn snapshot(&self) -> Arc<RegionSnapshot> {
        Arc::clone(&self.current.read())
    }
}

impl std::fmt::Debug for ConcurrentRegionIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConcurrentRegionIndex")
            .field("regions", &self.snapshot().len())
            .field("max_chunk_span", &self.max_chunk_span)
            .finish()
    }
}
