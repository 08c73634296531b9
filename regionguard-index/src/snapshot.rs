//! Immutable views of an index.

use regionguard_geometry::Shape;
use regionguard_region::{Actor, ProtectedRegion, RegionGraph};
use regionguard_types::{BlockVector3, RegionId};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::chunk::ChunkTable;
use crate::index::QueryMode;

/// A consistent, read-only set of regions.
///
/// Also serves as the [`RegionGraph`] for parent lookups, so a query that
/// starts on a snapshot never sees parents from a later one.
#[derive(Debug, Clone)]
pub struct RegionSnapshot {
    regions: HashMap<RegionId, Arc<ProtectedRegion>>,
    children: HashMap<RegionId, Vec<RegionId>>,
    chunks: ChunkTable,
    cached: HashSet<RegionId>,
}

impl RegionSnapshot {
    /// An empty snapshot.
    #[must_use]
    pub fn empty(max_chunk_span: u64) -> Self {
        Self::build(HashMap::new(), HashSet::new(), max_chunk_span)
    }

    pub(crate) fn build(
        regions: HashMap<RegionId, Arc<ProtectedRegion>>,
        mut cached: HashSet<RegionId>,
        max_chunk_span: u64,
    ) -> Self {
        let mut chunks = ChunkTable::new(max_chunk_span);
        let mut children: HashMap<RegionId, Vec<RegionId>> = HashMap::new();

        for (id, region) in &regions {
            chunks.insert(id, &region.bounds(), region.is_physical());
            if let Some(parent) = region.parent() {
                children.entry(parent.clone()).or_default().push(id.clone());
            }
        }
        for list in children.values_mut() {
            list.sort();
        }
        cached.retain(|id| regions.contains_key(id));

        Self {
            regions,
            children,
            chunks,
            cached,
        }
    }

    pub(crate) fn regions(&self) -> &HashMap<RegionId, Arc<ProtectedRegion>> {
        &self.regions
    }

    pub(crate) fn cached(&self) -> &HashSet<RegionId> {
        &self.cached
    }

    #[must_use]
    pub fn get(&self, id: &RegionId) -> Option<&Arc<ProtectedRegion>> {
        self.regions.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &RegionId) -> bool {
        self.regions.contains_key(id)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.regions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }

    #[must_use]
    pub fn is_cached(&self, id: &RegionId) -> bool {
        self.cached.contains(id)
    }

    /// All regions, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<ProtectedRegion>> {
        self.regions.values()
    }

    /// All regions sorted by id.
    #[must_use]
    pub fn sorted(&self) -> Vec<Arc<ProtectedRegion>> {
        let mut all: Vec<_> = self.regions.values().cloned().collect();
        all.sort_by(|a, b| a.id().cmp(b.id()));
        all
    }

    /// Direct children of `id`, sorted.
    #[must_use]
    pub fn children_of(&self, id: &RegionId) -> &[RegionId] {
        self.children.get(id).map_or(&[], Vec::as_slice)
    }

    /// Every descendant of `id`, breadth first.
    #[must_use]
    pub fn descendants_of(&self, id: &RegionId) -> Vec<RegionId> {
        let mut out = Vec::new();
        let mut seen: HashSet<&RegionId> = HashSet::new();
        let mut queue: Vec<&RegionId> = self.children_of(id).iter().collect();
        while let Some(next) = queue.pop() {
            if seen.insert(next) {
                out.push(next.clone());
                queue.extend(self.children_of(next));
            }
        }
        out
    }

    fn admit(&self, id: &RegionId, mode: QueryMode) -> bool {
        mode == QueryMode::Full || self.cached.contains(id)
    }

    fn collect<'a>(&self, ids: impl IntoIterator<Item = &'a RegionId>, keep: impl Fn(&ProtectedRegion) -> bool) -> Vec<Arc<ProtectedRegion>> {
        let mut seen = HashSet::new();
        let mut out: Vec<Arc<ProtectedRegion>> = ids
            .into_iter()
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.regions.get(id))
            .filter(|r| keep(r))
            .cloned()
            .collect();
        out.sort_by(|a, b| a.id().cmp(b.id()));
        out
    }

    /// Regions containing `point`, sorted by id.
    #[must_use]
    pub fn query_contains(&self, point: BlockVector3, mode: QueryMode) -> Vec<Arc<ProtectedRegion>> {
        self.collect(
            self.chunks.at(point).filter(|id| self.admit(id, mode)),
            |r| r.contains(point),
        )
    }

    /// Regions intersecting `shape`, sorted by id.
    #[must_use]
    pub fn query_overlapping(&self, shape: &Shape, mode: QueryMode) -> Vec<Arc<ProtectedRegion>> {
        let keep = |r: &ProtectedRegion| r.shape().intersects(shape);
        let candidates = if shape.is_physical() {
            self.chunks.within(&shape.bounds())
        } else {
            None
        };
        match candidates {
            Some(ids) => self.collect(ids.into_iter().filter(|id| self.admit(id, mode)), keep),
            None => self.collect(self.regions.keys().filter(|id| self.admit(id, mode)), keep),
        }
    }

    /// Number of regions listing `actor` directly among their owners.
    #[must_use]
    pub fn region_count_of_player(&self, actor: &dyn Actor) -> usize {
        self.regions.values().filter(|r| r.owners().contains(actor)).count()
    }

    /// True if `shape` overlaps a physical region that does not list `actor`
    /// among its own owners.
    #[must_use]
    pub fn overlaps_unowned_region(&self, shape: &Shape, actor: &dyn Actor) -> bool {
        self.query_overlapping(shape, QueryMode::Full)
            .iter()
            .any(|r| r.is_physical() && !r.owners().contains(actor))
    }
}

impl RegionGraph for RegionSnapshot {
    fn region(&self, id: &RegionId) -> Option<&ProtectedRegion> {
        self.regions.get(id).map(AsRef::as_ref)
    }
}
