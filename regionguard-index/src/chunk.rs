//! Chunk bucketing.
//!
//! The world is cut into 16×16 block columns. Small regions are listed in
//! every column they touch so point queries only look at one bucket.

use regionguard_geometry::Aabb;
use regionguard_types::{BlockVector3, RegionId};
use std::collections::HashMap;

pub(crate) type ChunkPos = (i32, i32);

#[must_use]
pub(crate) const fn chunk_of(p: BlockVector3) -> ChunkPos {
    (p.x >> 4, p.z >> 4)
}

/// Inclusive chunk range covered by a bounding box.
#[derive(Debug, Clone, Copy)]
pub(crate) struct ChunkRange {
    min: ChunkPos,
    max: ChunkPos,
}

impl ChunkRange {
    pub(crate) const fn of(bounds: &Aabb) -> Self {
        Self {
            min: chunk_of(bounds.min),
            max: chunk_of(bounds.max),
        }
    }

    /// Number of chunks covered.
    pub(crate) fn span(&self) -> u64 {
        let dx = (i64::from(self.max.0) - i64::from(self.min.0) + 1).unsigned_abs();
        let dz = (i64::from(self.max.1) - i64::from(self.min.1) + 1).unsigned_abs();
        dx.saturating_mul(dz)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = ChunkPos> + '_ {
        (self.min.0..=self.max.0).flat_map(move |x| (self.min.1..=self.max.1).map(move |z| (x, z)))
    }
}

/// Region ids per chunk, plus the regions too large (or unbounded) to bucket.
#[derive(Debug, Default, Clone)]
pub(crate) struct ChunkTable {
    buckets: HashMap<ChunkPos, Vec<RegionId>>,
    unbucketed: Vec<RegionId>,
    max_span: u64,
}

impl ChunkTable {
    pub(crate) fn new(max_span: u64) -> Self {
        Self {
            max_span,
            ..Self::default()
        }
    }

    pub(crate) fn insert(&mut self, id: &RegionId, bounds: &Aabb, physical: bool) {
        let range = ChunkRange::of(bounds);
        if !physical || range.span() > self.max_span {
            self.unbucketed.push(id.clone());
            return;
        }
        for pos in range.iter() {
            self.buckets.entry(pos).or_default().push(id.clone());
        }
    }

    /// Candidates for a point query.
    pub(crate) fn at(&self, point: BlockVector3) -> impl Iterator<Item = &RegionId> {
        self.buckets
            .get(&chunk_of(point))
            .into_iter()
            .flatten()
            .chain(&self.unbucketed)
    }

    /// Candidates for an area query, or `None` if the area is so large that
    /// a full scan is cheaper. May yield duplicates.
    pub(crate) fn within(&self, bounds: &Aabb) -> Option<Vec<&RegionId>> {
        let range = ChunkRange::of(bounds);
        if range.span() > self.max_span.saturating_mul(4) {
            return None;
        }
        let mut out: Vec<&RegionId> = range
            .iter()
            .filter_map(|pos| self.buckets.get(&pos))
            .flatten()
            .collect();
        out.extend(&self.unbucketed);
        Some(out)
    }
}
