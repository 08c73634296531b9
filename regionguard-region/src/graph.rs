//! Parent links between regions.
//!
//! Regions refer to their parent by id; whoever holds the full set of
//! regions (normally an index snapshot) implements [`RegionGraph`] so that
//! parent chains can be walked.

use regionguard_types::RegionId;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::hash::BuildHasher;
use std::sync::Arc;

use crate::error::{RegionError, RegionResult};
use crate::region::ProtectedRegion;

/// Id → region lookup used to resolve parent links.
pub trait RegionGraph {
    fn region(&self, id: &RegionId) -> Option<&ProtectedRegion>;
}

impl<S: BuildHasher> RegionGraph for HashMap<RegionId, ProtectedRegion, S> {
    fn region(&self, id: &RegionId) -> Option<&ProtectedRegion> {
        self.get(id)
    }
}

impl<S: BuildHasher> RegionGraph for HashMap<RegionId, Arc<ProtectedRegion>, S> {
    fn region(&self, id: &RegionId) -> Option<&ProtectedRegion> {
        self.get(id).map(AsRef::as_ref)
    }
}

impl RegionGraph for BTreeMap<RegionId, ProtectedRegion> {
    fn region(&self, id: &RegionId) -> Option<&ProtectedRegion> {
        self.get(id)
    }
}

/// Iterator over a region's parent, grandparent and so on.
///
/// Stops at a missing parent, and stops on a repeated id so that a corrupt
/// graph can never loop forever.
pub struct Ancestors<'g, G: ?Sized> {
    graph: &'g G,
    next: Option<RegionId>,
    seen: HashSet<RegionId>,
}

impl<'g, G: RegionGraph + ?Sized> Iterator for Ancestors<'g, G> {
    type Item = &'g ProtectedRegion;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next.take()?;
        if !self.seen.insert(id.clone()) {
            return None;
        }
        let region = self.graph.region(&id)?;
        self.next = region.parent().cloned();
        Some(region)
    }
}

/// Walks the ancestors of `region`, nearest first.
pub fn ancestors<'g, G: RegionGraph + ?Sized>(graph: &'g G, region: &ProtectedRegion) -> Ancestors<'g, G> {
    let mut seen = HashSet::new();
    seen.insert(region.id().clone());
    Ancestors {
        graph,
        next: region.parent().cloned(),
        seen,
    }
}

/// Checks that making `parent` the parent of `child` keeps the graph acyclic.
pub fn check_parent<G: RegionGraph + ?Sized>(graph: &G, child: &RegionId, parent: &RegionId) -> RegionResult<()> {
    let cycle = || RegionError::CircularInheritance {
        child: child.clone(),
        parent: parent.clone(),
    };

    if child == parent {
        return Err(cycle());
    }

    let mut current = graph.region(parent);
    let mut steps = 0usize;
    while let Some(region) = current {
        if region.id() == child {
            return Err(cycle());
        }
        steps += 1;
        // a pre-existing loop that does not involve `child`
        if steps > 1 << 16 {
            return Err(cycle());
        }
        current = region.parent().and_then(|p| graph.region(p));
    }
    Ok(())
}
