//! Normative ordering of applicable regions.
//!
//! The order must put every descendant strictly before its ancestors while
//! otherwise ranking by priority. A child therefore inherits the strength of
//! its strongest applicable ancestor: its *effective priority* is the
//! maximum of its own priority and those of its ancestors in the set.
//!
//! Sorting by effective priority (descending), then depth (deepest first),
//! then own priority, then id gives a total, deterministic order in which:
//! - a descendant never follows an ancestor, since its effective priority is
//!   at least the ancestor's and its depth is strictly greater
//! - unrelated regions are ranked by priority, ties broken by id

use regionguard_region::{ancestors, ProtectedRegion, RegionGraph};
use regionguard_types::RegionId;
use std::cmp::Reverse;
use std::collections::HashMap;
use std::sync::Arc;

/// A region with the priority it is evaluated at.
#[derive(Debug, Clone)]
pub struct OrderedRegion {
    pub region: Arc<ProtectedRegion>,
    pub effective_priority: i32,
}

/// Sorts `regions` into normative order.
///
/// Duplicate ids are collapsed. Parent links are resolved through `graph`,
/// so ancestors that are not themselves in `regions` still count towards
/// depth but not towards effective priority.
#[must_use]
pub fn normative_order<G: RegionGraph + ?Sized>(regions: &[Arc<ProtectedRegion>], graph: &G) -> Vec<OrderedRegion> {
    let by_id: HashMap<&RegionId, &Arc<ProtectedRegion>> = regions.iter().map(|r| (r.id(), r)).collect();

    let mut keyed: Vec<(i32, usize, OrderedRegion)> = by_id
        .values()
        .map(|region| {
            let mut effective = region.priority();
            let mut depth = 0usize;
            for ancestor in ancestors(graph, region) {
                depth += 1;
                if let Some(member) = by_id.get(ancestor.id()) {
                    effective = effective.max(member.priority());
                }
            }
            (
                region.priority(),
                depth,
                OrderedRegion {
                    region: Arc::clone(region),
                    effective_priority: effective,
                },
            )
        })
        .collect();

    keyed.sort_by(|(pa, da, a), (pb, db, b)| {
        (Reverse(a.effective_priority), Reverse(*da), Reverse(*pa), a.region.id())
            .cmp(&(Reverse(b.effective_priority), Reverse(*db), Reverse(*pb), b.region.id()))
    });

    keyed.into_iter().map(|(_, _, ordered)| ordered).collect()
}
