//! Subjects of flag queries and how they associate with regions.

use regionguard_region::{Actor, Association, DefaultDomain, ProtectedRegion, RegionGraph};
use regionguard_types::RegionId;
use std::collections::HashSet;
use std::sync::Arc;

/// Anything a flag can be queried for: a player, a block, a constant.
pub trait RegionAssociable {
    /// Association with `regions`, which the calculator passes as a region
    /// followed by the ancestors walked so far.
    fn association(&self, regions: &[&ProtectedRegion], graph: &dyn RegionGraph) -> Association;
}

/// OWNER if the actor owns any of `regions` (directly or through a parent),
/// else MEMBER if it is a member of any, else NON_MEMBER.
#[must_use]
pub fn association_of<G: RegionGraph + ?Sized>(actor: &dyn Actor, regions: &[&ProtectedRegion], graph: &G) -> Association {
    let mut member = false;
    for region in regions {
        if region.is_owner(actor, graph) {
            return Association::Owner;
        }
        if !member && region.is_member(actor, graph) {
            member = true;
        }
    }
    if member { Association::Member } else { Association::NonMember }
}

impl<A: Actor> RegionAssociable for A {
    fn association(&self, regions: &[&ProtectedRegion], graph: &dyn RegionGraph) -> Association {
        association_of(self, regions, graph)
    }
}

impl RegionAssociable for dyn Actor {
    fn association(&self, regions: &[&ProtectedRegion], graph: &dyn RegionGraph) -> Association {
        association_of(self, regions, graph)
    }
}

/// The same association for every region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConstantAssociation(pub Association);

impl ConstantAssociation {
    pub const OWNER: Self = Self(Association::Owner);
    pub const MEMBER: Self = Self(Association::Member);
    pub const NON_MEMBER: Self = Self(Association::NonMember);
}

impl RegionAssociable for ConstantAssociation {
    fn association(&self, _regions: &[&ProtectedRegion], _graph: &dyn RegionGraph) -> Association {
        self.0
    }
}

/// Association of something located in a set of source regions, such as a
/// block or an entity, with the regions it acts upon.
///
/// A target region counts as owned when it is one of the source regions, or
/// (with owner association on) when its owners overlap the owners of the
/// source. Targets outside every region act on the global region; with an
/// empty source set that is treated as ownership.
#[derive(Debug, Clone)]
pub struct RegionOverlapAssociation {
    source: Vec<Arc<ProtectedRegion>>,
    source_ids: HashSet<RegionId>,
    use_max_priority: bool,
    use_owner_association: bool,
    max_priority: i32,
    max_priority_ids: HashSet<RegionId>,
}

impl RegionOverlapAssociation {
    #[must_use]
    pub fn new(source: Vec<Arc<ProtectedRegion>>, use_max_priority: bool) -> Self {
        let mut max_priority = 0;
        let mut max_priority_ids = HashSet::new();
        for region in &source {
            let priority = region.priority();
            if priority > max_priority {
                max_priority = priority;
                max_priority_ids.clear();
                max_priority_ids.insert(region.id().clone());
            } else if priority == max_priority {
                max_priority_ids.insert(region.id().clone());
            }
        }

        Self {
            source_ids: source.iter().map(|r| r.id().clone()).collect(),
            source,
            use_max_priority,
            use_owner_association: false,
            max_priority,
            max_priority_ids,
        }
    }

    /// Also treat targets whose owners overlap the source's owners as owned.
    #[must_use]
    pub fn with_owner_association(mut self) -> Self {
        self.use_owner_association = true;
        self
    }

    fn shares_owner(&self, owners: &DefaultDomain) -> bool {
        self.source
            .iter()
            .filter(|r| !self.use_max_priority || self.max_priority_ids.contains(r.id()))
            .any(|r| {
                let theirs = r.owners();
                !theirs.players().ids().is_disjoint(owners.players().ids())
                    || !theirs.players().names().is_disjoint(owners.players().names())
                    || !theirs.groups().groups().is_disjoint(owners.groups().groups())
            })
    }
}

impl RegionAssociable for RegionOverlapAssociation {
    fn association(&self, regions: &[&ProtectedRegion], _graph: &dyn RegionGraph) -> Association {
        for region in regions {
            if region.is_global() && self.source.is_empty() {
                return Association::Owner;
            }

            if self.source_ids.contains(region.id())
                && (!self.use_max_priority || region.priority() == self.max_priority)
            {
                return Association::Owner;
            }

            if self.use_owner_association && self.shares_owner(region.owners()) {
                return Association::Owner;
            }
        }
        Association::NonMember
    }
}
