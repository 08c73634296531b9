//! The regions that apply at a point, ready to be queried.

use crate::association::{association_of, RegionAssociable};
use crate::calculator::{FlagValueCalculator, Membership};
use crate::order::{normative_order, OrderedRegion};
use regionguard_flags::{Association, Flag, FlagValue, FromFlagValue, State};
use regionguard_region::{Actor, ProtectedRegion, RegionGraph};
use regionguard_types::RegionId;
use std::fmt;
use std::sync::Arc;

/// The graph parent links are resolved through.
pub type SharedGraph = Arc<dyn RegionGraph + Send + Sync>;

/// Applicable regions in normative order plus the global region.
#[derive(Clone)]
pub struct ApplicableRegionSet {
    ordered: Vec<OrderedRegion>,
    global: Option<Arc<ProtectedRegion>>,
    graph: SharedGraph,
}

impl ApplicableRegionSet {
    /// Orders `regions` and sets aside the global region if it is among them.
    ///
    /// `global` is used when `regions` does not carry one itself.
    #[must_use]
    pub fn new(regions: Vec<Arc<ProtectedRegion>>, global: Option<Arc<ProtectedRegion>>, graph: SharedGraph) -> Self {
        let (globals, physical): (Vec<_>, Vec<_>) = regions.into_iter().partition(|r| r.is_global());
        let global = globals.into_iter().next().or(global);
        let ordered = normative_order(&physical, graph.as_ref());
        Self { ordered, global, graph }
    }

    /// A set with no regions at all. Every query falls through to defaults.
    #[must_use]
    pub fn empty(graph: SharedGraph) -> Self {
        Self {
            ordered: Vec::new(),
            global: None,
            graph,
        }
    }

    fn calculator(&self) -> FlagValueCalculator<'_> {
        FlagValueCalculator::new(&self.ordered, self.global.as_deref(), self.graph.as_ref())
    }

    // ── Flag queries ───────────────────────────────────────────────

    /// True only if the combined state of `flags` is an explicit ALLOW.
    #[must_use]
    pub fn test_state(&self, subject: Option<&dyn RegionAssociable>, flags: &[&Flag]) -> bool {
        State::test(self.query_state(subject, flags))
    }

    #[must_use]
    pub fn query_state(&self, subject: Option<&dyn RegionAssociable>, flags: &[&Flag]) -> Option<State> {
        self.calculator().query_state(subject, flags)
    }

    #[must_use]
    pub fn query_value(&self, subject: Option<&dyn RegionAssociable>, flag: &Flag) -> Option<FlagValue> {
        self.calculator().query_value(subject, flag)
    }

    /// Typed variant of [`query_value`](Self::query_value). A value of the
    /// wrong type reads as undefined.
    #[must_use]
    pub fn query_value_as<T: FromFlagValue>(&self, subject: Option<&dyn RegionAssociable>, flag: &Flag) -> Option<T> {
        self.query_value(subject, flag).and_then(|v| T::from_flag_value(&v))
    }

    #[must_use]
    pub fn query_all_values(&self, subject: Option<&dyn RegionAssociable>, flag: &Flag) -> Vec<FlagValue> {
        self.calculator().query_all_values(subject, flag)
    }

    #[must_use]
    pub fn membership(&self, subject: &dyn RegionAssociable) -> Membership {
        self.calculator().membership(subject)
    }

    // ── Association ────────────────────────────────────────────────

    /// Association of `actor` with the physical regions in the set.
    #[must_use]
    pub fn association(&self, actor: &dyn Actor) -> Association {
        let regions: Vec<&ProtectedRegion> = self.iter().collect();
        association_of(actor, &regions, self.graph.as_ref())
    }

    /// True if `actor` owns every physical region. Vacuously true when empty.
    #[must_use]
    pub fn is_owner_of_all(&self, actor: &dyn Actor) -> bool {
        self.iter().all(|r| r.is_owner(actor, self.graph.as_ref()))
    }

    /// True if `actor` is a member of every physical region.
    #[must_use]
    pub fn is_member_of_all(&self, actor: &dyn Actor) -> bool {
        self.iter().all(|r| r.is_member(actor, self.graph.as_ref()))
    }

    // ── Contents ───────────────────────────────────────────────────

    /// Physical regions in normative order.
    pub fn iter(&self) -> impl Iterator<Item = &ProtectedRegion> {
        self.ordered.iter().map(|o| o.region.as_ref())
    }

    #[must_use]
    pub fn ordered(&self) -> &[OrderedRegion] {
        &self.ordered
    }

    #[must_use]
    pub fn ids(&self) -> Vec<&RegionId> {
        self.iter().map(ProtectedRegion::id).collect()
    }

    #[must_use]
    pub fn global(&self) -> Option<&ProtectedRegion> {
        self.global.as_deref()
    }

    /// Number of physical regions. The global region is not counted.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ordered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ordered.is_empty()
    }
}

impl fmt::Debug for ApplicableRegionSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplicableRegionSet")
            .field("regions", &self.ids())
            .field("global", &self.global.as_ref().map(|g| g.id()))
            .finish()
    }
}
