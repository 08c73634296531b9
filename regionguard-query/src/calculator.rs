//! Flag value resolution over a normatively ordered region list.
//!
//! Regions are walked most specific first. The first region that yields a
//! value raises a priority floor to its own (effective) priority; the walk
//! stops at the first region below the floor. Once a region yields a value,
//! values coming from its ancestors are discarded, so a child's setting
//! always overrides its parent's. What survives is reduced by
//! [`Flag::choose_value`].
//!
//! The global region, when present, is always walked last at the lowest
//! possible priority.

use crate::association::{ConstantAssociation, RegionAssociable};
use crate::order::OrderedRegion;
use regionguard_flags::{builtin, Association, Flag, FlagValue, RegionGroup, State};
use regionguard_region::{ancestors, ProtectedRegion, RegionGraph};
use regionguard_types::RegionId;
use std::collections::HashSet;
use std::fmt;
use std::iter;
use tracing::trace;

/// Outcome of a membership check across the applicable regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// No region took part in the decision.
    NoRegions,
    /// The subject is not a member of some deciding region.
    Fail,
    /// The subject is a member of every deciding region.
    Success,
}

/// Resolves flag values for one applicable region set.
pub struct FlagValueCalculator<'a> {
    regions: &'a [OrderedRegion],
    global: Option<&'a ProtectedRegion>,
    graph: &'a dyn RegionGraph,
}

impl<'a> FlagValueCalculator<'a> {
    /// `regions` must already be in normative order and must not contain the
    /// global region, which is passed separately.
    #[must_use]
    pub fn new(regions: &'a [OrderedRegion], global: Option<&'a ProtectedRegion>, graph: &'a dyn RegionGraph) -> Self {
        Self { regions, global, graph }
    }

    fn applicable(&self) -> impl Iterator<Item = (&'a ProtectedRegion, i32)> + 'a {
        self.regions
            .iter()
            .map(|ordered| (ordered.region.as_ref(), ordered.effective_priority))
            .chain(self.global.map(|global| (global, i32::MIN)))
    }

    fn is_global_region(&self, region: &ProtectedRegion) -> bool {
        self.global.is_some_and(|global| std::ptr::eq(global, region))
    }

    fn is_passthrough(&self, region: &ProtectedRegion, subject: Option<&dyn RegionAssociable>) -> bool {
        self.effective_flag(region, builtin::passthrough(), subject)
            .and_then(|value| value.as_state())
            == Some(State::Allow)
    }

    // ── Membership ─────────────────────────────────────────────────

    /// Whether `subject` is a member of the regions that decide membership.
    ///
    /// Passthrough regions do not take part. Membership of a child clears
    /// the requirement to be a member of its ancestors.
    #[must_use]
    pub fn membership(&self, subject: &dyn RegionAssociable) -> Membership {
        let mut minimum = i32::MIN;
        let mut found = false;
        let mut needs_clear: HashSet<&'a RegionId> = HashSet::new();
        let mut has_cleared: HashSet<&'a RegionId> = HashSet::new();

        for (region, priority) in self.applicable() {
            if priority < minimum {
                break;
            }
            if self.is_passthrough(region, Some(subject)) {
                continue;
            }

            minimum = priority;
            found = true;

            if has_cleared.contains(region.id()) {
                continue;
            }
            if RegionGroup::Members.contains(subject.association(&[region], self.graph)) {
                for parent in ancestors(self.graph, region) {
                    if !needs_clear.remove(parent.id()) {
                        has_cleared.insert(parent.id());
                    }
                }
            } else {
                needs_clear.insert(region.id());
            }
        }

        match (found, needs_clear.is_empty()) {
            (false, _) => Membership::NoRegions,
            (true, true) => Membership::Success,
            (true, false) => Membership::Fail,
        }
    }

    // ── Queries ────────────────────────────────────────────────────

    /// Combined state of several state flags. DENY from any flag wins.
    #[must_use]
    pub fn query_state(&self, subject: Option<&dyn RegionAssociable>, flags: &[&Flag]) -> Option<State> {
        let mut result = None;
        for flag in flags {
            let value = self.query_value(subject, flag).and_then(|v| v.as_state());
            result = State::combine([result, value]);
            if result == Some(State::Deny) {
                break;
            }
        }
        result
    }

    /// The single effective value of `flag`, or `None` when undefined.
    #[must_use]
    pub fn query_value(&self, subject: Option<&dyn RegionAssociable>, flag: &Flag) -> Option<FlagValue> {
        flag.choose_value(self.query_all_values(subject, flag))
    }

    /// Every value that survives the walk, most specific first.
    ///
    /// Falls back to membership for flags that use it, then to the flag's
    /// default. Empty means undefined.
    #[must_use]
    pub fn query_all_values(&self, subject: Option<&dyn RegionAssociable>, flag: &Flag) -> Vec<FlagValue> {
        let mut minimum = i32::MIN;
        let mut considered: Vec<(&'a RegionId, FlagValue)> = Vec::new();
        let mut ignored: HashSet<&'a RegionId> = HashSet::new();

        for (region, priority) in self.applicable() {
            if priority < minimum {
                break;
            }

            if let Some(value) = self.effective_flag(region, flag, subject)
                && !ignored.contains(region.id())
            {
                minimum = priority;
                for parent in ancestors(self.graph, region) {
                    considered.retain(|(id, _)| *id != parent.id());
                    ignored.insert(parent.id());
                }
                trace!(region = %region.id(), flag = %flag, value = %value, "considering flag value");
                considered.push((region.id(), value));
            }

            if priority != minimum && flag.implicitly_set_with_membership() && !self.is_passthrough(region, subject) {
                minimum = priority;
            }
        }

        if considered.is_empty() && flag.uses_membership_as_default() {
            let subject = subject.unwrap_or(&ConstantAssociation::NON_MEMBER);
            match self.membership(subject) {
                Membership::Fail => return Vec::new(),
                Membership::Success => return vec![FlagValue::State(State::Allow)],
                Membership::NoRegions => {}
            }
        }

        if considered.is_empty() {
            return flag.default_value().cloned().into_iter().collect();
        }

        considered.into_iter().map(|(_, value)| value).collect()
    }

    /// The value of `flag` that `region` contributes for `subject`.
    ///
    /// Walks from the region up through its ancestors and returns the first
    /// value whose group sub-setting admits the subject. With no subject the
    /// group must admit non-members.
    #[must_use]
    pub fn effective_flag(
        &self,
        region: &ProtectedRegion,
        flag: &Flag,
        subject: Option<&dyn RegionAssociable>,
    ) -> Option<FlagValue> {
        if self.is_global_region(region) {
            if flag.name() == builtin::PASSTHROUGH {
                let denied = region.flag(flag).and_then(|v| v.as_state()) == Some(State::Deny);
                return if region.has_members_or_owners() || denied {
                    None
                } else {
                    Some(FlagValue::State(State::Allow))
                };
            }
            if flag.prevents_allow_on_global() {
                return region.flag(flag).filter(|v| v.as_state() != Some(State::Allow));
            }
        }

        let mut seen: Vec<&ProtectedRegion> = Vec::new();
        for current in iter::once(region).chain(ancestors(self.graph, region)) {
            seen.push(current);
            let Some(value) = current.flag(flag) else {
                continue;
            };
            if self.group_admits(current, flag, subject, &seen) {
                return Some(value);
            }
        }
        None
    }

    fn group_admits(
        &self,
        region: &ProtectedRegion,
        flag: &Flag,
        subject: Option<&dyn RegionAssociable>,
        seen: &[&ProtectedRegion],
    ) -> bool {
        let Some(default) = flag.group_default() else {
            return true;
        };
        let group = region.group(flag).unwrap_or(default);
        match subject {
            None => group.contains(Association::NonMember),
            Some(subject) => group.contains(subject.association(seen, self.graph)),
        }
    }
}

impl fmt::Debug for FlagValueCalculator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlagValueCalculator")
            .field("regions", &self.regions.len())
            .field("global", &self.global.map(ProtectedRegion::id))
            .finish()
    }
}
