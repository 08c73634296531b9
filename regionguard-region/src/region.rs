//! The protected region entity.

use regionguard_flags::{Flag, FlagValue, RegionGroup};
use regionguard_geometry::{Aabb, Shape, ShapeKind};
use regionguard_types::{BlockVector3, RegionId};
use serde_json::Value;
use std::collections::BTreeMap;
use tracing::warn;

use crate::actor::Actor;
use crate::domain::DefaultDomain;
use crate::error::RegionResult;
use crate::graph::{ancestors, check_parent, RegionGraph};

/// A named volume with priority, membership, an optional parent and flags.
#[derive(Debug, Clone, PartialEq)]
pub struct ProtectedRegion {
    id: RegionId,
    shape: Shape,
    priority: i32,
    parent: Option<RegionId>,
    owners: DefaultDomain,
    members: DefaultDomain,
    flags: BTreeMap<String, Value>,
}

impl ProtectedRegion {
    /// Creates a region with priority 0, no parent and no flags.
    #[must_use]
    pub fn new(id: RegionId, shape: impl Into<Shape>) -> Self {
        Self {
            id,
            shape: shape.into(),
            priority: 0,
            parent: None,
            owners: DefaultDomain::new(),
            members: DefaultDomain::new(),
            flags: BTreeMap::new(),
        }
    }

    /// Creates the whole-world region.
    #[must_use]
    pub fn global() -> Self {
        Self::new(RegionId::global(), Shape::Global)
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    // ── Identity and geometry ──────────────────────────────────────

    #[must_use]
    pub const fn id(&self) -> &RegionId {
        &self.id
    }

    #[must_use]
    pub fn is_global(&self) -> bool {
        self.id.is_global()
    }

    #[must_use]
    pub const fn shape(&self) -> &Shape {
        &self.shape
    }

    /// Redefines the region's shape, keeping everything else.
    pub fn set_shape(&mut self, shape: impl Into<Shape>) {
        self.shape = shape.into();
    }

    #[must_use]
    pub const fn kind(&self) -> ShapeKind {
        self.shape.kind()
    }

    #[must_use]
    pub const fn is_physical(&self) -> bool {
        self.shape.is_physical()
    }

    #[must_use]
    pub fn bounds(&self) -> Aabb {
        self.shape.bounds()
    }

    #[must_use]
    pub fn contains(&self, point: BlockVector3) -> bool {
        self.shape.contains(point)
    }

    #[must_use]
    pub fn intersects(&self, other: &ProtectedRegion) -> bool {
        self.shape.intersects(&other.shape)
    }

    #[must_use]
    pub fn volume(&self) -> u64 {
        self.shape.volume()
    }

    // ── Priority and parent ────────────────────────────────────────

    #[must_use]
    pub const fn priority(&self) -> i32 {
        self.priority
    }

    pub fn set_priority(&mut self, priority: i32) {
        self.priority = priority;
    }

    #[must_use]
    pub const fn parent(&self) -> Option<&RegionId> {
        self.parent.as_ref()
    }

    /// Sets or clears the parent.
    ///
    /// Fails with `CircularInheritance` if `parent` is this region or one of
    /// its descendants in `graph`; the current link is kept in that case.
    pub fn set_parent<G: RegionGraph + ?Sized>(&mut self, parent: Option<RegionId>, graph: &G) -> RegionResult<()> {
        if let Some(parent) = &parent {
            check_parent(graph, &self.id, parent)?;
        }
        self.parent = parent;
        Ok(())
    }

    pub fn clear_parent(&mut self) {
        self.parent = None;
    }

    // ── Membership ─────────────────────────────────────────────────

    #[must_use]
    pub const fn owners(&self) -> &DefaultDomain {
        &self.owners
    }

    pub fn owners_mut(&mut self) -> &mut DefaultDomain {
        &mut self.owners
    }

    pub fn set_owners(&mut self, owners: DefaultDomain) {
        self.owners = owners;
    }

    #[must_use]
    pub const fn members(&self) -> &DefaultDomain {
        &self.members
    }

    pub fn members_mut(&mut self) -> &mut DefaultDomain {
        &mut self.members
    }

    pub fn set_members(&mut self, members: DefaultDomain) {
        self.members = members;
    }

    #[must_use]
    pub fn has_members_or_owners(&self) -> bool {
        !self.owners.is_empty() || !self.members.is_empty()
    }

    /// Owner of this region or of any ancestor.
    #[must_use]
    pub fn is_owner<G: RegionGraph + ?Sized>(&self, actor: &dyn Actor, graph: &G) -> bool {
        self.owners.contains(actor) || ancestors(graph, self).any(|r| r.owners.contains(actor))
    }

    /// Member (or owner) of this region or of any ancestor.
    #[must_use]
    pub fn is_member<G: RegionGraph + ?Sized>(&self, actor: &dyn Actor, graph: &G) -> bool {
        self.owners.contains(actor)
            || self.members.contains(actor)
            || ancestors(graph, self).any(|r| r.owners.contains(actor) || r.members.contains(actor))
    }

    // ── Flags ──────────────────────────────────────────────────────

    /// Reads a flag value set directly on this region.
    ///
    /// A stored value that does not unmarshal is logged and read as unset.
    #[must_use]
    pub fn flag(&self, flag: &Flag) -> Option<FlagValue> {
        let raw = self.flags.get(flag.name())?;
        match flag.unmarshal(raw) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(region = %self.id, flag = %flag.name(), "ignoring malformed flag value: {}", e);
                None
            }
        }
    }

    /// Sets or clears a flag value.
    pub fn set_flag(&mut self, flag: &Flag, value: Option<FlagValue>) -> RegionResult<()> {
        match value {
            Some(value) => {
                let raw = flag.marshal(&value)?;
                self.flags.insert(flag.name().to_string(), raw);
            }
            None => {
                self.flags.remove(flag.name());
            }
        }
        Ok(())
    }

    /// The `-group` sub-setting stored on this region, if any.
    #[must_use]
    pub fn group(&self, flag: &Flag) -> Option<RegionGroup> {
        let raw = self.flags.get(&flag.group_key())?;
        match raw.as_str().map(RegionGroup::parse) {
            Some(Ok(group)) => Some(group),
            _ => {
                warn!(region = %self.id, flag = %flag.group_key(), value = %raw, "ignoring malformed region group");
                None
            }
        }
    }

    /// The group a flag value on this region applies to.
    #[must_use]
    pub fn effective_group(&self, flag: &Flag) -> Option<RegionGroup> {
        self.group(flag).or(flag.group_default())
    }

    pub fn set_group(&mut self, flag: &Flag, group: Option<RegionGroup>) {
        let key = flag.group_key();
        match group {
            Some(group) => {
                self.flags.insert(key, Value::from(group.as_str()));
            }
            None => {
                self.flags.remove(&key);
            }
        }
    }

    /// Marshalled value by flag name, as persisted.
    #[must_use]
    pub fn raw_flag(&self, name: &str) -> Option<&Value> {
        self.flags.get(&name.to_ascii_lowercase())
    }

    #[must_use]
    pub const fn raw_flags(&self) -> &BTreeMap<String, Value> {
        &self.flags
    }

    /// Stores a marshalled value without checking it against a flag.
    pub fn set_raw_flag(&mut self, name: &str, raw: Option<Value>) {
        let key = name.to_ascii_lowercase();
        match raw {
            Some(raw) => {
                self.flags.insert(key, raw);
            }
            None => {
                self.flags.remove(&key);
            }
        }
    }

    pub fn clear_flags(&mut self) {
        self.flags.clear();
    }
}
