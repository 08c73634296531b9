//! Owner and member domains.
//!
//! A [`DefaultDomain`] combines a set of players, a set of group names and
//! any number of custom domains contributed by extensions.

use parking_lot::RwLock;
use regionguard_types::PlayerId;
use serde_json::Value;
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

use crate::actor::Actor;
use crate::error::{RegionError, RegionResult};

// ── Players ─────────────────────────────────────────────────────

/// Players listed by unique id, or by legacy lowercase name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlayerDomain {
    ids: BTreeSet<PlayerId>,
    names: BTreeSet<String>,
}

impl PlayerDomain {
    pub fn add_player(&mut self, id: PlayerId) {
        self.ids.insert(id);
    }

    /// Adds a player by name. Names are only kept for data that predates
    /// unique ids.
    pub fn add_name(&mut self, name: &str) {
        self.names.insert(name.trim().to_ascii_lowercase());
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> bool {
        self.ids.remove(id)
    }

    pub fn remove_name(&mut self, name: &str) -> bool {
        self.names.remove(&name.trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn contains_id(&self, id: &PlayerId) -> bool {
        self.ids.contains(id)
    }

    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.names.contains(&name.trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn contains(&self, actor: &dyn Actor) -> bool {
        self.contains_id(&actor.unique_id()) || self.contains_name(actor.name())
    }

    #[must_use]
    pub fn ids(&self) -> &BTreeSet<PlayerId> {
        &self.ids
    }

    #[must_use]
    pub fn names(&self) -> &BTreeSet<String> {
        &self.names
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.ids.len() + self.names.len()
    }

    pub fn clear(&mut self) {
        self.ids.clear();
        self.names.clear();
    }
}

// ── Groups ──────────────────────────────────────────────────────

/// Group names, resolved against [`Actor::has_group`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupDomain {
    groups: BTreeSet<String>,
}

impl GroupDomain {
    pub fn add_group(&mut self, group: &str) {
        self.groups.insert(group.trim().to_ascii_lowercase());
    }

    pub fn remove_group(&mut self, group: &str) -> bool {
        self.groups.remove(&group.trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn contains_group(&self, group: &str) -> bool {
        self.groups.contains(&group.trim().to_ascii_lowercase())
    }

    #[must_use]
    pub fn contains(&self, actor: &dyn Actor) -> bool {
        self.groups.iter().any(|g| actor.has_group(g))
    }

    #[must_use]
    pub fn groups(&self) -> &BTreeSet<String> {
        &self.groups
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.groups.len()
    }

    pub fn clear(&mut self) {
        self.groups.clear();
    }
}

// ── Custom domains ──────────────────────────────────────────────

/// A membership source contributed by an extension.
pub trait CustomDomain: fmt::Debug + Send + Sync {
    /// Name the domain type was registered under.
    fn type_name(&self) -> &str;

    fn contains(&self, actor: &dyn Actor) -> bool;

    fn contains_id(&self, _id: &PlayerId) -> bool {
        false
    }

    fn size(&self) -> usize;

    /// Persisted form, read back through the matching [`DomainFactory`].
    fn marshal(&self) -> Value;
}

/// Rebuilds a custom domain from its persisted form.
pub type DomainFactory = Arc<dyn Fn(&Value) -> RegionResult<Arc<dyn CustomDomain>> + Send + Sync>;

/// Registered custom domain types.
#[derive(Default)]
pub struct DomainRegistry {
    factories: RwLock<HashMap<String, DomainFactory>>,
}

impl DomainRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory; a type name may only be registered once.
    pub fn register(&self, type_name: &str, factory: DomainFactory) -> RegionResult<()> {
        let key = type_name.to_ascii_lowercase();
        let mut factories = self.factories.write();
        if factories.contains_key(&key) {
            return Err(RegionError::DuplicateRegistration(key));
        }
        debug!(domain = %key, "registered custom domain type");
        factories.insert(key, factory);
        Ok(())
    }

    /// Rebuilds a persisted custom domain.
    pub fn unmarshal(&self, type_name: &str, raw: &Value) -> RegionResult<Arc<dyn CustomDomain>> {
        let factory = self
            .factories
            .read()
            .get(&type_name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| RegionError::UnknownDomainType(type_name.to_string()))?;
        factory(raw)
    }

    #[must_use]
    pub fn contains(&self, type_name: &str) -> bool {
        self.factories.read().contains_key(&type_name.to_ascii_lowercase())
    }
}

impl fmt::Debug for DomainRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.factories.read().keys().cloned().collect();
        names.sort();
        f.debug_struct("DomainRegistry").field("types", &names).finish()
    }
}

// ── Default domain ──────────────────────────────────────────────

/// The owners or members of a region.
#[derive(Debug, Clone, Default)]
pub struct DefaultDomain {
    players: PlayerDomain,
    groups: GroupDomain,
    custom: Vec<Arc<dyn CustomDomain>>,
}

impl DefaultDomain {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_player(&mut self, id: PlayerId) {
        self.players.add_player(id);
    }

    pub fn add_name(&mut self, name: &str) {
        self.players.add_name(name);
    }

    pub fn add_group(&mut self, group: &str) {
        self.groups.add_group(group);
    }

    /// Adds a custom domain, replacing any of the same type.
    pub fn add_custom(&mut self, domain: Arc<dyn CustomDomain>) {
        self.custom.retain(|d| d.type_name() != domain.type_name());
        self.custom.push(domain);
    }

    pub fn remove_player(&mut self, id: &PlayerId) -> bool {
        self.players.remove_player(id)
    }

    pub fn remove_name(&mut self, name: &str) -> bool {
        self.players.remove_name(name)
    }

    pub fn remove_group(&mut self, group: &str) -> bool {
        self.groups.remove_group(group)
    }

    pub fn remove_custom(&mut self, type_name: &str) -> bool {
        let before = self.custom.len();
        self.custom.retain(|d| d.type_name() != type_name);
        before != self.custom.len()
    }

    /// Removes every player, group and custom domain.
    pub fn remove_all(&mut self) {
        self.players.clear();
        self.groups.clear();
        self.custom.clear();
    }

    /// True if the actor is listed directly, by name, through any of its
    /// groups, or by a custom domain.
    #[must_use]
    pub fn contains(&self, actor: &dyn Actor) -> bool {
        self.players.contains(actor)
            || self.groups.contains(actor)
            || self.custom.iter().any(|d| d.contains(actor))
    }

    /// Membership by id alone, without group information.
    #[must_use]
    pub fn contains_id(&self, id: &PlayerId) -> bool {
        self.players.contains_id(id) || self.custom.iter().any(|d| d.contains_id(id))
    }

    #[must_use]
    pub const fn players(&self) -> &PlayerDomain {
        &self.players
    }

    pub fn players_mut(&mut self) -> &mut PlayerDomain {
        &mut self.players
    }

    #[must_use]
    pub const fn groups(&self) -> &GroupDomain {
        &self.groups
    }

    #[must_use]
    pub fn custom(&self) -> &[Arc<dyn CustomDomain>] {
        &self.custom
    }

    #[must_use]
    pub fn size(&self) -> usize {
        self.players.size() + self.groups.size() + self.custom.iter().map(|d| d.size()).sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }
}

impl PartialEq for DefaultDomain {
    fn eq(&self, other: &Self) -> bool {
        self.players == other.players
            && self.groups == other.groups
            && self.custom.len() == other.custom.len()
            && self.custom.iter().zip(&other.custom).all(|(a, b)| {
                a.type_name() == b.type_name() && a.marshal() == b.marshal()
            })
    }
}
