//! The actor capability consumed by membership checks.

use regionguard_types::PlayerId;
use std::collections::BTreeSet;

/// Something that can own or be a member of a region.
///
/// The host implements this for its player type. It is only consulted for
/// association questions and never persisted.
pub trait Actor: Send + Sync {
    /// Stable unique identity.
    fn unique_id(&self) -> PlayerId;

    /// Current display name. May change between sessions.
    fn name(&self) -> &str;

    /// Whether the actor is in `group` (lowercase).
    fn has_group(&self, group: &str) -> bool;

    /// All groups the actor is in.
    fn groups(&self) -> Vec<String>;

    fn has_permission(&self, permission: &str) -> bool;
}

/// A plain-data actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerActor {
    id: PlayerId,
    name: String,
    groups: BTreeSet<String>,
    permissions: BTreeSet<String>,
}

impl PlayerActor {
    /// Creates an actor with a random id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(PlayerId::new(), name)
    }

    #[must_use]
    pub fn with_id(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            groups: BTreeSet::new(),
            permissions: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn in_group(mut self, group: &str) -> Self {
        self.groups.insert(group.to_ascii_lowercase());
        self
    }

    #[must_use]
    pub fn with_permission(mut self, permission: &str) -> Self {
        self.permissions.insert(permission.to_string());
        self
    }

    /// Players can rename themselves; the id stays the same.
    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }
}

impl Actor for PlayerActor {
    fn unique_id(&self) -> PlayerId {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn has_group(&self, group: &str) -> bool {
        self.groups.contains(&group.to_ascii_lowercase())
    }

    fn groups(&self) -> Vec<String> {
        self.groups.iter().cloned().collect()
    }

    fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains("*") || self.permissions.contains(permission)
    }
}
