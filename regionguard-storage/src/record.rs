//! Persisted region records.
//!
//! [`RegionRecord`] is the canonical (version 2) form. Version 1 records
//! stored owners and members by name only and used a flat shape layout;
//! they are converted into the canonical form as they are read and are
//! never written.

use regionguard_flags::FlagRegistry;
use regionguard_geometry::{Polygon, Shape};
use regionguard_region::{DefaultDomain, DomainRegistry, ProtectedRegion};
use regionguard_types::{BlockVector2, BlockVector3, PlayerId, RegionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tracing::warn;

use crate::error::{StorageError, StorageResult};

// ── Version 2 ──────────────────────────────────────────────────────

/// Owners or members as persisted.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct DomainRecord {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub unique_ids: Vec<PlayerId>,
    /// Legacy lowercase player names not yet migrated to ids.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub players: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<String>,
    /// Custom domains keyed by their registered type name.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub custom: BTreeMap<String, Value>,
}

impl DomainRecord {
    #[must_use]
    pub fn from_domain(domain: &DefaultDomain) -> Self {
        Self {
            unique_ids: domain.players().ids().iter().copied().collect(),
            players: domain.players().names().iter().cloned().collect(),
            groups: domain.groups().groups().iter().cloned().collect(),
            custom: domain
                .custom()
                .iter()
                .map(|d| (d.type_name().to_string(), d.marshal()))
                .collect(),
        }
    }

    /// Rebuilds the domain. Custom domains of unknown or failing types are
    /// logged and left out.
    pub fn into_domain(self, region: &str, domains: &DomainRegistry) -> DefaultDomain {
        let mut domain = DefaultDomain::new();
        for id in self.unique_ids {
            domain.add_player(id);
        }
        for name in &self.players {
            domain.add_name(name);
        }
        for group in &self.groups {
            domain.add_group(group);
        }
        for (type_name, raw) in &self.custom {
            match domains.unmarshal(type_name, raw) {
                Ok(custom) => domain.add_custom(custom),
                Err(e) => warn!(region = %region, domain = %type_name, "skipping custom domain: {}", e),
            }
        }
        domain
    }
}

/// One region as persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionRecord {
    pub id: String,
    #[serde(default)]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    /// Kept raw so that one bad shape only costs its own region.
    pub shape: Value,
    #[serde(default)]
    pub owners: DomainRecord,
    #[serde(default)]
    pub members: DomainRecord,
    #[serde(default)]
    pub flags: BTreeMap<String, Value>,
}

impl RegionRecord {
    pub fn from_region(region: &ProtectedRegion) -> StorageResult<Self> {
        Ok(Self {
            id: region.id().to_string(),
            priority: region.priority(),
            parent: region.parent().map(ToString::to_string),
            shape: serde_json::to_value(region.shape())?,
            owners: DomainRecord::from_domain(region.owners()),
            members: DomainRecord::from_domain(region.members()),
            flags: region.raw_flags().clone(),
        })
    }

    /// Rebuilds the region without its parent link, which is returned
    /// separately so that links can be checked once every region exists.
    ///
    /// Flag values that do not unmarshal through `flags` are logged and
    /// dropped. Values of flags the registry does not know are kept raw.
    pub fn into_region(
        self,
        flags: &FlagRegistry,
        domains: &DomainRegistry,
    ) -> StorageResult<(ProtectedRegion, Option<RegionId>)> {
        let id = RegionId::new(&self.id).map_err(|e| StorageError::InvalidData(format!("region '{}': {e}", self.id)))?;

        let mut shape: Shape = serde_json::from_value(self.shape)
            .map_err(|e| StorageError::InvalidData(format!("region '{id}' has a bad shape: {e}")))?;
        if id.is_global() && shape.is_physical() {
            warn!(region = %id, "global region stored with a physical shape, treating it as global");
            shape = Shape::Global;
        }

        let parent = match self.parent.as_deref().map(RegionId::new) {
            Some(Ok(parent)) => Some(parent),
            Some(Err(e)) => {
                warn!(region = %id, "dropping invalid parent id: {}", e);
                None
            }
            None => None,
        };

        let mut region = ProtectedRegion::new(id, shape).with_priority(self.priority);
        let name = self.id.to_ascii_lowercase();
        region.set_owners(self.owners.into_domain(&name, domains));
        region.set_members(self.members.into_domain(&name, domains));

        let parsed = flags.unmarshal_map(&self.flags, true);
        for (flag, value) in parsed.values {
            if let Err(e) = region.set_flag(&flag, Some(value)) {
                warn!(region = %name, flag = %flag, "dropping flag value: {}", e);
            }
        }
        for (flag, group) in parsed.groups {
            region.set_group(&flag, Some(group));
        }
        for (key, raw) in parsed.unknown {
            region.set_raw_flag(&key, Some(raw));
        }

        Ok((region, parent))
    }
}

// ── Version 1 ──────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub(crate) struct DomainRecordV1 {
    #[serde(default)]
    players: Vec<String>,
    #[serde(default)]
    groups: Vec<String>,
}

impl From<DomainRecordV1> for DomainRecord {
    fn from(v1: DomainRecordV1) -> Self {
        Self {
            unique_ids: Vec::new(),
            players: v1.players.into_iter().map(|p| p.to_ascii_lowercase()).collect(),
            groups: v1.groups,
            custom: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum ShapeV1 {
    Cuboid {
        min: BlockVector3,
        max: BlockVector3,
    },
    Poly2d {
        points: Vec<BlockVector2>,
        #[serde(rename = "min-y")]
        min_y: i32,
        #[serde(rename = "max-y")]
        max_y: i32,
    },
    Global,
}

impl ShapeV1 {
    fn into_shape(self) -> StorageResult<Shape> {
        Ok(match self {
            Self::Cuboid { min, max } => Shape::cuboid(min, max),
            Self::Poly2d { points, min_y, max_y } => Polygon::new(points, min_y, max_y)
                .map_err(|e| StorageError::InvalidData(e.to_string()))?
                .into(),
            Self::Global => Shape::Global,
        })
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct RegionRecordV1 {
    id: String,
    #[serde(default)]
    priority: i32,
    #[serde(default)]
    parent: Option<String>,
    #[serde(flatten)]
    shape: ShapeV1,
    #[serde(default)]
    owners: DomainRecordV1,
    #[serde(default)]
    members: DomainRecordV1,
    #[serde(default)]
    flags: BTreeMap<String, Value>,
}

impl RegionRecordV1 {
    pub(crate) fn upgrade(self) -> StorageResult<RegionRecord> {
        let shape = self.shape.into_shape()?;
        Ok(RegionRecord {
            id: self.id,
            priority: self.priority,
            parent: self.parent,
            shape: serde_json::to_value(shape)?,
            owners: self.owners.into(),
            members: self.members.into(),
            flags: self.flags,
        })
    }
}

// ── Parent links ───────────────────────────────────────────────────

/// Restores parent links once every region is known.
///
/// Links to missing parents and links that would close a cycle are logged
/// and left unset. Links are applied in id order so the outcome does not
/// depend on document order.
pub(crate) fn link_parents(loaded: Vec<(ProtectedRegion, Option<RegionId>)>) -> Vec<ProtectedRegion> {
    let mut parents: HashMap<RegionId, RegionId> = HashMap::new();
    let mut regions: HashMap<RegionId, ProtectedRegion> = HashMap::with_capacity(loaded.len());

    for (region, parent) in loaded {
        let id = region.id().clone();
        match parent {
            Some(parent) => parents.insert(id.clone(), parent),
            None => parents.remove(&id),
        };
        if regions.insert(id.clone(), region).is_some() {
            warn!(region = %id, "duplicate region id, keeping the last one");
        }
    }

    let mut links: Vec<(RegionId, RegionId)> = parents.into_iter().collect();
    links.sort();
    for (child, parent) in links {
        if !regions.contains_key(&parent) {
            warn!(region = %child, parent = %parent, "parent does not exist, leaving region unparented");
            continue;
        }
        let Some(mut region) = regions.get(&child).cloned() else {
            continue;
        };
        match region.set_parent(Some(parent), &regions) {
            Ok(()) => {
                regions.insert(child, region);
            }
            Err(e) => warn!(region = %child, "leaving region unparented: {}", e),
        }
    }

    let mut out: Vec<ProtectedRegion> = regions.into_values().collect();
    out.sort_by(|a, b| a.id().cmp(b.id()));
    out
}
