//! Region groups and actor associations.
//!
//! A [`RegionGroup`] scopes a flag to part of the population. It is a plain
//! enum plus a predicate over the actor's [`Association`] with the region.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FlagError, FlagResult};

/// An actor's relationship to a region or set of regions.
///
/// OWNER implies MEMBER.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Association {
    Owner,
    Member,
    NonMember,
}

impl Association {
    /// True for owners and members.
    #[must_use]
    pub const fn is_member(self) -> bool {
        matches!(self, Self::Owner | Self::Member)
    }
}

impl fmt::Display for Association {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Owner => "owner",
            Self::Member => "member",
            Self::NonMember => "non_member",
        })
    }
}

/// The part of the population a flag applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RegionGroup {
    Members,
    Owners,
    NonMembers,
    NonOwners,
    All,
    None,
}

impl RegionGroup {
    /// Returns true if an actor with `association` falls in this group.
    #[must_use]
    pub const fn contains(self, association: Association) -> bool {
        match self {
            Self::Members => matches!(association, Association::Owner | Association::Member),
            Self::Owners => matches!(association, Association::Owner),
            Self::NonMembers => matches!(association, Association::NonMember),
            Self::NonOwners => matches!(association, Association::Member | Association::NonMember),
            Self::All => true,
            Self::None => false,
        }
    }

    /// Parses user text, accepting the usual singular and plural aliases.
    pub fn parse(input: &str) -> FlagResult<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "member" | "members" => Ok(Self::Members),
            "owner" | "owners" => Ok(Self::Owners),
            "nonowner" | "nonowners" | "non_owners" => Ok(Self::NonOwners),
            "nonmember" | "nonmembers" | "non_members" => Ok(Self::NonMembers),
            "everyone" | "anyone" | "all" => Ok(Self::All),
            "none" | "noone" | "deny" => Ok(Self::None),
            other => Err(FlagError::format(format!("unknown region group '{other}'"))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Members => "members",
            Self::Owners => "owners",
            Self::NonMembers => "non_members",
            Self::NonOwners => "non_owners",
            Self::All => "all",
            Self::None => "none",
        }
    }
}

impl fmt::Display for RegionGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
