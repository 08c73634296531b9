//! Identifier types used throughout regionguard.
//!
//! Region ids are human-chosen names compared case-insensitively; player ids
//! are stable UUIDs handed to us by the host.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

use crate::Error;

/// The reserved id of the whole-world region.
pub const GLOBAL_REGION_ID: &str = "__global__";

/// Identifier of a protected region.
///
/// Stored lowercased so that equality, hashing and ordering are all
/// case-insensitive. Valid ids consist of ASCII letters, digits and the
/// characters `_ , ' - + /`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    /// Validates and normalises a region id.
    pub fn new(id: &str) -> Result<Self, Error> {
        if Self::is_valid(id) {
            Ok(Self(id.to_ascii_lowercase()))
        } else {
            Err(Error::InvalidRegionId(id.to_string()))
        }
    }

    /// The id of the global region.
    #[must_use]
    pub fn global() -> Self {
        Self(GLOBAL_REGION_ID.to_string())
    }

    /// Returns true if `id` could be used as a region id.
    #[must_use]
    pub fn is_valid(id: &str) -> bool {
        !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | ',' | '\'' | '-' | '+' | '/'))
    }

    /// Returns true if this is the reserved global id.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.0 == GLOBAL_REGION_ID
    }

    /// Returns the normalised id.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RegionId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl<'de> Deserialize<'de> for RegionId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Self::new(&raw).map_err(serde::de::Error::custom)
    }
}

impl AsRef<str> for RegionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Stable unique identifier of a player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(Uuid);

impl PlayerId {
    /// Creates a random player id.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a player ID from an existing UUID.
    #[must_use]
    pub const fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Returns the underlying UUID.
    #[must_use]
    pub const fn as_uuid(&self) -> Uuid {
        self.0
    }

    /// Parses a player ID from a string.
    pub fn parse(s: &str) -> Result<Self, Error> {
        Ok(Self(Uuid::parse_str(s.trim())?))
    }
}

impl Default for PlayerId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for PlayerId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
