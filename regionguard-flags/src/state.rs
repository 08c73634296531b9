//! ALLOW/DENY state values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FlagError, FlagResult};

/// The value of a state flag.
///
/// The third state, NONE, is represented by the absence of a value
/// (`Option::<State>::None`) everywhere in the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Allow,
    Deny,
}

impl State {
    /// Parses user text. `none` clears the value.
    pub fn parse(input: &str) -> FlagResult<Option<Self>> {
        match input.trim().to_ascii_lowercase().as_str() {
            "allow" => Ok(Some(Self::Allow)),
            "deny" => Ok(Some(Self::Deny)),
            "none" => Ok(None),
            other => Err(FlagError::format(format!(
                "expected allow, deny or none but got '{other}'"
            ))),
        }
    }

    /// Returns true only for an explicit ALLOW.
    #[must_use]
    pub fn test(state: Option<Self>) -> bool {
        state == Some(Self::Allow)
    }

    /// Combines states where DENY overrides ALLOW and NONE is ignored.
    ///
    /// Used when several flags are tested together.
    #[must_use]
    pub fn combine(states: impl IntoIterator<Item = Option<Self>>) -> Option<Self> {
        let mut result = None;
        for state in states.into_iter().flatten() {
            match state {
                Self::Deny => return Some(Self::Deny),
                Self::Allow => result = Some(Self::Allow),
            }
        }
        result
    }

    /// Resolves values collected for one flag: any ALLOW wins, then DENY.
    #[must_use]
    pub fn allow_dominant(states: impl IntoIterator<Item = Self>) -> Option<Self> {
        let mut result = None;
        for state in states {
            match state {
                Self::Allow => return Some(Self::Allow),
                Self::Deny => result = Some(Self::Deny),
            }
        }
        result
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Allow => "allow",
            Self::Deny => "deny",
        }
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<bool> for State {
    fn from(allow: bool) -> Self {
        if allow { Self::Allow } else { Self::Deny }
    }
}
