//! Typed flag values.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::group::RegionGroup;
use crate::state::State;

/// A position with orientation in a named world.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: f64,
    pub y: f64,
    pub z: f64,
    #[serde(default)]
    pub yaw: f32,
    #[serde(default)]
    pub pitch: f32,
}

impl Location {
    #[must_use]
    pub fn new(world: impl Into<String>, x: f64, y: f64, z: f64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
            yaw: 0.0,
            pitch: 0.0,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:.1},{:.1},{:.1}", self.world, self.x, self.y, self.z)
    }
}

/// A parsed flag value.
#[derive(Debug, Clone, PartialEq)]
pub enum FlagValue {
    State(State),
    Boolean(bool),
    String(String),
    Integer(i64),
    Double(f64),
    Location(Location),
    RegionGroup(RegionGroup),
    /// Canonical (uppercase) variant name.
    Enum(String),
    Set(Vec<FlagValue>),
    /// Values of custom flag types keep their marshalled form.
    Custom(serde_json::Value),
}

impl FlagValue {
    /// Returns the state if this is a state value.
    #[must_use]
    pub const fn as_state(&self) -> Option<State> {
        match self {
            Self::State(s) => Some(*s),
            _ => None,
        }
    }
}

impl fmt::Display for FlagValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(s) => write!(f, "{s}"),
            Self::Boolean(b) => write!(f, "{b}"),
            Self::String(s) | Self::Enum(s) => f.write_str(s),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Double(d) => write!(f, "{d}"),
            Self::Location(l) => write!(f, "{l}"),
            Self::RegionGroup(g) => write!(f, "{g}"),
            Self::Set(items) => {
                let parts: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", parts.join(","))
            }
            Self::Custom(v) => write!(f, "{v}"),
        }
    }
}

/// Conversion out of a [`FlagValue`] for typed query helpers.
pub trait FromFlagValue: Sized {
    fn from_flag_value(value: &FlagValue) -> Option<Self>;
}

macro_rules! from_flag_value {
    ($ty:ty, $variant:ident) => {
        impl FromFlagValue for $ty {
            fn from_flag_value(value: &FlagValue) -> Option<Self> {
                match value {
                    FlagValue::$variant(v) => Some(v.clone()),
                    _ => None,
                }
            }
        }
    };
}

from_flag_value!(State, State);
from_flag_value!(bool, Boolean);
from_flag_value!(i64, Integer);
from_flag_value!(f64, Double);
from_flag_value!(Location, Location);
from_flag_value!(RegionGroup, RegionGroup);

impl FromFlagValue for String {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::String(s) | FlagValue::Enum(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl<T: FromFlagValue> FromFlagValue for Vec<T> {
    fn from_flag_value(value: &FlagValue) -> Option<Self> {
        match value {
            FlagValue::Set(items) => items.iter().map(T::from_flag_value).collect(),
            _ => None,
        }
    }
}
