//! Region flags for regionguard.
//!
//! A [`Flag`] is a named, typed setting that regions may carry. Values are
//! parsed from user text, stored in a marshalled JSON form, and unmarshalled
//! on demand by the flag value calculator.
//!
//! Flags are registered once into a [`FlagRegistry`] owned by the host's
//! context object; registering the same name twice is an error.

pub mod builtin;
mod error;
mod flag;
mod group;
mod registry;
mod state;
mod value;

pub use error::{FlagError, FlagResult};
pub use flag::{CustomFlagType, Flag, FlagContext, FlagKind};
pub use group::{Association, RegionGroup};
pub use registry::{FlagRegistry, UnmarshalledFlags};
pub use state::State;
pub use value::{FlagValue, FromFlagValue, Location};
