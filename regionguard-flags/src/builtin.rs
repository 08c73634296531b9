//! Flags every installation ships with.
//!
//! The registry owns the descriptors; these constants are the names to look
//! them up by.

use crate::flag::{Flag, FlagKind};
use crate::group::RegionGroup;
use crate::state::State;
use crate::value::FlagValue;
use std::sync::LazyLock;

pub const PASSTHROUGH: &str = "passthrough";
pub const BUILD: &str = "build";
pub const INTERACT: &str = "interact";
pub const BLOCK_BREAK: &str = "block-break";
pub const BLOCK_PLACE: &str = "block-place";
pub const USE: &str = "use";
pub const PVP: &str = "pvp";
pub const MOB_SPAWNING: &str = "mob-spawning";
pub const FIRE_SPREAD: &str = "fire-spread";
pub const ENTRY: &str = "entry";
pub const EXIT: &str = "exit";
pub const NOTIFY_ENTER: &str = "notify-enter";
pub const GREETING: &str = "greeting";
pub const FAREWELL: &str = "farewell";
pub const TELEPORT: &str = "teleport";
pub const SPAWN: &str = "spawn";
pub const HEAL_AMOUNT: &str = "heal-amount";
pub const PRICE: &str = "price";
pub const DENY_SPAWN: &str = "deny-spawn";
pub const GAME_MODE: &str = "game-mode";

fn state(name: &str, default: Option<State>) -> Flag {
    Flag::unchecked(name, FlagKind::State).with_default(default.map(FlagValue::State))
}

static PASSTHROUGH_FLAG: LazyLock<Flag> = LazyLock::new(|| state(PASSTHROUGH, None));

/// The passthrough descriptor, which flag resolution consults on every
/// region regardless of the registry in use.
#[must_use]
pub fn passthrough() -> &'static Flag {
    &PASSTHROUGH_FLAG
}

/// Builds the builtin flag descriptors.
#[must_use]
pub fn builtin_flags() -> Vec<Flag> {
    vec![
        passthrough().clone(),
        state(BUILD, None)
            .with_legacy_code('b')
            .with_group_default(RegionGroup::NonMembers)
            .with_membership_defaults(),
        state(INTERACT, None),
        state(BLOCK_BREAK, None),
        state(BLOCK_PLACE, None),
        state(USE, None).with_legacy_code('u'),
        state(PVP, None).with_legacy_code('p'),
        state(MOB_SPAWNING, Some(State::Allow)).with_legacy_code('m'),
        state(FIRE_SPREAD, None).with_legacy_code('f'),
        state(ENTRY, Some(State::Allow)).with_group_default(RegionGroup::NonMembers),
        state(EXIT, Some(State::Allow)).with_group_default(RegionGroup::NonMembers),
        Flag::unchecked(NOTIFY_ENTER, FlagKind::Boolean),
        Flag::unchecked(GREETING, FlagKind::String),
        Flag::unchecked(FAREWELL, FlagKind::String),
        Flag::unchecked(TELEPORT, FlagKind::Location).with_group_default(RegionGroup::Members),
        Flag::unchecked(SPAWN, FlagKind::Location).with_group_default(RegionGroup::Members),
        Flag::unchecked(HEAL_AMOUNT, FlagKind::Integer),
        Flag::unchecked(PRICE, FlagKind::Double),
        Flag::unchecked(DENY_SPAWN, FlagKind::Set(Box::new(FlagKind::String))),
        Flag::unchecked(
            GAME_MODE,
            FlagKind::Enum(
                ["SURVIVAL", "CREATIVE", "ADVENTURE", "SPECTATOR"]
                    .into_iter()
                    .map(String::from)
                    .collect(),
            ),
        ),
    ]
}
