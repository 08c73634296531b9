//! Flag descriptors.

use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{FlagError, FlagResult};
use crate::group::RegionGroup;
use crate::state::State;
use crate::value::{FlagValue, Location};

/// Maximum length of a flag name.
const MAX_NAME_LEN: usize = 40;

/// Input for parsing a flag value from user text.
#[derive(Debug, Clone, Copy)]
pub struct FlagContext<'a> {
    /// The raw text typed by the user.
    pub input: &'a str,
    /// Where the user stands, for `here` in location flags.
    pub location: Option<&'a Location>,
}

impl<'a> FlagContext<'a> {
    #[must_use]
    pub const fn new(input: &'a str) -> Self {
        Self {
            input,
            location: None,
        }
    }

    #[must_use]
    pub const fn at(mut self, location: &'a Location) -> Self {
        self.location = Some(location);
        self
    }

    const fn with_input(self, input: &'a str) -> Self {
        Self {
            input,
            location: self.location,
        }
    }
}

/// Extension point for flag value types the engine does not know about.
///
/// Custom values are kept in their marshalled JSON form.
pub trait CustomFlagType: fmt::Debug + Send + Sync {
    /// Short name shown in diagnostics.
    fn type_name(&self) -> &str;

    /// Parses user text into the marshalled form.
    fn parse(&self, context: &FlagContext<'_>) -> FlagResult<Value>;

    /// Checks that a persisted value is well-formed.
    fn validate(&self, raw: &Value) -> FlagResult<()>;
}

/// The value type of a flag.
#[derive(Debug, Clone)]
pub enum FlagKind {
    State,
    Boolean,
    String,
    Integer,
    Double,
    Location,
    RegionGroup,
    /// A fixed set of uppercase variant names.
    Enum(Vec<String>),
    Set(Box<FlagKind>),
    Custom(Arc<dyn CustomFlagType>),
}

impl FlagKind {
    /// Human-readable name of the type.
    #[must_use]
    pub fn type_name(&self) -> String {
        match self {
            Self::State => "state".into(),
            Self::Boolean => "boolean".into(),
            Self::String => "string".into(),
            Self::Integer => "integer".into(),
            Self::Double => "double".into(),
            Self::Location => "location".into(),
            Self::RegionGroup => "region group".into(),
            Self::Enum(_) => "enum".into(),
            Self::Set(inner) => format!("set of {}", inner.type_name()),
            Self::Custom(custom) => custom.type_name().to_string(),
        }
    }

    /// Parses user text. `Ok(None)` means the input clears the value.
    pub fn parse(&self, context: &FlagContext<'_>) -> FlagResult<Option<FlagValue>> {
        let input = context.input.trim();
        let value = match self {
            Self::State => return Ok(State::parse(input)?.map(FlagValue::State)),
            Self::Boolean => FlagValue::Boolean(parse_bool(input)?),
            Self::String => FlagValue::String(context.input.replace("\\n", "\n")),
            Self::Integer => FlagValue::Integer(
                input
                    .parse()
                    .map_err(|_| FlagError::format(format!("not an integer: '{input}'")))?,
            ),
            Self::Double => FlagValue::Double(parse_double(input)?),
            Self::Location => FlagValue::Location(parse_location(input, context.location)?),
            Self::RegionGroup => FlagValue::RegionGroup(RegionGroup::parse(input)?),
            Self::Enum(variants) => FlagValue::Enum(match_variant(variants, input)?),
            Self::Set(inner) => {
                let mut items = Vec::new();
                for part in input.split(',').map(str::trim).filter(|p| !p.is_empty()) {
                    if let Some(item) = inner.parse(&context.with_input(part))? {
                        if !items.contains(&item) {
                            items.push(item);
                        }
                    }
                }
                FlagValue::Set(items)
            }
            Self::Custom(custom) => FlagValue::Custom(custom.parse(context)?),
        };
        Ok(Some(value))
    }

    /// Converts a value to its persisted form.
    pub fn marshal(&self, value: &FlagValue) -> FlagResult<Value> {
        let raw = match (self, value) {
            (Self::State, FlagValue::State(s)) => Value::from(s.as_str()),
            (Self::Boolean, FlagValue::Boolean(b)) => Value::from(*b),
            (Self::String, FlagValue::String(s)) => Value::from(s.as_str()),
            (Self::Integer, FlagValue::Integer(i)) => Value::from(*i),
            (Self::Double, FlagValue::Double(d)) => Value::from(*d),
            (Self::Location, FlagValue::Location(l)) => serde_json::to_value(l)
                .map_err(|e| FlagError::format(format!("location: {e}")))?,
            (Self::RegionGroup, FlagValue::RegionGroup(g)) => Value::from(g.as_str()),
            (Self::Enum(variants), FlagValue::Enum(v)) => {
                Value::from(match_variant(variants, v)?)
            }
            (Self::Set(inner), FlagValue::Set(items)) => Value::Array(
                items
                    .iter()
                    .map(|item| inner.marshal(item))
                    .collect::<FlagResult<Vec<_>>>()?,
            ),
            (Self::Custom(custom), FlagValue::Custom(v)) => {
                custom.validate(v)?;
                v.clone()
            }
            (kind, value) => {
                return Err(FlagError::format(format!(
                    "value '{value}' is not a {}",
                    kind.type_name()
                )));
            }
        };
        Ok(raw)
    }

    /// Reads a persisted value.
    pub fn unmarshal(&self, raw: &Value) -> FlagResult<FlagValue> {
        let mismatch = || FlagError::format(format!("'{raw}' is not a {}", self.type_name()));

        match self {
            Self::State => {
                let s = raw.as_str().ok_or_else(mismatch)?;
                State::parse(s)?.map(FlagValue::State).ok_or_else(mismatch)
            }
            Self::Boolean => match raw {
                Value::Bool(b) => Ok(FlagValue::Boolean(*b)),
                Value::String(s) => parse_bool(s).map(FlagValue::Boolean),
                _ => Err(mismatch()),
            },
            Self::String => raw
                .as_str()
                .map(|s| FlagValue::String(s.to_string()))
                .ok_or_else(mismatch),
            Self::Integer => match raw {
                Value::Number(n) => n.as_i64().map(FlagValue::Integer).ok_or_else(mismatch),
                Value::String(s) => s.trim().parse().map(FlagValue::Integer).map_err(|_| mismatch()),
                _ => Err(mismatch()),
            },
            Self::Double => match raw {
                Value::Number(n) => n.as_f64().map(FlagValue::Double).ok_or_else(mismatch),
                Value::String(s) => parse_double(s).map(FlagValue::Double),
                _ => Err(mismatch()),
            },
            Self::Location => serde_json::from_value(raw.clone())
                .map(FlagValue::Location)
                .map_err(|e| FlagError::format(format!("location: {e}"))),
            Self::RegionGroup => {
                let s = raw.as_str().ok_or_else(mismatch)?;
                RegionGroup::parse(s).map(FlagValue::RegionGroup)
            }
            Self::Enum(variants) => {
                let s = raw.as_str().ok_or_else(mismatch)?;
                match_variant(variants, s).map(FlagValue::Enum)
            }
            Self::Set(inner) => {
                let items = raw.as_array().ok_or_else(mismatch)?;
                let mut values = Vec::with_capacity(items.len());
                for item in items {
                    match inner.unmarshal(item) {
                        Ok(v) if !values.contains(&v) => values.push(v),
                        Ok(_) => {}
                        Err(e) => tracing::debug!(item = %item, "dropping set element: {}", e),
                    }
                }
                Ok(FlagValue::Set(values))
            }
            Self::Custom(custom) => {
                custom.validate(raw)?;
                Ok(FlagValue::Custom(raw.clone()))
            }
        }
    }
}

fn parse_bool(input: &str) -> FlagResult<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "allow" => Ok(true),
        "false" | "no" | "off" | "deny" => Ok(false),
        other => Err(FlagError::format(format!("not a boolean: '{other}'"))),
    }
}

fn parse_double(input: &str) -> FlagResult<f64> {
    input
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|d| d.is_finite())
        .ok_or_else(|| FlagError::format(format!("not a number: '{input}'")))
}

fn match_variant(variants: &[String], input: &str) -> FlagResult<String> {
    variants
        .iter()
        .find(|v| v.eq_ignore_ascii_case(input.trim()))
        .cloned()
        .ok_or_else(|| {
            FlagError::format(format!(
                "'{input}' is not one of {}",
                variants.join(", ").to_ascii_lowercase()
            ))
        })
}

fn parse_location(input: &str, here: Option<&Location>) -> FlagResult<Location> {
    if input.eq_ignore_ascii_case("here") {
        return here
            .cloned()
            .ok_or_else(|| FlagError::format("'here' needs a current location"));
    }

    let parts = input
        .split(',')
        .map(parse_double)
        .collect::<FlagResult<Vec<f64>>>()?;
    let world = here
        .map(|l| l.world.clone())
        .ok_or_else(|| FlagError::format("coordinates need a current world"))?;

    match parts.as_slice() {
        [x, y, z] => Ok(Location::new(world, *x, *y, *z)),
        [x, y, z, yaw, pitch] => Ok(Location {
            yaw: *yaw as f32,
            pitch: *pitch as f32,
            ..Location::new(world, *x, *y, *z)
        }),
        _ => Err(FlagError::format(format!(
            "expected x,y,z or x,y,z,yaw,pitch but got '{input}'"
        ))),
    }
}

/// A named, typed region setting.
#[derive(Debug, Clone)]
pub struct Flag {
    name: String,
    legacy_code: Option<char>,
    kind: FlagKind,
    default: Option<FlagValue>,
    group_default: Option<RegionGroup>,
    uses_membership_as_default: bool,
    implicitly_set_with_membership: bool,
    prevents_allow_on_global: bool,
}

impl Flag {
    /// Creates a flag after validating its name.
    ///
    /// Every flag except region-group flags gets a `<name>-group`
    /// sub-setting defaulting to [`RegionGroup::All`].
    pub fn new(name: &str, kind: FlagKind) -> FlagResult<Self> {
        if !Self::is_valid_name(name) {
            return Err(FlagError::InvalidName(name.to_string()));
        }
        Ok(Self::unchecked(name, kind))
    }

    pub(crate) fn unchecked(name: &str, kind: FlagKind) -> Self {
        let group_default = match kind {
            FlagKind::RegionGroup => None,
            _ => Some(RegionGroup::All),
        };
        Self {
            name: name.to_ascii_lowercase(),
            legacy_code: None,
            kind,
            default: None,
            group_default,
            uses_membership_as_default: false,
            implicitly_set_with_membership: false,
            prevents_allow_on_global: false,
        }
    }

    /// Shorthand for a state flag with an optional default.
    pub fn state(name: &str, default: Option<State>) -> FlagResult<Self> {
        Ok(Self::new(name, FlagKind::State)?.with_default(default.map(FlagValue::State)))
    }

    #[must_use]
    pub fn is_valid_name(name: &str) -> bool {
        !name.is_empty()
            && name.len() <= MAX_NAME_LEN
            && name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == ':' || c == '-')
    }

    #[must_use]
    pub fn with_legacy_code(mut self, code: char) -> Self {
        self.legacy_code = Some(code);
        self
    }

    #[must_use]
    pub fn with_default(mut self, default: Option<FlagValue>) -> Self {
        self.default = default;
        self
    }

    #[must_use]
    pub fn with_group_default(mut self, group: RegionGroup) -> Self {
        if !matches!(self.kind, FlagKind::RegionGroup) {
            self.group_default = Some(group);
        }
        self
    }

    /// Makes region membership decide the flag when no region sets it, and
    /// forbids ALLOW on the global region. Used by `build`.
    #[must_use]
    pub fn with_membership_defaults(mut self) -> Self {
        self.uses_membership_as_default = true;
        self.implicitly_set_with_membership = true;
        self.prevents_allow_on_global = true;
        self
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub const fn legacy_code(&self) -> Option<char> {
        self.legacy_code
    }

    #[must_use]
    pub const fn kind(&self) -> &FlagKind {
        &self.kind
    }

    #[must_use]
    pub const fn default_value(&self) -> Option<&FlagValue> {
        self.default.as_ref()
    }

    /// The default of the `-group` sub-setting, if the flag has one.
    #[must_use]
    pub const fn group_default(&self) -> Option<RegionGroup> {
        self.group_default
    }

    /// Key of the `-group` sub-setting in a region's flag map.
    #[must_use]
    pub fn group_key(&self) -> String {
        format!("{}-group", self.name)
    }

    #[must_use]
    pub const fn is_state(&self) -> bool {
        matches!(self.kind, FlagKind::State)
    }

    #[must_use]
    pub const fn uses_membership_as_default(&self) -> bool {
        self.uses_membership_as_default
    }

    #[must_use]
    pub const fn implicitly_set_with_membership(&self) -> bool {
        self.implicitly_set_with_membership
    }

    #[must_use]
    pub const fn prevents_allow_on_global(&self) -> bool {
        self.prevents_allow_on_global
    }

    /// Parses user text for this flag.
    pub fn parse_input(&self, context: &FlagContext<'_>) -> FlagResult<Option<FlagValue>> {
        self.kind.parse(context)
    }

    pub fn marshal(&self, value: &FlagValue) -> FlagResult<Value> {
        self.kind.marshal(value)
    }

    pub fn unmarshal(&self, raw: &Value) -> FlagResult<FlagValue> {
        self.kind.unmarshal(raw)
    }

    /// Picks the effective value out of the values collected at one level of
    /// specificity.
    ///
    /// State flags let ALLOW dominate DENY; every other kind takes the first
    /// value, which is the most specific one.
    #[must_use]
    pub fn choose_value(&self, values: Vec<FlagValue>) -> Option<FlagValue> {
        if self.is_state() {
            State::allow_dominant(values.iter().filter_map(FlagValue::as_state))
                .map(FlagValue::State)
        } else {
            values.into_iter().next()
        }
    }
}

impl fmt::Display for Flag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}
