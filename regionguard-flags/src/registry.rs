//! The flag registry.
//!
//! Owned by the host's context object rather than a process global. Flags
//! are registered during start-up, after which the registry is locked.

use parking_lot::RwLock;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, warn};

use crate::builtin;
use crate::error::{FlagError, FlagResult};
use crate::flag::Flag;
use crate::group::RegionGroup;
use crate::value::FlagValue;

#[derive(Default)]
struct RegistryInner {
    by_name: HashMap<String, Arc<Flag>>,
    by_code: HashMap<char, Arc<Flag>>,
}

/// Name → flag lookup table.
#[derive(Default)]
pub struct FlagRegistry {
    inner: RwLock<RegistryInner>,
    locked: AtomicBool,
}

/// Result of reading a persisted flag map through the registry.
#[derive(Debug, Default)]
pub struct UnmarshalledFlags {
    /// Values of registered flags.
    pub values: Vec<(Arc<Flag>, FlagValue)>,
    /// `-group` sub-settings of registered flags.
    pub groups: Vec<(Arc<Flag>, RegionGroup)>,
    /// Entries for flags this registry does not know, kept verbatim.
    pub unknown: BTreeMap<String, Value>,
}

impl FlagRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry pre-populated with the builtin flags.
    #[must_use]
    pub fn with_builtins() -> Self {
        let registry = Self::new();
        registry.register_all(builtin::builtin_flags());
        registry
    }

    /// Registers a flag.
    ///
    /// Fails with [`FlagError::DuplicateRegistration`] if the name or legacy
    /// code is taken, and with [`FlagError::RegistryLocked`] after
    /// [`FlagRegistry::lock`].
    pub fn register(&self, flag: Flag) -> FlagResult<Arc<Flag>> {
        if self.is_locked() {
            return Err(FlagError::RegistryLocked(flag.name().to_string()));
        }

        let mut inner = self.inner.write();
        if inner.by_name.contains_key(flag.name()) {
            return Err(FlagError::DuplicateRegistration(flag.name().to_string()));
        }
        if let Some(code) = flag.legacy_code() {
            if inner.by_code.contains_key(&code) {
                return Err(FlagError::DuplicateRegistration(format!(
                    "{} (legacy code '{code}')",
                    flag.name()
                )));
            }
        }

        let flag = Arc::new(flag);
        inner.by_name.insert(flag.name().to_string(), Arc::clone(&flag));
        if let Some(code) = flag.legacy_code() {
            inner.by_code.insert(code, Arc::clone(&flag));
        }
        debug!(flag = %flag.name(), "registered flag");
        Ok(flag)
    }

    /// Registers many flags, logging and skipping the ones that conflict.
    pub fn register_all(&self, flags: impl IntoIterator<Item = Flag>) -> usize {
        let mut registered = 0;
        for flag in flags {
            let name = flag.name().to_string();
            match self.register(flag) {
                Ok(_) => registered += 1,
                Err(e) => warn!(flag = %name, "skipping flag registration: {}", e),
            }
        }
        registered
    }

    /// Stops accepting new flags.
    pub fn lock(&self) {
        self.locked.store(true, Ordering::Release);
    }

    #[must_use]
    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Acquire)
    }

    /// Looks up a flag by name, case-insensitively.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<Flag>> {
        self.inner.read().by_name.get(&name.to_ascii_lowercase()).cloned()
    }

    /// Looks up a flag by its single-character legacy code.
    #[must_use]
    pub fn get_by_code(&self, code: char) -> Option<Arc<Flag>> {
        self.inner.read().by_code.get(&code).cloned()
    }

    /// All registered flags, sorted by name.
    #[must_use]
    pub fn all(&self) -> Vec<Arc<Flag>> {
        let mut flags: Vec<_> = self.inner.read().by_name.values().cloned().collect();
        flags.sort_by(|a, b| a.name().cmp(b.name()));
        flags
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().by_name.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Interprets a persisted flag map.
    ///
    /// Values that fail to unmarshal are logged and dropped. Keys of the form
    /// `<flag>-group` are read as region groups of `<flag>`. Entries for
    /// unknown flags are kept raw when `keep_unknown` is set.
    #[must_use]
    pub fn unmarshal_map(&self, raw: &BTreeMap<String, Value>, keep_unknown: bool) -> UnmarshalledFlags {
        let mut out = UnmarshalledFlags::default();

        for (key, value) in raw {
            if let Some(flag) = self.get(key) {
                match flag.unmarshal(value) {
                    Ok(v) => out.values.push((flag, v)),
                    Err(e) => warn!(flag = %key, value = %value, "dropping malformed flag value: {}", e),
                }
                continue;
            }

            let group_of = key
                .strip_suffix("-group")
                .and_then(|base| self.get(base))
                .filter(|f| f.group_default().is_some());
            if let Some(flag) = group_of {
                match value.as_str().map(RegionGroup::parse) {
                    Some(Ok(group)) => out.groups.push((flag, group)),
                    _ => warn!(flag = %key, value = %value, "dropping malformed region group"),
                }
                continue;
            }

            if keep_unknown {
                out.unknown.insert(key.to_ascii_lowercase(), value.clone());
            } else {
                debug!(flag = %key, "dropping unknown flag");
            }
        }

        out
    }
}

impl std::fmt::Debug for FlagRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlagRegistry")
            .field("flags", &self.len())
            .field("locked", &self.is_locked())
            .finish()
    }
}
