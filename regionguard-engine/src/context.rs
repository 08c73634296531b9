//! The explicit engine context.
//!
//! Everything a host would otherwise reach through process-wide singletons
//! (the flag registry, custom domain types, per-world managers) lives in a
//! [`GuardContext`] the host constructs and passes around.

use parking_lot::RwLock;
use regionguard_flags::{Flag, FlagRegistry};
use regionguard_region::{DomainFactory, DomainRegistry};
use regionguard_storage::{JsonRegionDriver, RegionDriver};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::manager::RegionManager;

/// Collects extension flags and domain types before the registries lock.
pub struct GuardContextBuilder {
    config: EngineConfig,
    flags: Vec<Flag>,
    domains: Vec<(String, DomainFactory)>,
}

impl GuardContextBuilder {
    /// Registers an extra flag next to the builtins.
    #[must_use]
    pub fn flag(mut self, flag: Flag) -> Self {
        self.flags.push(flag);
        self
    }

    /// Registers a custom domain type.
    #[must_use]
    pub fn domain(mut self, type_name: &str, factory: DomainFactory) -> Self {
        self.domains.push((type_name.to_string(), factory));
        self
    }

    /// Builds the context and locks the flag registry.
    ///
    /// A flag or domain type registered twice, or clashing with a builtin,
    /// fails with a duplicate-registration error.
    pub fn build(self) -> EngineResult<GuardContext> {
        let flags = FlagRegistry::with_builtins();
        for flag in self.flags {
            flags.register(flag)?;
        }
        flags.lock();

        let domains = DomainRegistry::new();
        for (type_name, factory) in self.domains {
            domains.register(&type_name, factory)?;
        }

        info!(flags = flags.len(), "regionguard context ready");
        Ok(GuardContext {
            config: Arc::new(self.config),
            flags: Arc::new(flags),
            domains: Arc::new(domains),
            worlds: RwLock::new(HashMap::new()),
        })
    }
}

/// Owns the registries and the region manager of every loaded world.
pub struct GuardContext {
    config: Arc<EngineConfig>,
    flags: Arc<FlagRegistry>,
    domains: Arc<DomainRegistry>,
    worlds: RwLock<HashMap<String, Arc<RegionManager>>>,
}

impl GuardContext {
    /// A context with only the builtin flags.
    pub fn new(config: EngineConfig) -> EngineResult<Self> {
        Self::builder(config).build()
    }

    #[must_use]
    pub fn builder(config: EngineConfig) -> GuardContextBuilder {
        GuardContextBuilder {
            config,
            flags: Vec::new(),
            domains: Vec::new(),
        }
    }

    #[must_use]
    pub fn config(&self) -> &Arc<EngineConfig> {
        &self.config
    }

    #[must_use]
    pub fn flags(&self) -> &Arc<FlagRegistry> {
        &self.flags
    }

    #[must_use]
    pub fn domains(&self) -> &Arc<DomainRegistry> {
        &self.domains
    }

    fn check_world_name(world: &str) -> EngineResult<()> {
        let valid = !world.is_empty()
            && world != "."
            && world != ".."
            && !world.contains(['/', '\\'])
            && !world.chars().any(char::is_control);
        if valid {
            Ok(())
        } else {
            Err(EngineError::InvalidWorldName(world.to_string()))
        }
    }

    /// Loads `world` from its JSON document under the storage directory.
    ///
    /// Returns the existing manager if the world is already loaded.
    pub fn load_world(&self, world: &str) -> EngineResult<Arc<RegionManager>> {
        Self::check_world_name(world)?;
        let driver = JsonRegionDriver::new(
            self.config.region_file(world),
            Arc::clone(&self.flags),
            Arc::clone(&self.domains),
        );
        self.load_world_with(world, Arc::new(driver))
    }

    /// Loads `world` from an explicit store.
    pub fn load_world_with(&self, world: &str, driver: Arc<dyn RegionDriver>) -> EngineResult<Arc<RegionManager>> {
        Self::check_world_name(world)?;
        if let Some(existing) = self.world(world) {
            return Ok(existing);
        }

        let manager = RegionManager::new(world, driver, Arc::clone(&self.flags), Arc::clone(&self.config));
        manager.load()?;
        let manager = Arc::new(manager);

        let mut worlds = self.worlds.write();
        let manager = worlds.entry(world.to_string()).or_insert(manager);
        Ok(Arc::clone(manager))
    }

    #[must_use]
    pub fn world(&self, world: &str) -> Option<Arc<RegionManager>> {
        self.worlds.read().get(world).cloned()
    }

    /// Names of the loaded worlds, sorted.
    #[must_use]
    pub fn worlds(&self) -> Vec<String> {
        let mut names: Vec<String> = self.worlds.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Saves and forgets `world`. The world stays loaded if the save fails.
    pub fn unload_world(&self, world: &str) -> EngineResult<()> {
        let manager = self
            .world(world)
            .ok_or_else(|| EngineError::UnknownWorld(world.to_string()))?;
        manager.save()?;
        self.worlds.write().remove(world);
        info!(world = %world, "world unloaded");
        Ok(())
    }

    /// Saves pending changes of every loaded world.
    ///
    /// Every world is attempted; the first failure is returned.
    pub fn save_all(&self) -> EngineResult<()> {
        let managers: Vec<Arc<RegionManager>> = self.worlds.read().values().cloned().collect();
        let mut first_error = None;
        for manager in managers {
            if let Err(e) = manager.save_changes() {
                warn!(world = %manager.world(), "save failed: {}", e);
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

impl std::fmt::Debug for GuardContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardContext")
            .field("config", &self.config)
            .field("flags", &self.flags.len())
            .field("worlds", &self.worlds())
            .finish()
    }
}

impl std::fmt::Debug for GuardContextBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GuardContextBuilder")
            .field("flags", &self.flags.len())
            .field("domains", &self.domains.len())
            .finish()
    }
}
