//! Engine configuration, read from `regionguard.toml`.
//!
//! ```toml
//! [storage]
//! directory = "worlds"
//! keep-unresolved-names = true
//!
//! [regions]
//! use-max-priority-association = false
//! max-chunk-span = 1024
//! prefer-cached-queries = false
//! max-regions-per-player = 7
//! ```

use regionguard_index::DEFAULT_MAX_CHUNK_SPAN;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// File name of each world's region document.
pub const REGION_FILE: &str = "regions.json";

/// Errors from parsing or validating a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid config value for '{key}': {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Where and how regions are persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct StorageConfig {
    /// Root directory; each world's regions live in `<directory>/<world>/regions.json`.
    pub directory: PathBuf,
    /// Whether names that cannot be resolved to ids survive a migration.
    pub keep_unresolved_names: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("worlds"),
            keep_unresolved_names: true,
        }
    }
}

/// Region query and claim behaviour.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct RegionsConfig {
    /// Source regions only count as owners of the regions they overlap if
    /// they have the highest priority among the source set.
    pub use_max_priority_association: bool,
    /// Regions covering more chunks than this are scanned on every query.
    pub max_chunk_span: u64,
    /// Restrict point queries to the cached subset of regions.
    pub prefer_cached_queries: bool,
    /// How many regions one player may own through claims. Zero means no limit.
    pub max_regions_per_player: usize,
}

impl Default for RegionsConfig {
    fn default() -> Self {
        Self {
            use_max_priority_association: false,
            max_chunk_span: DEFAULT_MAX_CHUNK_SPAN,
            prefer_cached_queries: false,
            max_regions_per_player: 7,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub storage: StorageConfig,
    pub regions: RegionsConfig,
}

impl EngineConfig {
    /// Parses and validates a TOML document. Missing keys take defaults.
    pub fn from_toml_str(toml_str: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(toml_str)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads the configuration at `path`.
    ///
    /// A missing file yields the defaults. An unreadable or invalid file also
    /// yields the defaults, with a warning, so a typo never stops the host.
    pub fn load_from(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            info!("No config file found at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match Self::from_toml_str(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to load config file {:?}: {}. Falling back to defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.regions.max_chunk_span == 0 {
            return Err(ConfigError::Invalid {
                key: "regions.max-chunk-span",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.storage.directory.as_os_str().is_empty() {
            return Err(ConfigError::Invalid {
                key: "storage.directory",
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }

    /// Path of the region document for `world`.
    #[must_use]
    pub fn region_file(&self, world: &str) -> PathBuf {
        self.storage.directory.join(world).join(REGION_FILE)
    }
}
