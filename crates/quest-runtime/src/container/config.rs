//! # Runtime Configuration
//!
//! Unified configuration for the subsystems and runtime parameters.
//!
//! Values are layered: built-in defaults, then the TOML file named by
//! `QL_CONFIG` (if any), then individual `QL_*` environment variables.

use std::path::{Path, PathBuf};

use ql_01_progression::ProgressionConfig;
use ql_02_recommendation_sync::DEFAULT_BASE_URL;
use serde::{Deserialize, Serialize};
use shared_bus::DEFAULT_CHANNEL_CAPACITY;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid value for {var}: {value:?}")]
    InvalidValue { var: &'static str, value: String },

    #[error("Storage backend '{0}' is not compiled into this binary")]
    BackendUnavailable(String),
}

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Progression rule switches.
    pub progression: ProgressionConfig,
    /// Recommendation service configuration.
    pub recommendation: RecommendationConfig,
    /// Event bus configuration.
    pub bus: BusConfig,
    /// Catalog seeding.
    pub seed: SeedConfig,
}

/// Which store backs the progression engine.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    #[default]
    Memory,
    Rocksdb,
}

impl std::str::FromStr for StorageBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "rocksdb" => Ok(Self::Rocksdb),
            _ => Err(ConfigError::InvalidValue {
                var: "QL_STORAGE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// Storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: StorageBackend,
    /// Data directory of the RocksDB backend.
    pub data_dir: PathBuf,
    /// fsync every commit.
    pub sync_writes: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: StorageBackend::Memory,
            data_dir: PathBuf::from("./data/questline"),
            sync_writes: true,
        }
    }
}

/// Recommendation service configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendationConfig {
    pub enabled: bool,
    pub base_url: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 5,
        }
    }
}

/// Event bus configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusConfig {
    pub capacity: usize,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CHANNEL_CAPACITY,
        }
    }
}

/// Catalog seeding.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    /// TOML catalog loaded on startup when the store has no quests yet.
    pub catalog: Option<PathBuf>,
}

impl RuntimeConfig {
    /// Load from `QL_CONFIG` and the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var("QL_CONFIG") {
            Ok(path) => Self::from_file(path)?,
            Err(_) => Self::default(),
        };
        config.apply_overrides(|var| std::env::var(var).ok())?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Apply `QL_*` overrides looked up through `var`.
    pub fn apply_overrides(
        &mut self,
        var: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(value) = var("QL_STORAGE_BACKEND") {
            self.storage.backend = value.parse()?;
        }
        if let Some(value) = var("QL_DATA_DIR") {
            self.storage.data_dir = PathBuf::from(value);
        }
        if let Some(value) = var("QL_SYNC_WRITES") {
            self.storage.sync_writes = parse_bool("QL_SYNC_WRITES", value)?;
        }
        if let Some(value) = var("QL_ENFORCE_SEQUENTIAL") {
            self.progression.enforce_sequential = parse_bool("QL_ENFORCE_SEQUENTIAL", value)?;
        }
        if let Some(value) = var("QL_RECOMMENDATION_ENABLED") {
            self.recommendation.enabled = parse_bool("QL_RECOMMENDATION_ENABLED", value)?;
        }
        if let Some(value) = var("QL_RECOMMENDATION_URL") {
            self.recommendation.base_url = value;
        }
        if let Some(value) = var("QL_RECOMMENDATION_TIMEOUT_SECS") {
            self.recommendation.timeout_secs = value
                .parse()
                .map_err(|_| ConfigError::InvalidValue {
                    var: "QL_RECOMMENDATION_TIMEOUT_SECS",
                    value,
                })?;
        }
        if let Some(value) = var("QL_BUS_CAPACITY") {
            self.bus.capacity = match value.parse() {
                Ok(capacity) if capacity > 0 => capacity,
                _ => {
                    return Err(ConfigError::InvalidValue {
                        var: "QL_BUS_CAPACITY",
                        value,
                    })
                }
            };
        }
        if let Some(value) = var("QL_CATALOG") {
            self.seed.catalog = Some(PathBuf::from(value));
        }
        Ok(())
    }

    /// Reject combinations this build cannot run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.backend == StorageBackend::Rocksdb && !cfg!(feature = "rocksdb") {
            return Err(ConfigError::BackendUnavailable("rocksdb".into()));
        }
        Ok(())
    }
}

fn parse_bool(var: &'static str, value: String) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue { var, value }),
    }
}
