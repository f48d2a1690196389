//! Configuration loading and store location resolution
//!
//! Bootstrap configuration is a small TOML document. Everything it names can
//! also be given on the command line; the region rules themselves live in a
//! separate versioned document loaded by the curation crate.
//!
//! # Database path priority
//! 1. Command-line argument (highest priority)
//! 2. `EVCAT_DATABASE` environment variable
//! 3. `database_path` in the TOML config file
//! 4. Compiled default `data/events.db`

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable naming the store location
pub const DATABASE_ENV_VAR: &str = "EVCAT_DATABASE";

/// Store location used when nothing else is configured
pub const DEFAULT_DATABASE_PATH: &str = "data/events.db";

/// Bootstrap configuration loaded from TOML
#[derive(Debug, Clone, Deserialize, Default)]
pub struct TomlConfig {
    /// Path to the SQLite event store
    #[serde(default)]
    pub database_path: Option<PathBuf>,

    /// Operator-maintained region rules document (optional)
    ///
    /// When absent, the rule set bundled with the curation binary is used.
    #[serde(default)]
    pub rules_path: Option<PathBuf>,

    /// Logging configuration (optional)
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Store tuning (optional)
    #[serde(default)]
    pub store: StoreConfig,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// Store tuning
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Maximum time a destructive statement keeps retrying on lock contention
    #[serde(default = "default_max_lock_wait_ms")]
    pub max_lock_wait_ms: u64,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            max_lock_wait_ms: default_max_lock_wait_ms(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_max_lock_wait_ms() -> u64 {
    5000
}

impl TomlConfig {
    /// Parse a config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config file {}: {}", path.display(), e))
        })?;
        Self::parse(&content)
    }

    /// Parse config from TOML text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid config TOML: {}", e)))
    }

    /// Load the explicit config file, or the platform default if present
    ///
    /// An explicit path that cannot be read is an error. A missing default
    /// file is not: built-in defaults are used instead.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        match default_config_path() {
            Some(path) if path.exists() => {
                debug!("Loading config file {}", path.display());
                Self::load(&path)
            }
            _ => {
                debug!("No config file found, using built-in defaults");
                Ok(Self::default())
            }
        }
    }
}

/// Platform config file location (`<config_dir>/evcat/config.toml`)
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("evcat").join("config.toml"))
}

/// Resolve the store location following the documented priority order
pub fn resolve_database_path(cli_arg: Option<&Path>, config: &TomlConfig) -> PathBuf {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return path.to_path_buf();
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(DATABASE_ENV_VAR) {
        if !path.trim().is_empty() {
            return PathBuf::from(path);
        }
        warn!("{} is set but empty, ignoring", DATABASE_ENV_VAR);
    }

    // Priority 3: TOML config file
    if let Some(path) = &config.database_path {
        return path.clone();
    }

    // Priority 4: Compiled default
    PathBuf::from(DEFAULT_DATABASE_PATH)
}
