//! # Reconciliation Configuration
//!
//! ## Configuration Sources
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Configuration Priority                               │
//! │                                                                         │
//! │  1. Environment Variables (highest priority)                           │
//! │     CELLAR_DB_PATH=/var/lib/cellar/cellar.db                           │
//! │     CELLAR_DEFAULT_TOLERANCE=7.5                                       │
//! │     CELLAR_INCLUDE_ZERO_QTY=true                                       │
//! │     CELLAR_NOTIFY_OVER_TOLERANCE=false                                 │
//! │                                                                         │
//! │  2. TOML Config File                                                   │
//! │     ~/.config/cellar/cellar.toml (Linux)                               │
//! │     ~/Library/Application Support/com.cellar.cellar/cellar.toml (macOS)│
//! │                                                                         │
//! │  3. Default Values (lowest priority)                                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A store's own tolerance (in `store_settings`) always beats
//! `default_tolerance_percent`, which only applies to stores without one.
//!
//! ## Configuration File Format
//! ```toml
//! [database]
//! path = "cellar.db"
//! max_connections = 5
//!
//! [reconcile]
//! default_tolerance_percent = 5.0
//! include_zero_qty = false
//! notify_over_tolerance = true
//! ```

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

use crate::error::ConfigError;
use cellar_core::validation::validate_tolerance_percent;
use cellar_core::DEFAULT_TOLERANCE_PERCENT;
use cellar_db::DbConfig;

// =============================================================================
// Database Settings
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatabaseSettings {
    /// SQLite file; created on first use.
    #[serde(default = "default_db_path")]
    pub path: PathBuf,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_db_path() -> PathBuf {
    PathBuf::from("cellar.db")
}

fn default_max_connections() -> u32 {
    5
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        DatabaseSettings {
            path: default_db_path(),
            max_connections: default_max_connections(),
        }
    }
}

// =============================================================================
// Reconcile Settings
// =============================================================================

/// Engine behavior knobs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconcileSettings {
    /// Tolerance for stores that have no setting of their own.
    #[serde(default = "default_tolerance")]
    pub default_tolerance_percent: f64,

    /// Whether zero-quantity POS items are stored in the ingest batch when
    /// the caller doesn't say.
    #[serde(default)]
    pub include_zero_qty: bool,

    /// Whether over-tolerance runs reach the notifier.
    #[serde(default = "default_true")]
    pub notify_over_tolerance: bool,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE_PERCENT
}

fn default_true() -> bool {
    true
}

impl Default for ReconcileSettings {
    fn default() -> Self {
        ReconcileSettings {
            default_tolerance_percent: default_tolerance(),
            include_zero_qty: false,
            notify_over_tolerance: true,
        }
    }
}

// =============================================================================
// Main Configuration
// =============================================================================

/// Complete engine configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReconConfig {
    #[serde(default)]
    pub database: DatabaseSettings,

    #[serde(default)]
    pub reconcile: ReconcileSettings,
}

impl ReconConfig {
    /// Loads configuration from file, environment, and defaults.
    ///
    /// ## Load Order (later overrides earlier)
    /// 1. Default values
    /// 2. Config file (`cellar.toml`)
    /// 3. Environment variables
    pub fn load(config_path: Option<PathBuf>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(path) = config_path.or_else(Self::default_config_path) {
            if path.exists() {
                info!(?path, "Loading config from file");
                let contents = std::fs::read_to_string(&path)?;
                config = toml::from_str(&contents)?;
            } else {
                debug!(?path, "Config file not found, using defaults");
            }
        }

        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()?;

        Ok(config)
    }

    /// Loads config or returns default if load fails.
    pub fn load_or_default(config_path: Option<PathBuf>) -> Self {
        Self::load(config_path).unwrap_or_else(|e| {
            warn!("Failed to load config: {}. Using defaults.", e);
            Self::default()
        })
    }

    /// Saves configuration to file.
    pub fn save(&self, config_path: Option<PathBuf>) -> Result<(), ConfigError> {
        let path = config_path
            .or_else(Self::default_config_path)
            .ok_or_else(|| ConfigError::SaveFailed("No config path available".into()))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| ConfigError::SaveFailed(e.to_string()))?;
        }

        let contents = toml::to_string_pretty(self)?;
        std::fs::write(&path, contents).map_err(|e| ConfigError::SaveFailed(e.to_string()))?;

        info!(?path, "Config saved");
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_tolerance_percent(self.reconcile.default_tolerance_percent).map_err(|e| {
            ConfigError::Invalid(format!("reconcile.default_tolerance_percent: {}", e))
        })?;

        if self.database.max_connections == 0 {
            return Err(ConfigError::Invalid(
                "database.max_connections must be greater than 0".into(),
            ));
        }

        if self.database.path.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("database.path must not be empty".into()));
        }

        Ok(())
    }

    /// Applies overrides read through `lookup` (the process environment in
    /// [`ReconConfig::load`]). Unparseable values are ignored with a warning.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CELLAR_DB_PATH") {
            debug!(path = %path, "Overriding database path from environment");
            self.database.path = PathBuf::from(path);
        }

        if let Some(value) = lookup("CELLAR_DEFAULT_TOLERANCE") {
            match value.trim().parse::<f64>() {
                Ok(percent) => self.reconcile.default_tolerance_percent = percent,
                Err(_) => warn!(value = %value, "Ignoring unparseable CELLAR_DEFAULT_TOLERANCE"),
            }
        }

        if let Some(value) = lookup("CELLAR_INCLUDE_ZERO_QTY") {
            match parse_flag(&value) {
                Some(flag) => self.reconcile.include_zero_qty = flag,
                None => warn!(value = %value, "Ignoring unparseable CELLAR_INCLUDE_ZERO_QTY"),
            }
        }

        if let Some(value) = lookup("CELLAR_NOTIFY_OVER_TOLERANCE") {
            match parse_flag(&value) {
                Some(flag) => self.reconcile.notify_over_tolerance = flag,
                None => warn!(value = %value, "Ignoring unparseable CELLAR_NOTIFY_OVER_TOLERANCE"),
            }
        }
    }

    /// Returns the default config file path.
    fn default_config_path() -> Option<PathBuf> {
        directories::ProjectDirs::from("com", "cellar", "cellar")
            .map(|dirs| dirs.config_dir().join("cellar.toml"))
    }

    /// Pool settings for [`cellar_db::Database::new`].
    pub fn db_config(&self) -> DbConfig {
        DbConfig::new(&self.database.path).max_connections(self.database.max_connections)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
