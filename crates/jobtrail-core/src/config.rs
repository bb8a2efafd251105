//! Configuration management for jobtrail.
//!
//! Provides TOML-based configuration with XDG-compliant paths and
//! environment variable overrides.

use crate::error::{ConfigError, ConfigResult};
use crate::types::SiteId;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main application configuration.
///
/// This is loaded from `~/.config/jobtrail/config.toml` (or platform equivalent).
/// If the file doesn't exist, default values are used.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// General application settings
    pub general: GeneralConfig,
    /// Observation scheduler settings
    pub observer: ObserverConfig,
    /// Record store settings
    pub storage: StorageConfig,
    /// Site selection
    pub sites: SitesConfig,
}

impl AppConfig {
    /// Load configuration from the default path, falling back to defaults if not found.
    pub fn load() -> ConfigResult<Self> {
        let config_path = Self::config_path()?;
        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit path, falling back to defaults if not found.
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or is not valid TOML,
    /// or if the parsed values fail validation.
    pub fn load_from(config_path: &Path) -> ConfigResult<Self> {
        let config: Self = if config_path.exists() {
            tracing::debug!("Loading config from {}", config_path.display());
            let contents = fs::read_to_string(config_path)?;
            toml::from_str(&contents)?
        } else {
            tracing::debug!("Config file not found, using defaults");
            Self::default()
        };

        config.validate()?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides.
    ///
    /// Supports the following environment variables:
    /// - `JOBTRAIL_DEBOUNCE_MS`: Override the observer debounce delay
    /// - `JOBTRAIL_DATABASE_PATH`: Override the SQLite database path
    /// - `JOBTRAIL_LOG_LEVEL`: Override the log filter
    pub fn load_with_env() -> ConfigResult<Self> {
        let mut config = Self::load()?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Apply `JOBTRAIL_*` environment overrides in place.
    pub fn apply_env(&mut self) {
        if let Ok(val) = std::env::var("JOBTRAIL_DEBOUNCE_MS") {
            if let Ok(ms) = val.parse() {
                self.observer.debounce_ms = ms;
                tracing::debug!("Override observer.debounce_ms from env: {}", ms);
            }
        }

        if let Ok(val) = std::env::var("JOBTRAIL_DATABASE_PATH") {
            self.storage.database_path = Some(PathBuf::from(&val));
            tracing::debug!("Override storage.database_path from env: {}", val);
        }

        if let Ok(val) = std::env::var("JOBTRAIL_LOG_LEVEL") {
            tracing::debug!("Override general.log_level from env: {}", val);
            self.general.log_level = val;
        }
    }

    /// Check value constraints that serde cannot express.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.observer.debounce_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "observer.debounce_ms".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }

        if self.sites.enabled.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "sites.enabled".to_string(),
                reason: "at least one site must be enabled".to_string(),
            });
        }

        Ok(())
    }

    /// Save configuration to the default path.
    ///
    /// Creates the config directory if it doesn't exist.
    pub fn save(&self) -> ConfigResult<()> {
        let config_path = Self::config_path()?;
        self.save_to(&config_path)
    }

    /// Save configuration to an explicit path.
    pub fn save_to(&self, config_path: &Path) -> ConfigResult<()> {
        let config_dir = config_path
            .parent()
            .ok_or_else(|| ConfigError::InvalidValue {
                field: "config_path".to_string(),
                reason: "no parent directory".to_string(),
            })?;

        fs::create_dir_all(config_dir)?;
        tracing::debug!("Saving config to {}", config_path.display());

        let contents = toml::to_string_pretty(self)?;
        fs::write(config_path, contents)?;
        Ok(())
    }

    /// Get the path to the configuration file.
    ///
    /// Uses XDG base directories: `~/.config/jobtrail/config.toml`
    pub fn config_path() -> ConfigResult<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.config_dir().join("config.toml"))
    }

    /// Get the data directory path.
    ///
    /// Uses XDG base directories: `~/.local/share/jobtrail`
    pub fn data_dir() -> ConfigResult<PathBuf> {
        let dirs = project_dirs()?;
        Ok(dirs.data_dir().to_path_buf())
    }

    /// Resolve the database file, defaulting to `<data_dir>/jobtrail.db`.
    pub fn database_path(&self) -> ConfigResult<PathBuf> {
        match &self.storage.database_path {
            Some(path) => Ok(path.clone()),
            None => Ok(Self::data_dir()?.join("jobtrail.db")),
        }
    }
}

fn project_dirs() -> ConfigResult<ProjectDirs> {
    ProjectDirs::from("com", "jobtrail", "jobtrail").ok_or(ConfigError::NoConfigDir)
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// `tracing` filter directive used when `RUST_LOG` is unset
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info,jobtrail=debug".to_string(),
        }
    }
}

/// Observation scheduler settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObserverConfig {
    /// Quiet period after the last card insertion before a rescan, in milliseconds
    pub debounce_ms: u64,
}

impl ObserverConfig {
    /// Debounce delay as a `Duration`.
    #[must_use]
    pub fn debounce(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.debounce_ms)
    }
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self { debounce_ms: 100 }
    }
}

/// Which record store implementation to open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Volatile, process-local store
    Memory,
    /// SQLite database file
    #[default]
    Sqlite,
}

/// Record store settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Store implementation
    pub backend: StorageBackend,
    /// Database file; defaults to the XDG data directory
    pub database_path: Option<PathBuf>,
}

/// Site selection.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SitesConfig {
    /// Sites whose cards are observed
    pub enabled: Vec<SiteId>,
}

impl Default for SitesConfig {
    fn default() -> Self {
        let enabled = ["linkedin", "xing", "stepstone", "indeed"]
            .into_iter()
            .filter_map(|id| SiteId::new(id).ok())
            .collect();
        Self { enabled }
    }
}
