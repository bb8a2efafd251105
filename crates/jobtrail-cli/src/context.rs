//! Configuration loading and the handles every command needs.

use anyhow::{Context, Result};
use jobtrail_core::{AppConfig, StorageBackend};
use jobtrail_sites::SiteRegistry;
use jobtrail_store::{MemoryStore, RecordStore, SqliteStore};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Load the configuration from `path`, or from the default location.
///
/// Environment overrides are applied in both cases.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => {
            let mut config = AppConfig::load_from(path)
                .with_context(|| format!("failed to load config from {}", path.display()))?;
            config.apply_env();
            config.validate()?;
            config
        }
        None => AppConfig::load_with_env().context("failed to load config")?,
    };
    Ok(config)
}

/// Effective configuration plus the opened registry and store.
pub struct AppContext {
    /// Effective configuration
    pub config: AppConfig,
    /// Enabled sites
    pub registry: SiteRegistry,
    /// Record store selected by the configuration
    pub store: Arc<dyn RecordStore>,
}

impl AppContext {
    /// Build the registry and open the configured store.
    pub async fn open(config: AppConfig) -> Result<Self> {
        let mut registry = SiteRegistry::with_defaults().context("failed to build site registry")?;
        registry.retain_sites(&config.sites.enabled);

        let store: Arc<dyn RecordStore> = match config.storage.backend {
            StorageBackend::Memory => {
                info!("Using in-memory record store");
                Arc::new(MemoryStore::new())
            }
            StorageBackend::Sqlite => {
                let path = config.database_path()?;
                let store = SqliteStore::open(&path)
                    .await
                    .with_context(|| format!("failed to open record store at {}", path.display()))?;
                Arc::new(store)
            }
        };

        Ok(Self {
            config,
            registry,
            store,
        })
    }

    /// Context over an existing store, with every default site enabled.
    pub fn with_store(config: AppConfig, store: Arc<dyn RecordStore>) -> Result<Self> {
        let mut registry = SiteRegistry::with_defaults()?;
        registry.retain_sites(&config.sites.enabled);
        Ok(Self {
            config,
            registry,
            store,
        })
    }
}
