//! Jobtrail Core - Foundation crate for the jobtrail posting tracker.
//!
//! This crate provides the shared types, error handling and configuration
//! management that the site adapters, the record store and the engine depend on.
//!
//! # Modules
//!
//! - [`error`] - Central error types using thiserror
//! - [`config`] - TOML-based configuration with XDG paths
//! - [`types`] - Shared newtypes (`SiteId`, `JobKey`, `Timestamp`)
//!
//! # Example
//!
//! ```rust
//! use jobtrail_core::{AppConfig, JobKey, SiteId};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let config = AppConfig::default();
//! assert_eq!(config.observer.debounce_ms, 100);
//!
//! let site = SiteId::new("linkedin")?;
//! let key = JobKey::from_local_id("4012345678")?;
//! assert_eq!(key.as_str(), "job_4012345678");
//! # let _ = site;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod config;
pub mod error;
pub mod types;

// Re-export commonly used types
pub use config::{AppConfig, GeneralConfig, ObserverConfig, SitesConfig, StorageBackend, StorageConfig};
pub use error::{ConfigError, ConfigResult, JobtrailError, Result};
pub use types::{JobKey, SiteId, Timestamp};
