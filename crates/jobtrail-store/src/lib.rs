//! Jobtrail Store - Durable mapping from job keys to merged job records.
//!
//! The store is a plain asynchronous key-value surface: `get`, `get_all`,
//! `set` and `clear`. Each operation is atomic on its own; nothing makes a
//! read followed by a write atomic, and callers must handle every failure
//! at the call site.
//!
//! # Backends
//!
//! - [`MemoryStore`]: process-local, with injectable failures for tests
//! - [`SqliteStore`]: `SQLite` file via `SQLx`, with embedded migrations
//!
//! # Example
//!
//! ```ignore
//! use jobtrail_store::{RecordStore, SqliteStore};
//!
//! let store = SqliteStore::open("jobtrail.db").await?;
//! for (key, entry) in store.get_all().await? {
//!     println!("{key}: {}", entry.job.title);
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod error;
pub mod memory;
pub mod migrations;
pub mod record;
pub mod sqlite;

// Re-export commonly used types
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use record::{JobRecord, StoredJob};
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use jobtrail_core::JobKey;
use std::collections::BTreeMap;

/// Asynchronous key-value storage of job records.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Fetch the entry stored under `key`.
    async fn get(&self, key: &JobKey) -> Result<Option<StoredJob>>;

    /// Fetch every stored entry.
    async fn get_all(&self) -> Result<BTreeMap<JobKey, StoredJob>>;

    /// Store `value` under `key`, replacing any previous entry.
    async fn set(&self, key: &JobKey, value: &StoredJob) -> Result<()>;

    /// Remove every entry.
    async fn clear(&self) -> Result<()>;
}
