//! Process-local record store.
//!
//! Backs the engine when persistence is not wanted and doubles as the test
//! store: reads and writes are counted, and either can be made to fail.

use crate::error::{Result, StoreError};
use crate::record::StoredJob;
use crate::RecordStore;
use async_trait::async_trait;
use jobtrail_core::JobKey;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// In-memory `RecordStore`.
#[derive(Debug, Default)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<JobKey, StoredJob>>,
    reads: AtomicUsize,
    writes: AtomicUsize,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `get`/`get_all` fail (or succeed again).
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every subsequent `set`/`clear` fail (or succeed again).
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of `get`/`get_all` calls that reached the store.
    #[must_use]
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set` calls that were applied.
    #[must_use]
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_read(&self) -> Result<()> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("read rejected".to_string()));
        }
        Ok(())
    }

    fn check_write(&self) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable("write rejected".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn get(&self, key: &JobKey) -> Result<Option<StoredJob>> {
        self.check_read()?;
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn get_all(&self) -> Result<BTreeMap<JobKey, StoredJob>> {
        self.check_read()?;
        Ok(self.entries.read().await.clone())
    }

    async fn set(&self, key: &JobKey, value: &StoredJob) -> Result<()> {
        self.check_write()?;
        self.entries.write().await.insert(key.clone(), value.clone());
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.check_write()?;
        self.entries.write().await.clear();
        Ok(())
    }
}
