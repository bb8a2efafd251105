//! SQLite-backed record store.
//!
//! Each job is one row of `job_records`; the value column holds the JSON
//! document `{"job": {...}}` so the persisted shape matches the wire shape.

use crate::error::{Result, StoreError};
use crate::migrations;
use crate::record::StoredJob;
use crate::RecordStore;
use async_trait::async_trait;
use jobtrail_core::JobKey;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Pool, Sqlite};
use std::collections::BTreeMap;
use std::path::Path;
use std::str::FromStr;

/// Durable `RecordStore` on a SQLite database file.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `path` and run migrations.
    ///
    /// # Errors
    /// Returns `StoreError` if the file cannot be opened or migrations fail.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let path_str = path
            .to_str()
            .ok_or_else(|| StoreError::Open("invalid database path: not valid UTF-8".to_string()))?;

        Self::connect(path_str, 5).await
    }

    /// Open a private in-memory database.
    ///
    /// Limited to one connection: every `:memory:` connection is its own database.
    pub async fn in_memory() -> Result<Self> {
        Self::connect(":memory:", 1).await
    }

    async fn connect(path: &str, max_connections: u32) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(path)
            .map_err(|e| StoreError::Open(format!("invalid connection string: {e}")))?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(max_connections)
            .connect_with(connect_options)
            .await
            .map_err(|e| StoreError::Open(format!("failed to open {path}: {e}")))?;

        migrations::run_migrations(&pool).await?;
        tracing::info!("Record store opened at {}", path);

        Ok(Self { pool })
    }

    /// Underlying connection pool.
    #[must_use]
    pub fn pool(&self) -> &Pool<Sqlite> {
        &self.pool
    }

    /// Close the pool gracefully.
    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl RecordStore for SqliteStore {
    async fn get(&self, key: &JobKey) -> Result<Option<StoredJob>> {
        let row: Option<(String,)> = sqlx::query_as(
            r"
            SELECT value
            FROM job_records
            WHERE key = ?
            ",
        )
        .bind(key.as_str())
        .fetch_optional(&self.pool)
        .await?;

        let Some((value,)) = row else {
            return Ok(None);
        };
        match serde_json::from_str::<StoredJob>(&value) {
            Ok(entry) => Ok(Some(entry)),
            // Treated as absent so the next capture overwrites it.
            Err(e) => {
                tracing::warn!(key = %key, error = %e, "ignoring undecodable record");
                Ok(None)
            }
        }
    }

    async fn get_all(&self) -> Result<BTreeMap<JobKey, StoredJob>> {
        let rows: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM job_records")
            .fetch_all(&self.pool)
            .await?;

        let mut entries = BTreeMap::new();
        for (raw_key, value) in rows {
            let Ok(key) = JobKey::parse(&raw_key) else {
                tracing::warn!(key = %raw_key, "skipping row with foreign key format");
                continue;
            };
            match serde_json::from_str::<StoredJob>(&value) {
                Ok(entry) => {
                    entries.insert(key, entry);
                }
                Err(e) => tracing::warn!(key = %raw_key, error = %e, "skipping undecodable record"),
            }
        }

        Ok(entries)
    }

    async fn set(&self, key: &JobKey, value: &StoredJob) -> Result<()> {
        let value = serde_json::to_string(value)?;

        sqlx::query(
            r"
            INSERT INTO job_records (key, value, updated_at)
            VALUES (?, ?, datetime('now'))
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = datetime('now')
            ",
        )
        .bind(key.as_str())
        .bind(value)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        let result = sqlx::query("DELETE FROM job_records")
            .execute(&self.pool)
            .await?;
        tracing::info!(removed = result.rows_affected(), "cleared record store");
        Ok(())
    }
}
