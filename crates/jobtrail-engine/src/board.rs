//! Read-only listing of tracked jobs and the global reset action.

use crate::error::Result;
use jobtrail_core::{JobKey, SiteId, Timestamp};
use jobtrail_store::RecordStore;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;

/// Capacity of the control channel.
const CONTROL_CAPACITY: usize = 16;

/// Signal sent from the board to every live observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase")]
pub enum ControlMessage {
    /// Drop all visual treatments and reconcile again from scratch.
    ResetHighlights,
}

/// One tracked job as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobListing {
    /// Storage key
    pub key: JobKey,
    /// Job title
    pub title: String,
    /// Hiring company
    pub company: String,
    /// Location text
    pub location: String,
    /// Sites that surfaced the job
    pub sites: Vec<SiteId>,
    /// Time of the last capture
    pub saved_at: Timestamp,
}

/// Presentation surface over the record store.
#[derive(Clone)]
pub struct JobBoard {
    store: Arc<dyn RecordStore>,
    control: broadcast::Sender<ControlMessage>,
}

impl JobBoard {
    /// Create a board over `store`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>) -> Self {
        let (control, _) = broadcast::channel(CONTROL_CAPACITY);
        Self { store, control }
    }

    /// Receive control messages sent by this board.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<ControlMessage> {
        self.control.subscribe()
    }

    /// Every tracked job, most recently captured first.
    pub async fn list(&self) -> Result<Vec<JobListing>> {
        let entries = self.store.get_all().await?;
        let mut listings: Vec<JobListing> = entries
            .into_iter()
            .map(|(key, entry)| JobListing {
                key,
                sites: entry.job.sites().cloned().collect(),
                title: entry.job.title,
                company: entry.job.company,
                location: entry.job.location,
                saved_at: entry.job.saved_at,
            })
            .collect();
        listings.sort_by(|a, b| b.saved_at.cmp(&a.saved_at));
        Ok(listings)
    }

    /// Clear every record and tell observers to reset their highlights.
    ///
    /// Returns the number of observers notified.
    pub async fn reset(&self) -> Result<usize> {
        self.store.clear().await?;
        // No live observer is not an error.
        let notified = self.control.send(ControlMessage::ResetHighlights).unwrap_or(0);
        info!(observers = notified, "all jobs reset");
        Ok(notified)
    }
}

impl std::fmt::Debug for JobBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JobBoard")
            .field("observers", &self.control.receiver_count())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrail_sites::JobDescriptor;
    use jobtrail_store::{MemoryStore, StoredJob};

    async fn seed(store: &MemoryStore, site: &str, id: &str, millis: i64) {
        let descriptor = JobDescriptor {
            site: SiteId::new(site).expect("valid site"),
            local_id: Some(id.to_string()),
            title: format!("Job {id}"),
            company: "Acme".to_string(),
            location: "Berlin".to_string(),
        };
        let saved_at = Timestamp::from_millis(millis).expect("valid millis");
        let entry = StoredJob::merge(None, &descriptor, id, saved_at);
        store
            .set(&JobKey::from_local_id(id).expect("valid key"), &entry)
            .await
            .expect("seed");
    }

    #[test]
    fn test_control_message_wire_format() {
        let json = serde_json::to_string(&ControlMessage::ResetHighlights).expect("serialize");
        assert_eq!(json, r#"{"action":"resetHighlights"}"#);

        let parsed: ControlMessage =
            serde_json::from_str(r#"{"action":"resetHighlights"}"#).expect("deserialize");
        assert_eq!(parsed, ControlMessage::ResetHighlights);
    }

    #[tokio::test]
    async fn test_list_newest_first() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "linkedin", "1", 1_000).await;
        seed(&store, "indeed", "2", 3_000).await;
        seed(&store, "xing", "3", 2_000).await;

        let board = JobBoard::new(store);
        let keys: Vec<String> = board
            .list()
            .await
            .expect("list")
            .into_iter()
            .map(|l| l.key.to_string())
            .collect();
        assert_eq!(keys, vec!["job_2", "job_3", "job_1"]);
    }

    #[tokio::test]
    async fn test_reset_clears_and_broadcasts() {
        let store = Arc::new(MemoryStore::new());
        seed(&store, "linkedin", "1", 1_000).await;

        let board = JobBoard::new(store.clone());
        let mut rx = board.subscribe();

        assert_eq!(board.reset().await.expect("reset"), 1);
        assert_eq!(rx.recv().await.expect("message"), ControlMessage::ResetHighlights);
        assert!(board.list().await.expect("list").is_empty());
    }

    #[tokio::test]
    async fn test_reset_without_observers() {
        let board = JobBoard::new(Arc::new(MemoryStore::new()));
        assert_eq!(board.reset().await.expect("reset"), 0);
    }

    #[tokio::test]
    async fn test_list_propagates_store_failure() {
        let store = Arc::new(MemoryStore::new());
        store.fail_reads(true);
        let board = JobBoard::new(store);
        assert!(board.list().await.is_err());
    }
}
