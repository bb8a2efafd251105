//! Deferred capture: persist a sighting on the first interaction with a card.
//!
//! A [`DeferredCapture`] is a one-shot subscription. The first dispatch takes
//! the subscription id and unsubscribes before any work starts, so re-entrant
//! dispatches run the capture at most once. A failed write re-subscribes; the
//! new subscription only sees later interactions.

use crate::page::{CardId, InteractionListener, Page, SubscriptionId};
use crate::treatment::Highlight;
use futures::future::BoxFuture;
use jobtrail_core::{JobKey, Timestamp};
use jobtrail_sites::JobDescriptor;
use jobtrail_store::{RecordStore, StoredJob};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, Weak};
use tracing::{debug, error, info};

/// The store mutation a capture performs: read, merge, write back.
pub struct CaptureAction {
    store: Arc<dyn RecordStore>,
    key: JobKey,
    descriptor: JobDescriptor,
}

impl CaptureAction {
    /// Capture `descriptor` under `key`.
    #[must_use]
    pub fn new(store: Arc<dyn RecordStore>, key: JobKey, descriptor: JobDescriptor) -> Self {
        Self {
            store,
            key,
            descriptor,
        }
    }

    /// Key written by this action.
    #[must_use]
    pub fn key(&self) -> &JobKey {
        &self.key
    }

    /// Merge this sighting into the stored record and write it back.
    ///
    /// The read and the write are separate store operations; a concurrent
    /// capture of the same key may interleave and the last write wins.
    pub async fn commit(&self) -> jobtrail_store::Result<StoredJob> {
        let existing = self.store.get(&self.key).await?;
        let merged = StoredJob::merge(
            existing,
            &self.descriptor,
            self.key.local_id(),
            Timestamp::now(),
        );
        self.store.set(&self.key, &merged).await?;
        Ok(merged)
    }
}

/// One-shot interaction subscription on a card that runs a [`CaptureAction`].
pub struct DeferredCapture {
    page: Page,
    card: CardId,
    subscription: Mutex<Option<SubscriptionId>>,
    disarmed: AtomicBool,
    action: CaptureAction,
    this: Weak<Self>,
}

impl DeferredCapture {
    /// Subscribe a capture to `card`. Returns `None` if the card is detached.
    pub fn arm(page: &Page, card: CardId, action: CaptureAction) -> Option<Arc<Self>> {
        let capture = Self::unarmed(page, card, action);
        capture.subscribe().then_some(capture)
    }

    fn unarmed(page: &Page, card: CardId, action: CaptureAction) -> Arc<Self> {
        Arc::new_cyclic(|this| Self {
            page: page.clone(),
            card,
            subscription: Mutex::new(None),
            disarmed: AtomicBool::new(false),
            action,
            this: this.clone(),
        })
    }

    /// Whether a subscription is currently live.
    #[must_use]
    pub fn is_armed(&self) -> bool {
        self.subscription
            .lock()
            .expect("acquire subscription lock")
            .is_some()
    }

    /// Card the capture is attached to.
    #[must_use]
    pub fn card(&self) -> CardId {
        self.card
    }

    /// Cancel the capture; an in-flight write completes but changes nothing visible.
    pub fn disarm(&self) {
        self.disarmed.store(true, Ordering::SeqCst);
        let taken = self
            .subscription
            .lock()
            .expect("acquire subscription lock")
            .take();
        if let Some(id) = taken {
            self.page.remove_interaction_listener(self.card, id);
        }
    }

    /// Register with the page. The subscription lock is held across the
    /// registration so a dispatch never sees the listener without its id.
    fn subscribe(&self) -> bool {
        let Some(this) = self.this.upgrade() else {
            return false;
        };
        let mut subscription = self.subscription.lock().expect("acquire subscription lock");
        if self.disarmed.load(Ordering::SeqCst) {
            return false;
        }
        let listener: Arc<dyn InteractionListener> = this;
        match self.page.add_interaction_listener(self.card, listener) {
            Some(id) => {
                *subscription = Some(id);
                true
            }
            None => false,
        }
    }

    async fn run(self: Arc<Self>) {
        match self.action.commit().await {
            Ok(entry) => {
                info!(
                    key = %self.action.key(),
                    card = %self.card,
                    sites = entry.job.occurrences.len(),
                    "captured job"
                );
                if !self.disarmed.load(Ordering::SeqCst) {
                    self.page.set_background(self.card, Some(Highlight::Yellow));
                }
            }
            Err(e) => {
                error!(key = %self.action.key(), card = %self.card, error = %e, "failed to capture job");
                if self.disarmed.load(Ordering::SeqCst) || !self.page.is_attached(self.card) {
                    return;
                }
                if self.subscribe() {
                    debug!(card = %self.card, "capture re-armed");
                }
            }
        }
    }
}

impl InteractionListener for DeferredCapture {
    fn on_interaction(&self) -> Option<BoxFuture<'static, ()>> {
        let id = self
            .subscription
            .lock()
            .expect("acquire subscription lock")
            .take()?;
        self.page.remove_interaction_listener(self.card, id);

        let this = self.this.upgrade()?;
        Some(Box::pin(this.run()))
    }
}

impl std::fmt::Debug for DeferredCapture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeferredCapture")
            .field("card", &self.card)
            .field("key", self.action.key())
            .field("armed", &self.is_armed())
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrail_core::SiteId;
    use jobtrail_store::MemoryStore;
    use std::time::Duration;

    fn setup() -> (Page, CardId, Arc<MemoryStore>, CaptureAction) {
        let page = Page::new();
        let node = page.insert(r#"<div class="card">Rust Engineer</div>"#);
        let card = CardId { node, index: 0 };
        let store = Arc::new(MemoryStore::new());
        let descriptor = JobDescriptor {
            site: SiteId::new("indeed").expect("valid site"),
            local_id: Some("7".to_string()),
            title: "Rust Engineer".to_string(),
            company: "Acme".to_string(),
            location: "Remote".to_string(),
        };
        let action = CaptureAction::new(
            store.clone(),
            JobKey::from_local_id("7").expect("valid key"),
            descriptor,
        );
        (page, card, store, action)
    }

    #[tokio::test]
    async fn test_capture_runs_once() {
        let (page, card, store, action) = setup();
        let capture = DeferredCapture::arm(&page, card, action).expect("card attached");
        assert_eq!(page.listener_count(card), 1);

        // Two dispatches before any work is awaited.
        let first = page.dispatch_interaction(card);
        let second = page.dispatch_interaction(card);
        assert_eq!(first.len(), 1);
        assert!(second.is_empty());
        futures::future::join_all(first).await;

        assert_eq!(store.write_count(), 1);
        assert!(!capture.is_armed());
        assert_eq!(page.listener_count(card), 0);
        assert_eq!(page.style(card).background, Some(Highlight::Yellow));
    }

    #[tokio::test]
    async fn test_failed_capture_rearms() {
        let (page, card, store, action) = setup();
        let capture = DeferredCapture::arm(&page, card, action).expect("card attached");

        store.fail_writes(true);
        page.interact(card).await;
        assert_eq!(store.write_count(), 0);
        assert!(capture.is_armed());
        assert_eq!(page.style(card).background, None);

        store.fail_writes(false);
        page.interact(card).await;
        assert_eq!(store.write_count(), 1);
        assert!(!capture.is_armed());
    }

    #[tokio::test]
    async fn test_disarm_drops_subscription() {
        let (page, card, store, action) = setup();
        let capture = DeferredCapture::arm(&page, card, action).expect("card attached");

        capture.disarm();
        page.interact(card).await;
        assert_eq!(store.write_count(), 0);
        assert_eq!(page.listener_count(card), 0);
    }

    #[test]
    fn test_listener_registered_with_its_id() {
        let (page, card, _store, action) = setup();
        let capture = DeferredCapture::unarmed(&page, card, action);

        // A dispatch racing the registration must find the id recorded.
        let guard = capture.subscription.lock().expect("acquire subscription lock");
        let subscriber = std::thread::spawn({
            let capture = capture.clone();
            move || capture.subscribe()
        });
        std::thread::sleep(Duration::from_millis(50));
        assert_eq!(page.listener_count(card), 0);
        drop(guard);

        assert!(subscriber.join().expect("subscriber thread"));
        assert!(capture.is_armed());
        assert_eq!(page.dispatch_interaction(card).len(), 1);
        assert!(!capture.is_armed());
    }

    #[test]
    fn test_subscribe_after_disarm_is_refused() {
        let (page, card, _store, action) = setup();
        let capture = DeferredCapture::unarmed(&page, card, action);
        capture.disarm();
        assert!(!capture.subscribe());
        assert_eq!(page.listener_count(card), 0);
    }

    #[test]
    fn test_arm_detached_card() {
        let (page, card, _store, action) = setup();
        page.remove(card.node);
        assert!(DeferredCapture::arm(&page, card, action).is_none());
    }
}
