//! Debounced observation of a live page for one site.
//!
//! The scheduler scans once at startup, then waits for mutation batches that
//! insert cards of its site. Each such batch pushes a single deadline back by
//! the debounce interval; when the deadline passes, one full scan runs.

use crate::board::ControlMessage;
use crate::error::{EngineError, Result};
use crate::page::{MutationBatch, Page};
use crate::reconcile::{Reconciler, ScanReport};
use jobtrail_core::SiteId;
use jobtrail_sites::{SiteRegistration, SiteRegistry};
use jobtrail_store::RecordStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast::error::RecvError;
use tokio::sync::{broadcast, mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{sleep_until, Instant};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Debounce applied when none is configured.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(100);

/// Watches one page on behalf of one site.
pub struct ObservationScheduler {
    reconciler: Arc<Reconciler>,
    mutations: mpsc::UnboundedReceiver<MutationBatch>,
    control: Option<broadcast::Receiver<ControlMessage>>,
    shutdown: CancellationToken,
    debounce: Duration,
    reports: watch::Sender<ScanReport>,
}

impl ObservationScheduler {
    /// Create a scheduler; it starts receiving mutations immediately.
    #[must_use]
    pub fn new(
        registration: SiteRegistration,
        store: Arc<dyn RecordStore>,
        page: Page,
        debounce: Duration,
    ) -> Self {
        let mutations = page.subscribe();
        let (reports, _) = watch::channel(ScanReport::empty(registration.site().clone()));
        Self {
            reconciler: Arc::new(Reconciler::new(registration, store, page)),
            mutations,
            control: None,
            shutdown: CancellationToken::new(),
            debounce,
            reports,
        }
    }

    /// Create a scheduler for the registered site serving `host`.
    pub fn for_host(
        registry: &SiteRegistry,
        host: &str,
        store: Arc<dyn RecordStore>,
        page: Page,
        debounce: Duration,
    ) -> Result<Self> {
        let registration = registry
            .for_host(host)
            .ok_or_else(|| EngineError::UnsupportedHost(host.to_string()))?;
        Ok(Self::new(registration.clone(), store, page, debounce))
    }

    /// Create a scheduler for a registered site.
    pub fn for_site(
        registry: &SiteRegistry,
        site: &SiteId,
        store: Arc<dyn RecordStore>,
        page: Page,
        debounce: Duration,
    ) -> Result<Self> {
        let registration = registry
            .get(site)
            .ok_or_else(|| EngineError::UnknownSite(site.to_string()))?;
        Ok(Self::new(registration.clone(), store, page, debounce))
    }

    /// Listen for control messages, usually from [`crate::JobBoard::subscribe`].
    #[must_use]
    pub fn with_control(mut self, control: broadcast::Receiver<ControlMessage>) -> Self {
        self.control = Some(control);
        self
    }

    /// Stop when `token` is cancelled.
    #[must_use]
    pub fn with_shutdown(mut self, token: CancellationToken) -> Self {
        self.shutdown = token;
        self
    }

    /// Latest scan report; updated after every scan.
    #[must_use]
    pub fn reports(&self) -> watch::Receiver<ScanReport> {
        self.reports.subscribe()
    }

    /// The reconciler driven by this scheduler.
    #[must_use]
    pub fn reconciler(&self) -> &Arc<Reconciler> {
        &self.reconciler
    }

    /// Run one full scan right away and publish its report.
    pub async fn scan_now(&self) -> ScanReport {
        let report = self.reconciler.scan().await;
        info!(
            site = %report.site,
            pass = report.pass,
            cards = report.cards_seen,
            treated = report.treated,
            skipped = report.skipped,
            failed = report.failed,
            "scan complete"
        );
        self.reports.send_replace(report.clone());
        report
    }

    fn is_relevant(&self, batch: &MutationBatch) -> bool {
        !batch.added.is_empty()
            && self.reconciler.page().contains_match(
                &batch.added,
                self.reconciler.registration().adapter.card_selector(),
            )
    }

    /// Observe until the page's mutation feed closes or shutdown is requested.
    pub async fn run(mut self) {
        let site = self.reconciler.site().clone();
        info!(site = %site, debounce_ms = self.debounce.as_millis(), "observer started");

        self.scan_now().await;
        let mut deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                () = self.shutdown.cancelled() => {
                    debug!(site = %site, "shutdown requested");
                    break;
                }
                batch = self.mutations.recv() => match batch {
                    Some(batch) => {
                        if self.is_relevant(&batch) {
                            deadline = Some(Instant::now() + self.debounce);
                        }
                    }
                    None => {
                        debug!(site = %site, "mutation feed closed");
                        break;
                    }
                },
                message = next_control(&mut self.control) => {
                    if let Some(ControlMessage::ResetHighlights) = message {
                        self.reconciler.reset();
                        deadline = Some(Instant::now() + self.debounce);
                    }
                }
                () = wait_until(deadline) => {
                    deadline = None;
                    self.scan_now().await;
                }
            }
        }

        info!(site = %site, "observer stopped");
    }

    /// Run on a new task.
    pub fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}

impl std::fmt::Debug for ObservationScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ObservationScheduler")
            .field("site", self.reconciler.site())
            .field("debounce", &self.debounce)
            .finish_non_exhaustive()
    }
}

async fn wait_until(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}

async fn next_control(
    control: &mut Option<broadcast::Receiver<ControlMessage>>,
) -> Option<ControlMessage> {
    let Some(rx) = control.as_mut() else {
        return std::future::pending().await;
    };
    match rx.recv().await {
        Ok(message) => Some(message),
        Err(RecvError::Lagged(missed)) => {
            warn!(missed, "control messages dropped");
            Some(ControlMessage::ResetHighlights)
        }
        Err(RecvError::Closed) => {
            *control = None;
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobtrail_sites::SiteRegistry;
    use jobtrail_store::MemoryStore;

    #[tokio::test]
    async fn test_for_host_resolves_site() {
        let registry = SiteRegistry::with_defaults().expect("registry");
        let store: Arc<dyn RecordStore> = Arc::new(MemoryStore::new());

        let scheduler = ObservationScheduler::for_host(
            &registry,
            "www.stepstone.de",
            Arc::clone(&store),
            Page::new(),
            DEFAULT_DEBOUNCE,
        )
        .expect("stepstone registered");
        assert_eq!(scheduler.reconciler().site().as_str(), "stepstone");

        let err = ObservationScheduler::for_host(&registry, "example.org", store, Page::new(), DEFAULT_DEBOUNCE)
            .expect_err("unsupported host");
        assert!(matches!(err, EngineError::UnsupportedHost(_)));
    }

    #[tokio::test]
    async fn test_stops_on_shutdown() {
        let registry = SiteRegistry::with_defaults().expect("registry");
        let site = SiteId::new("xing").expect("valid site");
        let token = CancellationToken::new();
        let scheduler = ObservationScheduler::for_site(
            &registry,
            &site,
            Arc::new(MemoryStore::new()),
            Page::new(),
            DEFAULT_DEBOUNCE,
        )
        .expect("xing registered")
        .with_shutdown(token.clone());

        let mut reports = scheduler.reports();
        let handle = scheduler.spawn();
        reports.wait_for(|r| r.pass == 1).await.expect("initial scan");

        token.cancel();
        handle.await.expect("observer task");
    }
}
