//! Per-site reconciliation of observed cards against the record store.

use crate::capture::{CaptureAction, DeferredCapture};
use crate::marks::ProcessingMarks;
use crate::page::{CardId, Page};
use crate::treatment::{decide, Treatment};
use jobtrail_core::{JobKey, SiteId};
use jobtrail_sites::{JobDescriptor, SiteRegistration};
use jobtrail_store::RecordStore;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tracing::{debug, info, warn};

/// Result of reconciling one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// A treatment was decided, applied, and the card marked.
    Treated(Treatment),
    /// The card was marked by an earlier pass; nothing was done.
    AlreadyProcessed,
    /// No usable descriptor or identifier; left unmarked.
    Skipped,
    /// The record could not be read; left unmarked for the next pass.
    Failed,
}

/// One card's line in a scan report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CardOutcome {
    /// The card
    pub card: CardId,
    /// Canonical key, when the card yielded one
    pub key: Option<JobKey>,
    /// What happened
    pub outcome: Outcome,
}

/// Summary of one full scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Site scanned
    pub site: SiteId,
    /// Sequence number of the pass, starting at 1 (0 before any scan)
    pub pass: u64,
    /// Cards present in the document
    pub cards_seen: usize,
    /// Cards given a treatment in this pass
    pub treated: usize,
    /// Cards without a usable identifier
    pub skipped: usize,
    /// Cards whose record lookup failed
    pub failed: usize,
    /// Cards handled by an earlier pass
    pub already_processed: usize,
    /// Per-card detail, in document order
    pub cards: Vec<CardOutcome>,
}

impl ScanReport {
    /// Report for a site that has not been scanned yet.
    #[must_use]
    pub fn empty(site: SiteId) -> Self {
        Self {
            site,
            pass: 0,
            cards_seen: 0,
            treated: 0,
            skipped: 0,
            failed: 0,
            already_processed: 0,
            cards: Vec::new(),
        }
    }

    fn tally(site: SiteId, pass: u64, cards: Vec<CardOutcome>) -> Self {
        let mut report = Self::empty(site);
        report.pass = pass;
        report.cards_seen = cards.len();
        for line in &cards {
            match line.outcome {
                Outcome::Treated(_) => report.treated += 1,
                Outcome::AlreadyProcessed => report.already_processed += 1,
                Outcome::Skipped => report.skipped += 1,
                Outcome::Failed => report.failed += 1,
            }
        }
        report.cards = cards;
        report
    }
}

impl fmt::Display for ScanReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} pass {}: {} cards, {} treated, {} already processed, {} skipped, {} failed",
            self.site,
            self.pass,
            self.cards_seen,
            self.treated,
            self.already_processed,
            self.skipped,
            self.failed
        )
    }
}

/// Decides and applies treatments for one site's cards on one page.
pub struct Reconciler {
    registration: SiteRegistration,
    store: Arc<dyn RecordStore>,
    page: Page,
    marks: ProcessingMarks,
    captures: Mutex<HashMap<CardId, Arc<DeferredCapture>>>,
    passes: AtomicU64,
}

impl Reconciler {
    /// Create a reconciler for `registration`'s cards on `page`.
    #[must_use]
    pub fn new(registration: SiteRegistration, store: Arc<dyn RecordStore>, page: Page) -> Self {
        Self {
            registration,
            store,
            page,
            marks: ProcessingMarks::new(),
            captures: Mutex::new(HashMap::new()),
            passes: AtomicU64::new(0),
        }
    }

    /// Site this reconciler serves.
    #[must_use]
    pub fn site(&self) -> &SiteId {
        self.registration.site()
    }

    /// The site registration in use.
    #[must_use]
    pub fn registration(&self) -> &SiteRegistration {
        &self.registration
    }

    /// The page being reconciled.
    #[must_use]
    pub fn page(&self) -> &Page {
        &self.page
    }

    /// Processing marks of this reconciler.
    #[must_use]
    pub fn marks(&self) -> &ProcessingMarks {
        &self.marks
    }

    /// Cards with a live capture subscription.
    #[must_use]
    pub fn armed_cards(&self) -> Vec<CardId> {
        let captures = self.captures.lock().expect("acquire captures lock");
        let mut cards: Vec<CardId> = captures
            .values()
            .filter(|capture| capture.is_armed())
            .map(|capture| capture.card())
            .collect();
        cards.sort();
        cards
    }

    /// Reconcile one card.
    ///
    /// Marked cards are left alone without touching the store. A card with no
    /// usable identifier, or whose record cannot be read, stays unmarked so a
    /// later scan retries it.
    pub async fn reconcile(&self, card: CardId, descriptor: Option<JobDescriptor>) -> Outcome {
        let site = self.registration.site();

        if self.marks.is_marked(card) {
            return Outcome::AlreadyProcessed;
        }

        let Some(descriptor) = descriptor else {
            return Outcome::Skipped;
        };
        let Some(key) = descriptor.key() else {
            debug!(site = %site, card = %card, "skipping card without job id");
            return Outcome::Skipped;
        };

        let entry = match self.store.get(&key).await {
            Ok(entry) => entry,
            Err(e) => {
                warn!(site = %site, card = %card, key = %key, error = %e, "record lookup failed");
                return Outcome::Failed;
            }
        };

        // The store read yields; another pass may have claimed or detached the card.
        if !self.page.is_attached(card) {
            debug!(site = %site, card = %card, "card detached during lookup");
            return Outcome::Skipped;
        }
        if !self.marks.mark(card) {
            return Outcome::AlreadyProcessed;
        }

        let treatment = decide(
            &self.registration.policy,
            site,
            entry.as_ref().map(|e| &e.job),
        );
        self.apply(card, treatment);

        if treatment.arms_capture() {
            self.arm(card, key.clone(), descriptor);
        }

        debug!(site = %site, card = %card, key = %key, treatment = %treatment, "card reconciled");
        Outcome::Treated(treatment)
    }

    fn apply(&self, card: CardId, treatment: Treatment) {
        match treatment {
            Treatment::Highlight(color) => {
                self.page.set_background(card, Some(color));
            }
            Treatment::Suppress => {
                self.page.set_hidden(card, true);
            }
            Treatment::DeferredCapture => {}
        }
    }

    fn arm(&self, card: CardId, key: JobKey, descriptor: JobDescriptor) {
        let action = CaptureAction::new(Arc::clone(&self.store), key, descriptor);
        let Some(capture) = DeferredCapture::arm(&self.page, card, action) else {
            return;
        };
        let previous = self
            .captures
            .lock()
            .expect("acquire captures lock")
            .insert(card, capture);
        if let Some(previous) = previous {
            previous.disarm();
        }
    }

    /// Forget marks and captures of cards no longer in the document.
    pub fn prune(&self) -> usize {
        let pruned = self.marks.prune(|card| self.page.is_attached(card));
        self.captures
            .lock()
            .expect("acquire captures lock")
            .retain(|card, _| self.page.is_attached(*card));
        pruned
    }

    /// Reconcile every card currently in the document.
    ///
    /// Reconciliations run concurrently on the calling task and interleave at
    /// store reads.
    pub async fn scan(&self) -> ScanReport {
        let pruned = self.prune();
        if pruned > 0 {
            debug!(site = %self.site(), pruned, "pruned detached cards");
        }

        let adapter = &self.registration.adapter;
        let pending: Vec<(CardId, Option<JobDescriptor>)> =
            self.page.visit_cards(adapter.card_selector(), |card, element| {
                let descriptor = if self.marks.is_marked(card) {
                    None
                } else {
                    adapter.extract(element)
                };
                (card, descriptor)
            });

        let cards = futures::future::join_all(pending.into_iter().map(|(card, descriptor)| async move {
            let key = descriptor.as_ref().and_then(JobDescriptor::key);
            let outcome = self.reconcile(card, descriptor).await;
            CardOutcome { card, key, outcome }
        }))
        .await;

        let pass = self.passes.fetch_add(1, Ordering::SeqCst) + 1;
        ScanReport::tally(self.site().clone(), pass, cards)
    }

    /// Undo this site's treatments: styles, pending captures and marks.
    ///
    /// Returns the number of cards restored.
    pub fn reset(&self) -> usize {
        let cards = self.page.cards(self.registration.adapter.card_selector());
        for card in &cards {
            self.page.reset_card(*card);
        }

        let captures: Vec<Arc<DeferredCapture>> = self
            .captures
            .lock()
            .expect("acquire captures lock")
            .drain()
            .map(|(_, capture)| capture)
            .collect();
        for capture in captures {
            capture.disarm();
        }
        self.marks.clear();

        info!(site = %self.site(), cards = cards.len(), "highlights reset");
        cards.len()
    }
}

impl fmt::Debug for Reconciler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Reconciler")
            .field("site", self.site())
            .field("marked", &self.marks.len())
            .field("passes", &self.passes.load(Ordering::SeqCst))
            .finish_non_exhaustive()
    }
}
