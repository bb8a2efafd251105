//! The site adapter contract and the per-site reconciliation policy.

use crate::descriptor::JobDescriptor;
use crate::error::Result;
use jobtrail_core::SiteId;
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

/// Reads job cards rendered by one listing site.
///
/// Implementations are pure: no I/O, no shared state.
pub trait SiteAdapter: Send + Sync {
    /// Site this adapter reads.
    fn site(&self) -> &SiteId;

    /// Selector matching one job card.
    fn card_selector(&self) -> &Selector;

    /// Host suffixes served by this site (`linkedin.com` matches `www.linkedin.com`).
    fn host_suffixes(&self) -> &'static [&'static str];

    /// Read a card, reporting why when it cannot be read.
    ///
    /// A missing identifier is not an error: the descriptor is returned with
    /// `local_id: None` and the caller decides to skip it.
    fn try_extract(&self, card: ElementRef<'_>) -> Result<JobDescriptor>;

    /// Read a card; failures are logged and become `None`.
    fn extract(&self, card: ElementRef<'_>) -> Option<JobDescriptor> {
        match self.try_extract(card) {
            Ok(descriptor) => {
                if descriptor.usable_local_id().is_none() {
                    tracing::debug!(site = %self.site(), title = %descriptor.title, "card has no job id");
                }
                Some(descriptor)
            }
            Err(e) => {
                tracing::warn!(site = %self.site(), error = %e, "failed to extract job card");
                None
            }
        }
    }
}

/// How a site's cards are treated once their record is looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Policy {
    /// Highlight by how many of the two paired sites have seen the job.
    HighlightByCoverage {
        /// The other site of the pair
        partner: SiteId,
    },
    /// Hide cards whose job has already been captured on any site.
    SuppressDuplicate,
}
