//! LinkedIn job search cards.
//!
//! The job id is carried on the card itself as `data-job-id`.

use crate::adapter::SiteAdapter;
use crate::descriptor::{selector, text_of, JobDescriptor};
use crate::error::Result;
use jobtrail_core::SiteId;
use scraper::{ElementRef, Selector};

/// Adapter for `linkedin.com` job search results.
pub struct LinkedInAdapter {
    site: SiteId,
    card: Selector,
    link: Selector,
    visible_title: Selector,
    company: Selector,
    location: Selector,
}

impl LinkedInAdapter {
    /// Site identifier used for LinkedIn occurrences.
    pub const SITE: &'static str = "linkedin";

    /// Build the adapter, compiling its selectors.
    pub fn new() -> Result<Self> {
        Ok(Self {
            site: SiteId::new(Self::SITE)?,
            card: selector("div.job-card-container")?,
            link: selector("a.job-card-container__link")?,
            visible_title: selector(r#"a.job-card-container__link span[aria-hidden="true"]"#)?,
            company: selector("div.artdeco-entity-lockup__subtitle span")?,
            location: selector("div.artdeco-entity-lockup__caption ul li span")?,
        })
    }
}

impl SiteAdapter for LinkedInAdapter {
    fn site(&self) -> &SiteId {
        &self.site
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn host_suffixes(&self) -> &'static [&'static str] {
        &["linkedin.com"]
    }

    fn try_extract(&self, card: ElementRef<'_>) -> Result<JobDescriptor> {
        // The link also holds a screen-reader copy of the title; prefer the visible span.
        let title = text_of(card, &self.visible_title)
            .or_else(|| text_of(card, &self.link))
            .unwrap_or_default();

        let local_id = card
            .value()
            .attr("data-job-id")
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(str::to_string);

        Ok(JobDescriptor {
            site: self.site.clone(),
            local_id,
            title,
            company: text_of(card, &self.company).unwrap_or_default(),
            location: text_of(card, &self.location).unwrap_or_default(),
        })
    }
}
