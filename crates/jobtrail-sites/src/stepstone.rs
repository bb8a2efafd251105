//! StepStone job search cards.
//!
//! Listing links carry a numeric id of six or more digits, usually as
//! `--<id>-inline.html` or `--<id>.html`. When the link is missing or
//! rewritten, the card's DOM id (`job-item-<id>`) carries the same number.

use crate::adapter::SiteAdapter;
use crate::descriptor::{attr_of, selector, text_of, JobDescriptor};
use crate::error::Result;
use jobtrail_core::SiteId;
use regex::Regex;
use scraper::{ElementRef, Selector};
use std::sync::OnceLock;

/// Adapter for `stepstone.de` job search results.
pub struct StepStoneAdapter {
    site: SiteId,
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    link: Selector,
}

impl StepStoneAdapter {
    /// Site identifier used for StepStone occurrences.
    pub const SITE: &'static str = "stepstone";

    /// Build the adapter, compiling its selectors.
    pub fn new() -> Result<Self> {
        Ok(Self {
            site: SiteId::new(Self::SITE)?,
            card: selector(r#"article[data-testid="job-item"]"#)?,
            title: selector(r#"[data-testid="job-item-title"]"#)?,
            company: selector(r#"[data-at="job-item-company-name"]"#)?,
            location: selector(r#"[data-at="job-item-location"]"#)?,
            link: selector("a[href]")?,
        })
    }

    /// Last standalone run of 6+ digits in the link; slugs may hold shorter numbers.
    fn id_from_link(href: &str) -> Option<String> {
        static LINK_ID: OnceLock<Regex> = OnceLock::new();
        let regex = LINK_ID.get_or_init(|| Regex::new(r"\b(\d{6,})\b").expect("valid regex"));
        let path = href.split(['?', '#']).next().unwrap_or(href);
        regex
            .captures_iter(path)
            .last()
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }

    fn id_from_dom_id(dom_id: &str) -> Option<String> {
        static DOM_ID: OnceLock<Regex> = OnceLock::new();
        let regex = DOM_ID.get_or_init(|| Regex::new(r"^job-item-(\d+)$").expect("valid regex"));
        regex
            .captures(dom_id)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().to_string())
    }
}

impl SiteAdapter for StepStoneAdapter {
    fn site(&self) -> &SiteId {
        &self.site
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn host_suffixes(&self) -> &'static [&'static str] {
        &["stepstone.de", "stepstone.at"]
    }

    fn try_extract(&self, card: ElementRef<'_>) -> Result<JobDescriptor> {
        let local_id = card
            .select(&self.link)
            .filter_map(|a| a.value().attr("href"))
            .find_map(Self::id_from_link)
            .or_else(|| card.value().id().and_then(Self::id_from_dom_id));

        let title = text_of(card, &self.title)
            .or_else(|| attr_of(card, &self.title, "title"))
            .unwrap_or_default();

        Ok(JobDescriptor {
            site: self.site.clone(),
            local_id,
            title,
            company: text_of(card, &self.company).unwrap_or_default(),
            location: text_of(card, &self.location).unwrap_or_default(),
        })
    }
}
