//! XING job search cards.
//!
//! XING renders styled-components class names with build hashes
//! (`job-teaser-list-item-styles__Company-sc-6d7d457f-8`), so fields are
//! matched on the stable part of the class. The job id is the last path
//! segment of the card link.

use crate::adapter::SiteAdapter;
use crate::descriptor::{attr_of, selector, text_of, JobDescriptor};
use crate::error::{ExtractError, Result};
use jobtrail_core::SiteId;
use scraper::{ElementRef, Selector};
use url::Url;

const BASE_URL: &str = "https://www.xing.com";

/// Adapter for `xing.com` job search results.
pub struct XingAdapter {
    site: SiteId,
    base: Url,
    card: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
    card_link: Selector,
    any_link: Selector,
}

impl XingAdapter {
    /// Site identifier used for XING occurrences.
    pub const SITE: &'static str = "xing";

    /// Build the adapter, compiling its selectors.
    pub fn new() -> Result<Self> {
        let site = SiteId::new(Self::SITE)?;
        let base = Url::parse(BASE_URL).map_err(|source| ExtractError::InvalidUrl {
            site: site.clone(),
            href: BASE_URL.to_string(),
            source,
        })?;

        Ok(Self {
            site,
            base,
            card: selector(r#"article[data-xds="Card"]"#)?,
            title: selector(r#"h2[data-xds="Headline"]"#)?,
            company: selector(r#"p[class*="__Company"]"#)?,
            location: selector(r#"p[class*="__City"]"#)?,
            card_link: selector(r#"a[class*="__CardLink"]"#)?,
            any_link: selector("a[href]")?,
        })
    }

    /// Last non-empty path segment of `href`, resolved against the site root.
    fn job_id_from_href(&self, href: &str) -> Result<Option<String>> {
        let url = self
            .base
            .join(href)
            .map_err(|source| ExtractError::InvalidUrl {
                site: self.site.clone(),
                href: href.to_string(),
                source,
            })?;

        Ok(url
            .path_segments()
            .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
            .map(str::to_string))
    }
}

impl SiteAdapter for XingAdapter {
    fn site(&self) -> &SiteId {
        &self.site
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn host_suffixes(&self) -> &'static [&'static str] {
        &["xing.com"]
    }

    fn try_extract(&self, card: ElementRef<'_>) -> Result<JobDescriptor> {
        let href = attr_of(card, &self.card_link, "href")
            .or_else(|| attr_of(card, &self.any_link, "href"));

        let local_id = match href {
            Some(href) => self.job_id_from_href(&href)?,
            None => None,
        };

        Ok(JobDescriptor {
            site: self.site.clone(),
            local_id,
            title: text_of(card, &self.title).unwrap_or_default(),
            company: text_of(card, &self.company).unwrap_or_default(),
            location: text_of(card, &self.location).unwrap_or_default(),
        })
    }
}
