//! Indeed job search cards, keyed by the `data-jk` job key.

use crate::adapter::SiteAdapter;
use crate::descriptor::{attr_of, selector, text_of, JobDescriptor};
use crate::error::Result;
use jobtrail_core::SiteId;
use scraper::{ElementRef, Selector};

/// Adapter for `indeed.com` job search results.
pub struct IndeedAdapter {
    site: SiteId,
    card: Selector,
    keyed_link: Selector,
    title_span: Selector,
    title: Selector,
    company: Selector,
    location: Selector,
}

impl IndeedAdapter {
    /// Site identifier used for Indeed occurrences.
    pub const SITE: &'static str = "indeed";

    /// Build the adapter, compiling its selectors.
    pub fn new() -> Result<Self> {
        Ok(Self {
            site: SiteId::new(Self::SITE)?,
            card: selector("div.job_seen_beacon")?,
            keyed_link: selector("a[data-jk]")?,
            title_span: selector("h2.jobTitle span[title]")?,
            title: selector("h2.jobTitle")?,
            company: selector(r#"[data-testid="company-name"]"#)?,
            location: selector(r#"[data-testid="text-location"]"#)?,
        })
    }
}

impl SiteAdapter for IndeedAdapter {
    fn site(&self) -> &SiteId {
        &self.site
    }

    fn card_selector(&self) -> &Selector {
        &self.card
    }

    fn host_suffixes(&self) -> &'static [&'static str] {
        &["indeed.com", "indeed.de"]
    }

    fn try_extract(&self, card: ElementRef<'_>) -> Result<JobDescriptor> {
        let local_id = attr_of(card, &self.keyed_link, "data-jk").or_else(|| {
            card.value()
                .attr("data-jk")
                .map(str::trim)
                .filter(|jk| !jk.is_empty())
                .map(str::to_string)
        });

        let title = attr_of(card, &self.title_span, "title")
            .or_else(|| text_of(card, &self.title))
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

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    fn extract(html: &str) -> Option<JobDescriptor> {
        let adapter = IndeedAdapter::new().expect("build adapter");
        let doc = Html::parse_fragment(html);
        let card = doc.select(adapter.card_selector()).next()?;
        adapter.extract(card)
    }

    #[test]
    fn test_extracts_full_card() {
        let html = r#"
            <div class="job_seen_beacon">
                <h2 class="jobTitle">
                    <a data-jk="a1b2c3d4e5f60718" href="/rc/clk?jk=a1b2c3d4e5f60718">
                        <span title="Embedded Rust Engineer">Embedded Rust Engineer</span>
                    </a>
                </h2>
                <span data-testid="company-name">Oxide Corp</span>
                <div data-testid="text-location">Remote</div>
            </div>
        "#;
        let d = extract(html).expect("descriptor");
        assert_eq!(d.site.as_str(), "indeed");
        assert_eq!(d.local_id.as_deref(), Some("a1b2c3d4e5f60718"));
        assert_eq!(d.title, "Embedded Rust Engineer");
        assert_eq!(d.company, "Oxide Corp");
        assert_eq!(d.location, "Remote");
    }

    #[test]
    fn test_job_key_on_card_fallback() {
        let html = r#"<div class="job_seen_beacon" data-jk="ff00"><h2 class="jobTitle">Ops</h2></div>"#;
        let d = extract(html).expect("descriptor");
        assert_eq!(d.local_id.as_deref(), Some("ff00"));
        assert_eq!(d.title, "Ops");
    }
}
