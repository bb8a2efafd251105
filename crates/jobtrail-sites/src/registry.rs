//! Registry of supported sites and the policy attached to each.

use crate::adapter::{Policy, SiteAdapter};
use crate::error::Result;
use crate::{IndeedAdapter, LinkedInAdapter, StepStoneAdapter, XingAdapter};
use jobtrail_core::SiteId;
use std::sync::Arc;
use tracing::info;

/// One supported site: how to read its cards and how to treat them.
#[derive(Clone)]
pub struct SiteRegistration {
    /// Card reader for the site
    pub adapter: Arc<dyn SiteAdapter>,
    /// Reconciliation policy for the site's cards
    pub policy: Policy,
}

impl SiteRegistration {
    /// Pair an adapter with a policy.
    #[must_use]
    pub fn new(adapter: Arc<dyn SiteAdapter>, policy: Policy) -> Self {
        Self { adapter, policy }
    }

    /// Site identifier of the adapter.
    #[must_use]
    pub fn site(&self) -> &SiteId {
        self.adapter.site()
    }

    /// Whether `host` belongs to this site.
    #[must_use]
    pub fn serves_host(&self, host: &str) -> bool {
        let host = host.trim_end_matches('.').to_ascii_lowercase();
        self.adapter.host_suffixes().iter().any(|suffix| {
            host == *suffix
                || host
                    .strip_suffix(suffix)
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }
}

impl std::fmt::Debug for SiteRegistration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SiteRegistration")
            .field("site", self.site())
            .field("policy", &self.policy)
            .finish()
    }
}

/// Ordered collection of site registrations.
#[derive(Debug, Clone, Default)]
pub struct SiteRegistry {
    sites: Vec<SiteRegistration>,
}

impl SiteRegistry {
    /// Create an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with every built-in site.
    ///
    /// LinkedIn and XING cross-reference each other; StepStone and Indeed
    /// hide postings that were already captured.
    pub fn with_defaults() -> Result<Self> {
        let linkedin = LinkedInAdapter::new()?;
        let xing = XingAdapter::new()?;

        let mut registry = Self::new();
        registry.register(SiteRegistration::new(
            Arc::new(linkedin),
            Policy::HighlightByCoverage {
                partner: SiteId::new(XingAdapter::SITE)?,
            },
        ));
        registry.register(SiteRegistration::new(
            Arc::new(xing),
            Policy::HighlightByCoverage {
                partner: SiteId::new(LinkedInAdapter::SITE)?,
            },
        ));
        registry.register(SiteRegistration::new(
            Arc::new(StepStoneAdapter::new()?),
            Policy::SuppressDuplicate,
        ));
        registry.register(SiteRegistration::new(
            Arc::new(IndeedAdapter::new()?),
            Policy::SuppressDuplicate,
        ));

        info!(count = registry.len(), "registered built-in sites");
        Ok(registry)
    }

    /// Add a registration, replacing any existing one for the same site.
    pub fn register(&mut self, registration: SiteRegistration) {
        self.sites.retain(|existing| existing.site() != registration.site());
        self.sites.push(registration);
    }

    /// Keep only the listed sites.
    pub fn retain_sites(&mut self, enabled: &[SiteId]) {
        self.sites.retain(|reg| enabled.contains(reg.site()));
    }

    /// Look up a site by identifier.
    #[must_use]
    pub fn get(&self, site: &SiteId) -> Option<&SiteRegistration> {
        self.sites.iter().find(|reg| reg.site() == site)
    }

    /// Look up the site serving a host name.
    #[must_use]
    pub fn for_host(&self, host: &str) -> Option<&SiteRegistration> {
        self.sites.iter().find(|reg| reg.serves_host(host))
    }

    /// All registrations in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &SiteRegistration> {
        self.sites.iter()
    }

    /// Number of registered sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.sites.len()
    }

    /// Whether no site is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sites.is_empty()
    }
}
