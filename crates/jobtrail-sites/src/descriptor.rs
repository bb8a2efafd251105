//! Normalized job descriptor and the text helpers adapters share.

use crate::error::{ExtractError, Result};
use jobtrail_core::{JobKey, SiteId};
use scraper::{ElementRef, Selector};
use serde::{Deserialize, Serialize};

/// What one observation of a job card says about the posting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobDescriptor {
    /// Site that rendered the card
    pub site: SiteId,
    /// Identifier assigned by that site, if one could be derived
    pub local_id: Option<String>,
    /// Job title
    pub title: String,
    /// Hiring company
    pub company: String,
    /// Location text as displayed
    pub location: String,
}

impl JobDescriptor {
    /// Canonical storage key, or `None` when there is no usable local id.
    #[must_use]
    pub fn key(&self) -> Option<JobKey> {
        self.local_id
            .as_deref()
            .and_then(|id| JobKey::from_local_id(id).ok())
    }

    /// The trimmed local id, or `None` if it is absent or blank.
    #[must_use]
    pub fn usable_local_id(&self) -> Option<&str> {
        self.local_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
    }
}

/// Compile a built-in selector.
pub(crate) fn selector(source: &str) -> Result<Selector> {
    Selector::parse(source).map_err(|e| ExtractError::InvalidSelector {
        selector: source.to_string(),
        reason: e.to_string(),
    })
}

/// Text of the element's subtree with whitespace runs collapsed.
pub(crate) fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Collapsed text of the first match of `selector` under `element`, if non-empty.
pub(crate) fn text_of(element: ElementRef<'_>, selector: &Selector) -> Option<String> {
    element
        .select(selector)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty())
}

/// First non-empty value of `attr` on a match of `selector` under `element`.
pub(crate) fn attr_of(element: ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    element
        .select(selector)
        .filter_map(|el| el.value().attr(attr))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}
