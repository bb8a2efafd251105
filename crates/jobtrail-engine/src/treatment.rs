//! Treatments and the policy decision that picks one.

use jobtrail_core::SiteId;
use jobtrail_sites::Policy;
use jobtrail_store::JobRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Background marker applied to a card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Highlight {
    /// Captured on this site
    Yellow,
    /// Captured on the partner site only
    Green,
    /// Captured on both paired sites
    Orange,
}

impl Highlight {
    /// CSS color name applied as the card background.
    #[must_use]
    pub fn css_color(self) -> &'static str {
        match self {
            Self::Yellow => "yellow",
            Self::Green => "green",
            Self::Orange => "orange",
        }
    }
}

impl fmt::Display for Highlight {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.css_color())
    }
}

/// Visible and storage outcome of reconciling one card.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "color", rename_all = "snake_case")]
pub enum Treatment {
    /// Apply a persistent background marker.
    Highlight(Highlight),
    /// Hide the card.
    Suppress,
    /// Persist nothing now; capture on the first interaction.
    DeferredCapture,
}

impl Treatment {
    /// Whether this treatment arms a capture on first interaction.
    ///
    /// A green card is known from the partner site only; hovering it adds
    /// this site's occurrence.
    #[must_use]
    pub fn arms_capture(self) -> bool {
        matches!(self, Self::DeferredCapture | Self::Highlight(Highlight::Green))
    }
}

impl fmt::Display for Treatment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Highlight(color) => write!(f, "highlight {color}"),
            Self::Suppress => f.write_str("suppress"),
            Self::DeferredCapture => f.write_str("deferred capture"),
        }
    }
}

/// Pick the treatment for a card of `site` given its stored record.
///
/// A record without any occurrence counts as absent.
#[must_use]
pub fn decide(policy: &Policy, site: &SiteId, record: Option<&JobRecord>) -> Treatment {
    let record = record.filter(|r| r.has_occurrences());

    match policy {
        Policy::HighlightByCoverage { partner } => {
            let here = record.is_some_and(|r| r.seen_on(site));
            let there = record.is_some_and(|r| r.seen_on(partner));
            match (here, there) {
                (true, true) => Treatment::Highlight(Highlight::Orange),
                (false, true) => Treatment::Highlight(Highlight::Green),
                (true, false) => Treatment::Highlight(Highlight::Yellow),
                (false, false) => Treatment::DeferredCapture,
            }
        }
        Policy::SuppressDuplicate => match record {
            Some(_) => Treatment::Suppress,
            None => Treatment::DeferredCapture,
        },
    }
}
