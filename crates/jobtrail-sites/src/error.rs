//! Error types for job card extraction.

use jobtrail_core::SiteId;
use thiserror::Error;

/// Errors that can occur while reading a job card.
///
/// These never leave an adapter's [`extract`](crate::SiteAdapter::extract);
/// they are logged and the card is skipped.
#[derive(Error, Debug)]
pub enum ExtractError {
    /// A link on the card could not be parsed as a URL
    #[error("card on {site} has an invalid link '{href}': {source}")]
    InvalidUrl {
        /// Site the card belongs to
        site: SiteId,
        /// Raw `href` value
        href: String,
        /// URL parse error
        #[source]
        source: url::ParseError,
    },

    /// A built-in selector failed to compile
    #[error("invalid selector '{selector}': {reason}")]
    InvalidSelector {
        /// Selector source text
        selector: String,
        /// Parser message
        reason: String,
    },

    /// Invalid site ID format
    #[error("invalid site ID: {0}")]
    InvalidId(#[from] jobtrail_core::JobtrailError),
}

/// Result type for extraction operations.
pub type Result<T> = std::result::Result<T, ExtractError>;
