//! Jobtrail Sites - Job card extraction for the supported listing sites.
//!
//! Every supported site contributes one [`SiteAdapter`]: a stateless reader
//! that knows the site's card selector, the selectors for title, company and
//! location, and the rule for deriving the site-local job identifier. Adapters
//! never fail loudly; a card they cannot read yields `None` and a diagnostic.
//!
//! The [`SiteRegistry`] pairs each adapter with the reconciliation [`Policy`]
//! used for its cards.
//!
//! # Example
//!
//! ```rust
//! use jobtrail_sites::SiteRegistry;
//! use scraper::Html;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let registry = SiteRegistry::with_defaults()?;
//! let linkedin = registry.for_host("www.linkedin.com").expect("linkedin registered");
//!
//! let page = Html::parse_fragment(
//!     r#"<div class="job-card-container" data-job-id="42">
//!          <a class="job-card-container__link"><span aria-hidden="true">Rust Engineer</span></a>
//!        </div>"#,
//! );
//! let card = page.select(linkedin.adapter.card_selector()).next().expect("card");
//! let descriptor = linkedin.adapter.extract(card).expect("descriptor");
//! assert_eq!(descriptor.local_id.as_deref(), Some("42"));
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod adapter;
pub mod descriptor;
pub mod error;
pub mod indeed;
pub mod linkedin;
pub mod registry;
pub mod stepstone;
pub mod xing;

// Re-export commonly used types
pub use adapter::{Policy, SiteAdapter};
pub use descriptor::JobDescriptor;
pub use error::{ExtractError, Result};
pub use indeed::IndeedAdapter;
pub use linkedin::LinkedInAdapter;
pub use registry::{SiteRegistration, SiteRegistry};
pub use stepstone::StepStoneAdapter;
pub use xing::XingAdapter;
