//! Jobtrail Engine - Cross-site reconciliation of observed job cards.
//!
//! Given a live [`Page`], an [`ObservationScheduler`] per site watches for
//! inserted job cards, debounces bursts of insertions into single scans, and
//! hands each unprocessed card to its [`Reconciler`]. The reconciler looks the
//! card's job up in the record store, picks a [`Treatment`] from the site's
//! policy, applies it to the card and, when the job is not yet captured for
//! this site, arms a one-shot [`DeferredCapture`] that persists the sighting
//! on the user's first interaction with the card.
//!
//! The [`JobBoard`] lists what has been captured and resets everything.
//!
//! # Example
//!
//! ```rust,ignore
//! use jobtrail_engine::{JobBoard, ObservationScheduler, Page, DEFAULT_DEBOUNCE};
//!
//! let board = JobBoard::new(store.clone());
//! let page = Page::from_html(&html);
//! let scheduler = ObservationScheduler::for_host(&registry, "www.xing.com", store, page, DEFAULT_DEBOUNCE)?
//!     .with_control(board.subscribe());
//! let report = scheduler.scan_now().await;
//! println!("{report}");
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]

pub mod board;
pub mod capture;
pub mod error;
pub mod marks;
pub mod observer;
pub mod page;
pub mod reconcile;
pub mod treatment;

// Re-export commonly used types
pub use board::{ControlMessage, JobBoard, JobListing};
pub use capture::{CaptureAction, DeferredCapture};
pub use error::{EngineError, Result};
pub use marks::ProcessingMarks;
pub use observer::{ObservationScheduler, DEFAULT_DEBOUNCE};
pub use page::{CardId, CardStyle, InteractionListener, MutationBatch, NodeId, Page, SubscriptionId};
pub use reconcile::{CardOutcome, Outcome, Reconciler, ScanReport};
pub use treatment::{decide, Highlight, Treatment};
