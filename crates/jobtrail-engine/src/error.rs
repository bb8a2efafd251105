//! Error types for the reconciliation engine.

use jobtrail_store::StoreError;
use thiserror::Error;

/// Errors raised while wiring up or driving the engine.
///
/// Per-card failures never surface here: they are logged and the card is
/// left for the next scan.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Record store failure
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    /// No registered site serves this host
    #[error("No site registered for host: {0}")]
    UnsupportedHost(String),

    /// Site id not present in the registry
    #[error("Unknown site: {0}")]
    UnknownSite(String),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, EngineError>;
