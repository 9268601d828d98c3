use thiserror::Error;

use caregrid_core::ValidationError;

/// A source fetch failure, as reported by whichever store backs the trait.
#[derive(Debug, Error)]
#[error("{reason}")]
pub struct SourceError {
    pub reason: String,
}

impl SourceError {
    #[must_use]
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SearchError {
    /// Malformed filters or options; rejected before any fetch, never retried.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The authoritative source failed. Authoritative data is load-bearing,
    /// so the whole search fails; the same failure on the ingested source
    /// only degrades the result.
    #[error("authoritative source unavailable: {0}")]
    SourceUnavailable(#[source] SourceError),

    /// The caller's deadline fired before the pipeline finished.
    #[error("search canceled before completion")]
    Cancelled,
}
