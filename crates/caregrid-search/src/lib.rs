//! Directory search and reconciliation engine.
//!
//! Merges two asymmetrically-trusted sources — provider-managed listings and
//! auto-ingested place records — into one deduplicated, ranked, paginated
//! result set. Everything here is a pure read/compute pipeline over a snapshot
//! of the two sources; the only persisted mutation in the system (removal
//! request decisions) lives in the db crate.

pub mod engine;
pub mod error;
pub mod matcher;
pub mod paginate;
pub mod rank;
pub mod reconcile;
pub mod types;

pub use engine::{
    AuthoritativeSource, EngineConfig, IngestedFetch, IngestedSource, SearchEngine,
};
pub use error::{SearchError, SourceError};
pub use matcher::{normalize_business_name, same_business, MatchPolicy};
pub use types::{
    AuthoritativeCandidate, Candidate, CombinedSearchResult, Impression, IngestedCandidate,
    RankedCandidate, SearchItem, SourceKind,
};
