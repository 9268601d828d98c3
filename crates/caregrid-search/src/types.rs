//! Candidate and result types flowing through the search pipeline.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use caregrid_core::{Coordinates, PlanTier, ServiceMode};

/// Which of the two data sources a candidate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    Authoritative,
    Ingested,
}

/// One listing/location pair from the provider-managed store.
///
/// A multi-location listing yields one candidate per location; `location_id`
/// is the dedup unit. `plan_tier` is the *effective* tier — the store already
/// downgrades lapsed subscriptions before candidates reach the engine.
#[derive(Debug, Clone)]
pub struct AuthoritativeCandidate {
    pub listing_id: Uuid,
    pub location_id: Uuid,
    pub agency_name: String,
    pub slug: String,
    pub headline: Option<String>,
    pub city: String,
    pub state: String,
    pub coordinates: Option<Coordinates>,
    pub service_mode: ServiceMode,
    pub insurances: Vec<String>,
    pub plan_tier: PlanTier,
    pub has_featured_addon: bool,
    pub is_accepting_clients: bool,
    pub created_at: DateTime<Utc>,
}

/// One active auto-ingested place record.
#[derive(Debug, Clone)]
pub struct IngestedCandidate {
    pub place_id: String,
    pub name: String,
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    pub coordinates: Option<Coordinates>,
}

/// A reconciled candidate, tagged with its source.
#[derive(Debug, Clone)]
pub enum Candidate {
    Authoritative(AuthoritativeCandidate),
    Ingested(IngestedCandidate),
}

impl Candidate {
    #[must_use]
    pub fn source(&self) -> SourceKind {
        match self {
            Candidate::Authoritative(_) => SourceKind::Authoritative,
            Candidate::Ingested(_) => SourceKind::Ingested,
        }
    }

    /// Stable identity: location id for authoritative candidates, external
    /// place id for ingested ones.
    #[must_use]
    pub fn id(&self) -> String {
        match self {
            Candidate::Authoritative(c) => c.location_id.to_string(),
            Candidate::Ingested(c) => c.place_id.clone(),
        }
    }

    #[must_use]
    pub fn display_name(&self) -> &str {
        match self {
            Candidate::Authoritative(c) => &c.agency_name,
            Candidate::Ingested(c) => &c.name,
        }
    }

    #[must_use]
    pub fn city(&self) -> &str {
        match self {
            Candidate::Authoritative(c) => &c.city,
            Candidate::Ingested(c) => &c.city,
        }
    }

    #[must_use]
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Candidate::Authoritative(c) => c.coordinates,
            Candidate::Ingested(c) => c.coordinates,
        }
    }
}

/// A candidate annotated with its distance from the query origin, when a geo
/// query is present.
#[derive(Debug, Clone)]
pub struct RankedCandidate {
    pub candidate: Candidate,
    pub distance_miles: Option<f64>,
}

/// One result record as returned to callers.
#[derive(Debug, Clone, Serialize)]
pub struct SearchItem {
    pub id: String,
    pub source: SourceKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slug: Option<String>,
    pub city: String,
    pub state: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_tier: Option<PlanTier>,
    pub is_featured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub distance_miles: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub service_mode: Option<ServiceMode>,
    pub insurances: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_accepting_clients: Option<bool>,
}

impl SearchItem {
    #[must_use]
    pub fn from_ranked(ranked: RankedCandidate) -> Self {
        let distance_miles = ranked.distance_miles;
        match ranked.candidate {
            Candidate::Authoritative(c) => SearchItem {
                id: c.location_id.to_string(),
                source: SourceKind::Authoritative,
                name: c.agency_name,
                slug: Some(c.slug),
                city: c.city,
                state: c.state,
                plan_tier: Some(c.plan_tier),
                is_featured: c.has_featured_addon,
                distance_miles,
                service_mode: Some(c.service_mode),
                insurances: c.insurances,
                is_accepting_clients: Some(c.is_accepting_clients),
            },
            Candidate::Ingested(c) => SearchItem {
                id: c.place_id,
                source: SourceKind::Ingested,
                name: c.name,
                slug: None,
                city: c.city,
                state: c.state,
                plan_tier: None,
                is_featured: false,
                distance_miles,
                service_mode: None,
                insurances: Vec::new(),
                is_accepting_clients: None,
            },
        }
    }
}

/// A search impression for analytics callers: the engine performs no I/O
/// itself, it only exposes what a caller needs to record one event per
/// returned position.
#[derive(Debug, Clone, Serialize)]
pub struct Impression {
    pub candidate_id: String,
    pub source: SourceKind,
    /// Zero-based position in the overall ranking, not within the page.
    pub position: usize,
}

/// The merged, ranked, paginated search response.
#[derive(Debug, Clone, Serialize)]
pub struct CombinedSearchResult {
    pub items: Vec<SearchItem>,
    pub total: usize,
    pub page: u32,
    pub page_size: u32,
    pub total_pages: usize,
    /// True when the ingested source failed or timed out and the result is
    /// authoritative-only.
    pub degraded: bool,
}

impl CombinedSearchResult {
    /// Ordered `(candidate_id, source, position)` tuples for this page.
    #[must_use]
    pub fn impressions(&self) -> Vec<Impression> {
        let offset = (self.page as usize - 1) * self.page_size as usize;
        self.items
            .iter()
            .enumerate()
            .map(|(i, item)| Impression {
                candidate_id: item.id.clone(),
                source: item.source,
                position: offset + i,
            })
            .collect()
    }
}
