//! Postgres-backed implementations of the search source traits.

use sqlx::PgPool;

use caregrid_core::{effective_plan_tier, Coordinates, PlanTier, SearchFilters};
use caregrid_search::{
    AuthoritativeCandidate, AuthoritativeSource, IngestedCandidate, IngestedFetch,
    IngestedSource, SourceError,
};

use crate::ingested::{approved_removal_ids, search_active_places, IngestedPlaceRow};
use crate::listings::{search_published_listings, ListingSearchRow};

#[derive(Debug, Clone)]
pub struct PgAuthoritativeSource {
    pool: PgPool,
}

impl PgAuthoritativeSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl AuthoritativeSource for PgAuthoritativeSource {
    async fn fetch_published(
        &self,
        filters: &SearchFilters,
    ) -> Result<Vec<AuthoritativeCandidate>, SourceError> {
        let rows = search_published_listings(&self.pool, filters)
            .await
            .map_err(|e| SourceError::new(e.to_string()))?;
        rows.into_iter().map(listing_candidate).collect()
    }
}

#[derive(Debug, Clone)]
pub struct PgIngestedSource {
    pool: PgPool,
}

impl PgIngestedSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl IngestedSource for PgIngestedSource {
    async fn fetch_active(
        &self,
        filters: &SearchFilters,
    ) -> Result<IngestedFetch, SourceError> {
        let places = search_active_places(&self.pool, filters)
            .await
            .map_err(|e| SourceError::new(e.to_string()))?;
        let approved_removals = approved_removal_ids(&self.pool)
            .await
            .map_err(|e| SourceError::new(e.to_string()))?;
        Ok(IngestedFetch {
            candidates: places.into_iter().map(place_candidate).collect(),
            approved_removals,
        })
    }
}

fn coordinates(lat: Option<f64>, lng: Option<f64>) -> Option<Coordinates> {
    match (lat, lng) {
        (Some(lat), Some(lng)) => Some(Coordinates::new(lat, lng)),
        _ => None,
    }
}

fn listing_candidate(row: ListingSearchRow) -> Result<AuthoritativeCandidate, SourceError> {
    let stored_tier: PlanTier = row.plan_tier.parse().unwrap_or(PlanTier::Free);
    // Paid placement requires a live subscription; lapsed listings rank free.
    let plan_tier = effective_plan_tier(stored_tier, row.subscription_status.as_deref());

    // The column is CHECK-constrained, so a parse failure means corrupt data.
    let service_mode = row
        .service_mode
        .parse()
        .map_err(|e: caregrid_core::DomainError| SourceError::new(e.to_string()))?;

    Ok(AuthoritativeCandidate {
        listing_id: row.listing_id,
        location_id: row.location_id,
        agency_name: row.agency_name,
        slug: row.slug,
        headline: row.headline,
        city: row.city,
        state: row.state,
        coordinates: coordinates(row.latitude, row.longitude),
        service_mode,
        insurances: row.insurances,
        plan_tier,
        has_featured_addon: row.has_featured_addon,
        is_accepting_clients: row.is_accepting_clients,
        created_at: row.created_at,
    })
}

fn place_candidate(row: IngestedPlaceRow) -> IngestedCandidate {
    IngestedCandidate {
        place_id: row.place_id,
        name: row.name,
        street: row.street,
        city: row.city,
        state: row.state,
        coordinates: coordinates(row.latitude, row.longitude),
    }
}
