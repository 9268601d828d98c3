//! Search orchestration: validate, fan out to both sources, reconcile, rank,
//! paginate.

use std::collections::HashSet;
use std::future::Future;
use std::time::Duration;

use caregrid_core::{geo, SearchFilters, SearchOptions};

use crate::error::{SearchError, SourceError};
use crate::matcher::MatchPolicy;
use crate::types::{
    AuthoritativeCandidate, CombinedSearchResult, IngestedCandidate, SearchItem,
};
use crate::{paginate, rank, reconcile};

/// Provider-managed listing store. Implementations push every predicate they
/// can down to the store and return only published listings, one candidate
/// per listing/location pair.
pub trait AuthoritativeSource {
    fn fetch_published(
        &self,
        filters: &SearchFilters,
    ) -> impl Future<Output = Result<Vec<AuthoritativeCandidate>, SourceError>> + Send;
}

/// What the ingested store hands back in one round trip: active candidates
/// plus the approved-removal id set the reconciler re-checks.
#[derive(Debug, Default)]
pub struct IngestedFetch {
    pub candidates: Vec<IngestedCandidate>,
    pub approved_removals: HashSet<String>,
}

/// Auto-ingested place record store. Returns only `active` rows.
pub trait IngestedSource {
    fn fetch_active(
        &self,
        filters: &SearchFilters,
    ) -> impl Future<Output = Result<IngestedFetch, SourceError>> + Send;
}

#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// Budget for the supplementary ingested fetch; expiry degrades the
    /// result instead of failing it.
    pub ingested_timeout: Duration,
    /// Overall deadline for one search call. `None` leaves cancellation
    /// entirely to the caller dropping the future.
    pub deadline: Option<Duration>,
    pub match_policy: MatchPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            ingested_timeout: Duration::from_millis(1500),
            deadline: None,
            match_policy: MatchPolicy::default(),
        }
    }
}

/// Top-level entry point. Holds the two source handles and no other state;
/// nothing is cached across requests.
pub struct SearchEngine<A, I> {
    authoritative: A,
    ingested: I,
    config: EngineConfig,
}

impl<A, I> SearchEngine<A, I>
where
    A: AuthoritativeSource + Sync,
    I: IngestedSource + Sync,
{
    pub fn new(authoritative: A, ingested: I, config: EngineConfig) -> Self {
        Self {
            authoritative,
            ingested,
            config,
        }
    }

    /// Run one search: validate, fetch both sources concurrently, reconcile,
    /// rank, paginate.
    ///
    /// # Errors
    ///
    /// [`SearchError::Validation`] for malformed input (before any fetch),
    /// [`SearchError::SourceUnavailable`] when the authoritative fetch fails,
    /// [`SearchError::Cancelled`] when the configured deadline fires. An
    /// ingested-source failure is not an error; it yields a `degraded` result.
    pub async fn search(
        &self,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<CombinedSearchResult, SearchError> {
        filters.validate()?;
        options.validate()?;

        match self.config.deadline {
            Some(deadline) => tokio::time::timeout(deadline, self.run(filters, options))
                .await
                .map_err(|_| SearchError::Cancelled)?,
            None => self.run(filters, options).await,
        }
    }

    async fn run(
        &self,
        filters: &SearchFilters,
        options: &SearchOptions,
    ) -> Result<CombinedSearchResult, SearchError> {
        let authoritative_fut = self.authoritative.fetch_published(filters);
        let ingested_fut =
            tokio::time::timeout(self.config.ingested_timeout, self.ingested.fetch_active(filters));

        let (authoritative_res, ingested_res) = tokio::join!(authoritative_fut, ingested_fut);

        let mut authoritative = authoritative_res.map_err(|e| {
            tracing::error!(error = %e, "authoritative fetch failed");
            SearchError::SourceUnavailable(e)
        })?;

        let (ingested_fetch, degraded) = match ingested_res {
            Ok(Ok(fetch)) => (fetch, false),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "ingested source unavailable; serving authoritative-only results");
                (IngestedFetch::default(), true)
            }
            Err(_) => {
                tracing::warn!(
                    timeout = ?self.config.ingested_timeout,
                    "ingested fetch timed out; serving authoritative-only results"
                );
                (IngestedFetch::default(), true)
            }
        };
        let mut ingested = ingested_fetch.candidates;

        // Radius filtering stays in-memory: not every store can evaluate
        // haversine distance, so the contract keeps it out of the fetchers.
        let origin = filters.origin();
        if let (Some(center), Some(radius)) = (origin, filters.radius_miles) {
            authoritative.retain(|c| {
                c.coordinates
                    .is_some_and(|p| geo::within_radius(center, p, radius))
            });
            ingested.retain(|c| {
                c.coordinates
                    .is_some_and(|p| geo::within_radius(center, p, radius))
            });
        }

        if let Some(query) = filters.query.as_deref() {
            let needle = query.trim().to_lowercase();
            if !needle.is_empty() {
                authoritative.retain(|c| {
                    c.agency_name.to_lowercase().contains(&needle)
                        || c.headline
                            .as_deref()
                            .is_some_and(|h| h.to_lowercase().contains(&needle))
                        || c.city.to_lowercase().contains(&needle)
                });
                ingested.retain(|c| {
                    c.name.to_lowercase().contains(&needle)
                        || c.city.to_lowercase().contains(&needle)
                });
            }
        }

        let merged = reconcile::merge(
            authoritative,
            ingested,
            &ingested_fetch.approved_removals,
            &self.config.match_policy,
        );
        let ranked = rank::rank(merged, options.sort_by, origin);
        let page = paginate::slice(ranked, options.page, options.page_size);

        Ok(CombinedSearchResult {
            items: page.items.into_iter().map(SearchItem::from_ranked).collect(),
            total: page.total,
            page: options.page,
            page_size: options.page_size,
            total_pages: page.total_pages,
            degraded,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::SourceKind;
    use caregrid_core::{Coordinates, PlanTier, ServiceMode, SortBy, ValidationError};
    use chrono::Utc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use uuid::Uuid;

    const AUSTIN: Coordinates = Coordinates {
        lat: 30.27,
        lng: -97.74,
    };

    fn auth_candidate(name: &str, city: &str, state: &str) -> AuthoritativeCandidate {
        AuthoritativeCandidate {
            listing_id: Uuid::new_v4(),
            location_id: Uuid::new_v4(),
            agency_name: name.to_string(),
            slug: name.to_lowercase().replace(' ', "-"),
            headline: None,
            city: city.to_string(),
            state: state.to_string(),
            coordinates: Some(AUSTIN),
            service_mode: ServiceMode::InCenter,
            insurances: Vec::new(),
            plan_tier: PlanTier::Pro,
            has_featured_addon: true,
            is_accepting_clients: true,
            created_at: Utc::now(),
        }
    }

    fn ingested_candidate(place_id: &str, name: &str) -> IngestedCandidate {
        IngestedCandidate {
            place_id: place_id.to_string(),
            name: name.to_string(),
            street: None,
            city: "Austin".to_string(),
            state: "TX".to_string(),
            coordinates: Some(AUSTIN),
        }
    }

    /// Test double serving canned candidate sets, optionally failing or
    /// stalling to exercise the degraded paths.
    struct FakeAuthoritative {
        candidates: Vec<AuthoritativeCandidate>,
        fail: bool,
        calls: AtomicUsize,
    }

    impl FakeAuthoritative {
        fn with(candidates: Vec<AuthoritativeCandidate>) -> Self {
            Self {
                candidates,
                fail: false,
                calls: AtomicUsize::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                candidates: Vec::new(),
                fail: true,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl AuthoritativeSource for FakeAuthoritative {
        async fn fetch_published(
            &self,
            _filters: &SearchFilters,
        ) -> Result<Vec<AuthoritativeCandidate>, SourceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(SourceError::new("listings store offline"));
            }
            Ok(self.candidates.clone())
        }
    }

    struct FakeIngested {
        candidates: Vec<IngestedCandidate>,
        approved_removals: HashSet<String>,
        fail: bool,
        delay: Option<Duration>,
    }

    impl FakeIngested {
        fn with(candidates: Vec<IngestedCandidate>) -> Self {
            Self {
                candidates,
                approved_removals: HashSet::new(),
                fail: false,
                delay: None,
            }
        }

        fn empty() -> Self {
            Self::with(Vec::new())
        }
    }

    impl IngestedSource for FakeIngested {
        async fn fetch_active(
            &self,
            _filters: &SearchFilters,
        ) -> Result<IngestedFetch, SourceError> {
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                return Err(SourceError::new("places store offline"));
            }
            Ok(IngestedFetch {
                candidates: self.candidates.clone(),
                approved_removals: self.approved_removals.clone(),
            })
        }
    }

    fn engine(
        authoritative: FakeAuthoritative,
        ingested: FakeIngested,
    ) -> SearchEngine<FakeAuthoritative, FakeIngested> {
        SearchEngine::new(authoritative, ingested, EngineConfig::default())
    }

    fn tx_filters() -> SearchFilters {
        SearchFilters {
            state: Some("TX".to_string()),
            city: Some("Austin".to_string()),
            ..SearchFilters::default()
        }
    }

    #[tokio::test]
    async fn invalid_filters_rejected_before_any_fetch() {
        let authoritative = FakeAuthoritative::with(Vec::new());
        let filters = SearchFilters {
            radius_miles: Some(10.0),
            ..SearchFilters::default()
        };
        let engine = engine(authoritative, FakeIngested::empty());
        let err = engine
            .search(&filters, &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SearchError::Validation(ValidationError::RadiusWithoutOrigin)
        ));
        assert_eq!(engine.authoritative.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn duplicate_ingested_record_is_suppressed() {
        // An authoritative "Sunrise ABA" and an ingested "Sunrise ABA LLC" at
        // the same address must collapse to the single authoritative item.
        let engine = engine(
            FakeAuthoritative::with(vec![auth_candidate("Sunrise ABA", "Austin", "TX")]),
            FakeIngested::with(vec![ingested_candidate("p1", "Sunrise ABA LLC")]),
        );
        let result = engine
            .search(&tx_filters(), &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].name, "Sunrise ABA");
        assert_eq!(result.items[0].source, SourceKind::Authoritative);
        assert!(!result.degraded);
    }

    #[tokio::test]
    async fn pagination_slices_ranked_sequence() {
        let candidates: Vec<AuthoritativeCandidate> = (0..25)
            .map(|i| auth_candidate(&format!("Agency {i:02}"), "Newark", "NJ"))
            .collect();
        let engine = engine(FakeAuthoritative::with(candidates), FakeIngested::empty());
        let options = SearchOptions {
            page: 2,
            page_size: 10,
            sort_by: SortBy::Name,
        };
        let filters = SearchFilters {
            state: Some("NJ".to_string()),
            ..SearchFilters::default()
        };
        let result = engine.search(&filters, &options).await.unwrap();

        assert_eq!(result.total, 25);
        assert_eq!(result.total_pages, 3);
        assert_eq!(result.items.len(), 10);
        assert_eq!(result.items[0].name, "Agency 10");
        assert_eq!(result.items[9].name, "Agency 19");
    }

    #[tokio::test]
    async fn radius_filter_excludes_far_candidates() {
        let mut near = auth_candidate("Near ABA", "Austin", "TX");
        near.coordinates = Some(Coordinates::new(30.27 + 3.0 / 69.0, -97.74));
        let mut far = auth_candidate("Far ABA", "Austin", "TX");
        far.coordinates = Some(Coordinates::new(30.27 + 15.0 / 69.0, -97.74));

        let engine = engine(FakeAuthoritative::with(vec![near, far]), FakeIngested::empty());
        let filters = SearchFilters {
            user_lat: Some(30.27),
            user_lng: Some(-97.74),
            radius_miles: Some(10.0),
            ..SearchFilters::default()
        };
        let result = engine.search(&filters, &SearchOptions::default()).await.unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].name, "Near ABA");
        assert!(result.items[0].distance_miles.unwrap() < 10.0);
    }

    #[tokio::test]
    async fn radius_filter_drops_candidates_without_coordinates() {
        let mut no_coords = auth_candidate("Mystery ABA", "Austin", "TX");
        no_coords.coordinates = None;
        let engine = engine(FakeAuthoritative::with(vec![no_coords]), FakeIngested::empty());
        let filters = SearchFilters {
            user_lat: Some(30.27),
            user_lng: Some(-97.74),
            radius_miles: Some(10.0),
            ..SearchFilters::default()
        };
        let result = engine.search(&filters, &SearchOptions::default()).await.unwrap();
        assert_eq!(result.total, 0);
    }

    #[tokio::test]
    async fn free_text_query_filters_both_sources() {
        let engine = engine(
            FakeAuthoritative::with(vec![
                auth_candidate("Sunrise ABA", "Austin", "TX"),
                auth_candidate("Bluebonnet Behavioral", "Austin", "TX"),
            ]),
            FakeIngested::with(vec![ingested_candidate("p1", "Sunrise Therapy Center")]),
        );
        let filters = SearchFilters {
            query: Some("sunrise".to_string()),
            ..SearchFilters::default()
        };
        let result = engine.search(&filters, &SearchOptions::default()).await.unwrap();

        assert_eq!(result.total, 2);
        assert!(result.items.iter().all(|i| i.name.contains("Sunrise")));
    }

    #[tokio::test]
    async fn authoritative_failure_fails_the_search() {
        let engine = engine(FakeAuthoritative::failing(), FakeIngested::empty());
        let err = engine
            .search(&SearchFilters::default(), &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::SourceUnavailable(_)));
    }

    #[tokio::test]
    async fn ingested_failure_degrades_instead_of_failing() {
        let mut ingested = FakeIngested::with(vec![ingested_candidate("p1", "Some Place")]);
        ingested.fail = true;
        let engine = engine(
            FakeAuthoritative::with(vec![auth_candidate("Sunrise ABA", "Austin", "TX")]),
            ingested,
        );
        let result = engine
            .search(&tx_filters(), &SearchOptions::default())
            .await
            .unwrap();

        assert!(result.degraded);
        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].source, SourceKind::Authoritative);
    }

    #[tokio::test(start_paused = true)]
    async fn ingested_timeout_degrades_with_authoritative_only_total() {
        let mut ingested = FakeIngested::with(vec![ingested_candidate("p1", "Some Place")]);
        ingested.delay = Some(Duration::from_secs(30));
        let engine = engine(
            FakeAuthoritative::with(vec![auth_candidate("Sunrise ABA", "Austin", "TX")]),
            ingested,
        );
        let result = engine
            .search(&tx_filters(), &SearchOptions::default())
            .await
            .unwrap();

        assert!(result.degraded);
        assert_eq!(result.total, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn deadline_expiry_cancels_the_search() {
        let mut ingested = FakeIngested::empty();
        ingested.delay = Some(Duration::from_secs(60));
        let config = EngineConfig {
            ingested_timeout: Duration::from_secs(120),
            deadline: Some(Duration::from_secs(5)),
            match_policy: MatchPolicy::default(),
        };
        let engine = SearchEngine::new(
            FakeAuthoritative::with(vec![auth_candidate("Sunrise ABA", "Austin", "TX")]),
            ingested,
            config,
        );
        let err = engine
            .search(&SearchFilters::default(), &SearchOptions::default())
            .await
            .unwrap_err();
        assert!(matches!(err, SearchError::Cancelled));
    }

    #[tokio::test]
    async fn approved_removals_are_dropped_even_when_fetcher_returns_them() {
        let mut ingested = FakeIngested::with(vec![
            ingested_candidate("p1", "Lingering Duplicate"),
            ingested_candidate("p2", "Legit Place"),
        ]);
        ingested.approved_removals = HashSet::from(["p1".to_string()]);
        let engine = engine(FakeAuthoritative::with(Vec::new()), ingested);
        let result = engine
            .search(&tx_filters(), &SearchOptions::default())
            .await
            .unwrap();

        assert_eq!(result.total, 1);
        assert_eq!(result.items[0].id, "p2");
    }

    #[tokio::test]
    async fn search_is_deterministic_across_calls() {
        let candidates: Vec<AuthoritativeCandidate> = (0..8)
            .map(|i| auth_candidate(&format!("Agency {i}"), "Austin", "TX"))
            .collect();
        let engine = engine(
            FakeAuthoritative::with(candidates),
            FakeIngested::with(vec![
                ingested_candidate("p1", "Place One"),
                ingested_candidate("p2", "Place Two"),
            ]),
        );
        let options = SearchOptions::default();
        let first = engine.search(&tx_filters(), &options).await.unwrap();
        let second = engine.search(&tx_filters(), &options).await.unwrap();

        let ids = |r: &CombinedSearchResult| {
            r.items.iter().map(|i| i.id.clone()).collect::<Vec<_>>()
        };
        assert_eq!(ids(&first), ids(&second));
        assert_eq!(first.total, second.total);
    }

    #[tokio::test]
    async fn impressions_expose_page_positions() {
        let engine = engine(
            FakeAuthoritative::with(vec![auth_candidate("Sunrise ABA", "Austin", "TX")]),
            FakeIngested::with(vec![ingested_candidate("p1", "Other Place")]),
        );
        let result = engine
            .search(&tx_filters(), &SearchOptions::default())
            .await
            .unwrap();
        let impressions = result.impressions();

        assert_eq!(impressions.len(), 2);
        assert_eq!(impressions[0].position, 0);
        assert_eq!(impressions[0].source, SourceKind::Authoritative);
        assert_eq!(impressions[1].source, SourceKind::Ingested);
    }
}
