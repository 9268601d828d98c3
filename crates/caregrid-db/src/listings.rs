//! Database operations for the `listings` and `listing_locations` tables.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use caregrid_core::{geo, states, SearchFilters};

/// One published listing/location pair, flattened for search. A listing with
/// three locations produces three rows.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ListingSearchRow {
    pub listing_id: Uuid,
    pub location_id: Uuid,
    pub agency_name: String,
    pub slug: String,
    pub headline: Option<String>,
    pub city: String,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub service_mode: String,
    pub insurances: Vec<String>,
    pub plan_tier: String,
    pub subscription_status: Option<String>,
    pub has_featured_addon: bool,
    pub is_accepting_clients: bool,
    pub created_at: DateTime<Utc>,
}

/// Fetch published listing/location pairs matching the pushed-down filters.
///
/// Exact radius and free-text matching stay out of this query; only the
/// predicates Postgres can evaluate cheaply are pushed down, including a
/// coarse bounding-box prefilter when a geo query is present. A state filter
/// matches either the stored abbreviation or the full state name, since
/// provider-entered addresses carry both forms.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_published_listings(
    pool: &PgPool,
    filters: &SearchFilters,
) -> Result<Vec<ListingSearchRow>, sqlx::Error> {
    let (state_abbrev, state_name) = match filters.state.as_deref() {
        Some(raw) => match states::state_forms(raw) {
            Some(forms) => (Some(forms.abbrev.to_string()), Some(forms.name.to_string())),
            None => (Some(raw.to_string()), Some(raw.to_string())),
        },
        None => (None, None),
    };

    let insurances = non_empty(&filters.insurances);
    let languages = non_empty(&filters.languages);
    let diagnoses = non_empty(&filters.diagnoses);
    let service_modes: Option<Vec<String>> = if filters.service_modes.is_empty() {
        None
    } else {
        Some(
            filters
                .service_modes
                .iter()
                .map(|m| m.as_str().to_string())
                .collect(),
        )
    };
    let (age_min, age_max) = filters
        .ages_served
        .map_or((None, None), |r| (r.min.map(i16::from), r.max.map(i16::from)));
    let accepting = filters.availability_only.then_some(true);
    let bbox = match (filters.origin(), filters.radius_miles) {
        (Some(center), Some(radius)) => Some(geo::bounding_box(center, radius)),
        _ => None,
    };

    sqlx::query_as::<_, ListingSearchRow>(
        "SELECT l.id AS listing_id, loc.id AS location_id, \
                l.agency_name, l.slug, l.headline, \
                loc.city, loc.state, loc.latitude, loc.longitude, \
                loc.service_mode, loc.insurances, \
                l.plan_tier, l.subscription_status, \
                l.has_featured_addon, l.is_accepting_clients, l.created_at \
         FROM listings l \
         JOIN listing_locations loc ON loc.listing_id = l.id \
         WHERE l.status = 'published' \
           AND ($1::TEXT IS NULL OR loc.state ILIKE $1 OR loc.state ILIKE $2) \
           AND ($3::TEXT IS NULL OR loc.city ILIKE $3) \
           AND ($4::TEXT[] IS NULL OR loc.insurances && $4) \
           AND ($5::TEXT[] IS NULL OR loc.service_mode = ANY($5)) \
           AND ($6::TEXT[] IS NULL OR l.languages && $6) \
           AND ($7::TEXT[] IS NULL OR l.diagnoses && $7) \
           AND ($8::SMALLINT IS NULL OR l.age_max IS NULL OR l.age_max >= $8) \
           AND ($9::SMALLINT IS NULL OR l.age_min IS NULL OR l.age_min <= $9) \
           AND ($10::BOOLEAN IS NULL OR l.is_accepting_clients = $10) \
           AND ($11::FLOAT8 IS NULL OR (loc.latitude BETWEEN $11 AND $12 \
                                        AND loc.longitude BETWEEN $13 AND $14)) \
         ORDER BY l.agency_name ASC, loc.id ASC",
    )
    .bind(state_abbrev)
    .bind(state_name)
    .bind(filters.city.as_deref())
    .bind(insurances)
    .bind(service_modes)
    .bind(languages)
    .bind(diagnoses)
    .bind(age_min)
    .bind(age_max)
    .bind(accepting)
    .bind(bbox.map(|b| b.min_lat))
    .bind(bbox.map(|b| b.max_lat))
    .bind(bbox.map(|b| b.min_lng))
    .bind(bbox.map(|b| b.max_lng))
    .fetch_all(pool)
    .await
}

fn non_empty(values: &[String]) -> Option<Vec<String>> {
    if values.is_empty() {
        None
    } else {
        Some(values.to_vec())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use caregrid_core::{AgeRange, ServiceMode};

    pub(crate) async fn seed_listing(
        pool: &PgPool,
        name: &str,
        slug: &str,
        status: &str,
        state: &str,
        city: &str,
    ) -> (Uuid, Uuid) {
        let listing_id: Uuid = sqlx::query_scalar(
            "INSERT INTO listings (agency_name, slug, status, languages, age_min, age_max) \
             VALUES ($1, $2, $3, ARRAY['english'], 2, 18) RETURNING id",
        )
        .bind(name)
        .bind(slug)
        .bind(status)
        .fetch_one(pool)
        .await
        .expect("insert listing");

        let location_id: Uuid = sqlx::query_scalar(
            "INSERT INTO listing_locations \
                 (listing_id, city, state, latitude, longitude, is_primary, insurances) \
             VALUES ($1, $2, $3, 30.2672, -97.7431, TRUE, ARRAY['aetna']) RETURNING id",
        )
        .bind(listing_id)
        .bind(city)
        .bind(state)
        .fetch_one(pool)
        .await
        .expect("insert location");

        (listing_id, location_id)
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn only_published_listings_are_returned(pool: PgPool) {
        seed_listing(&pool, "Sunrise ABA", "sunrise-aba", "published", "TX", "Austin").await;
        seed_listing(&pool, "Hidden ABA", "hidden-aba", "draft", "TX", "Austin").await;
        seed_listing(&pool, "Gone ABA", "gone-aba", "suspended", "TX", "Austin").await;

        let rows = search_published_listings(&pool, &SearchFilters::default())
            .await
            .expect("search");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].agency_name, "Sunrise ABA");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn state_filter_matches_either_form(pool: PgPool) {
        seed_listing(&pool, "Abbrev ABA", "abbrev-aba", "published", "TX", "Austin").await;
        seed_listing(&pool, "Full Name ABA", "full-aba", "published", "Texas", "Austin").await;
        seed_listing(&pool, "Elsewhere ABA", "elsewhere-aba", "published", "CA", "Fresno").await;

        let filters = SearchFilters {
            state: Some("texas".to_string()),
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &filters).await.expect("search");

        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.state.eq_ignore_ascii_case("tx")
            || r.state.eq_ignore_ascii_case("texas")));
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn multi_location_listing_yields_one_row_per_location(pool: PgPool) {
        let (listing_id, _) =
            seed_listing(&pool, "Sunrise ABA", "sunrise-aba", "published", "TX", "Austin").await;
        sqlx::query(
            "INSERT INTO listing_locations (listing_id, city, state) VALUES ($1, 'Dallas', 'TX')",
        )
        .bind(listing_id)
        .execute(&pool)
        .await
        .expect("second location");

        let rows = search_published_listings(&pool, &SearchFilters::default())
            .await
            .expect("search");

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].listing_id, rows[1].listing_id);
        assert_ne!(rows[0].location_id, rows[1].location_id);
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn insurance_filter_requires_overlap(pool: PgPool) {
        seed_listing(&pool, "Sunrise ABA", "sunrise-aba", "published", "TX", "Austin").await;

        let matching = SearchFilters {
            insurances: vec!["aetna".to_string(), "cigna".to_string()],
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &matching).await.expect("search");
        assert_eq!(rows.len(), 1);

        let disjoint = SearchFilters {
            insurances: vec!["cigna".to_string()],
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &disjoint).await.expect("search");
        assert!(rows.is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn service_mode_filter_matches_location_mode(pool: PgPool) {
        seed_listing(&pool, "Sunrise ABA", "sunrise-aba", "published", "TX", "Austin").await;
        sqlx::query("UPDATE listing_locations SET service_mode = 'telehealth'")
            .execute(&pool)
            .await
            .expect("set mode");

        let filters = SearchFilters {
            service_modes: vec![ServiceMode::Telehealth, ServiceMode::InHome],
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &filters).await.expect("search");
        assert_eq!(rows.len(), 1);

        let filters = SearchFilters {
            service_modes: vec![ServiceMode::InCenter],
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &filters).await.expect("search");
        assert!(rows.is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn age_band_must_overlap_listing_range(pool: PgPool) {
        // Seeded range is 2..=18.
        seed_listing(&pool, "Sunrise ABA", "sunrise-aba", "published", "TX", "Austin").await;

        let overlapping = SearchFilters {
            ages_served: Some(AgeRange {
                min: Some(15),
                max: Some(25),
            }),
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &overlapping).await.expect("search");
        assert_eq!(rows.len(), 1);

        let disjoint = SearchFilters {
            ages_served: Some(AgeRange {
                min: Some(21),
                max: None,
            }),
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &disjoint).await.expect("search");
        assert!(rows.is_empty());
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn availability_filter_excludes_full_agencies(pool: PgPool) {
        seed_listing(&pool, "Open ABA", "open-aba", "published", "TX", "Austin").await;
        seed_listing(&pool, "Full ABA", "full-aba", "published", "TX", "Austin").await;
        sqlx::query("UPDATE listings SET is_accepting_clients = FALSE WHERE slug = 'full-aba'")
            .execute(&pool)
            .await
            .expect("mark full");

        let filters = SearchFilters {
            availability_only: true,
            ..SearchFilters::default()
        };
        let rows = search_published_listings(&pool, &filters).await.expect("search");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].agency_name, "Open ABA");
    }
}
