//! Database operations for the `ingested_listings` table.

use std::collections::HashSet;

use sqlx::PgPool;

use caregrid_core::{geo, states, SearchFilters};

/// An active row from `ingested_listings`, trimmed to the fields search uses.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct IngestedPlaceRow {
    pub place_id: String,
    pub name: String,
    pub street: Option<String>,
    pub city: String,
    pub state: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

/// Fetch active ingested places, pushing down state, city, and a coarse
/// bounding box when a geo query is present. Attribute
/// filters (insurance, ages, and so on) never apply here: ingested records
/// carry no such attributes and stay in the pool regardless.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn search_active_places(
    pool: &PgPool,
    filters: &SearchFilters,
) -> Result<Vec<IngestedPlaceRow>, sqlx::Error> {
    let (state_abbrev, state_name) = match filters.state.as_deref() {
        Some(raw) => match states::state_forms(raw) {
            Some(forms) => (Some(forms.abbrev.to_string()), Some(forms.name.to_string())),
            None => (Some(raw.to_string()), Some(raw.to_string())),
        },
        None => (None, None),
    };
    let bbox = match (filters.origin(), filters.radius_miles) {
        (Some(center), Some(radius)) => Some(geo::bounding_box(center, radius)),
        _ => None,
    };

    sqlx::query_as::<_, IngestedPlaceRow>(
        "SELECT place_id, name, street, city, state, latitude, longitude \
         FROM ingested_listings \
         WHERE status = 'active' \
           AND ($1::TEXT IS NULL OR state ILIKE $1 OR state ILIKE $2) \
           AND ($3::TEXT IS NULL OR city ILIKE $3) \
           AND ($4::FLOAT8 IS NULL OR (latitude BETWEEN $4 AND $5 \
                                       AND longitude BETWEEN $6 AND $7)) \
         ORDER BY name ASC, place_id ASC",
    )
    .bind(state_abbrev)
    .bind(state_name)
    .bind(filters.city.as_deref())
    .bind(bbox.map(|b| b.min_lat))
    .bind(bbox.map(|b| b.max_lat))
    .bind(bbox.map(|b| b.min_lng))
    .bind(bbox.map(|b| b.max_lng))
    .fetch_all(pool)
    .await
}

/// Place ids with an approved removal request. The reconciler drops these
/// even if an ingested row somehow survives with `active` status.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn approved_removal_ids(pool: &PgPool) -> Result<HashSet<String>, sqlx::Error> {
    let ids: Vec<String> = sqlx::query_scalar(
        "SELECT ingested_listing_id FROM removal_requests WHERE status = 'approved'",
    )
    .fetch_all(pool)
    .await?;
    Ok(ids.into_iter().collect())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) async fn seed_place(pool: &PgPool, place_id: &str, name: &str, state: &str) {
        sqlx::query(
            "INSERT INTO ingested_listings (place_id, name, city, state, latitude, longitude) \
             VALUES ($1, $2, 'Austin', $3, 30.2672, -97.7431)",
        )
        .bind(place_id)
        .bind(name)
        .bind(state)
        .execute(pool)
        .await
        .expect("insert place");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn removed_places_are_excluded(pool: PgPool) {
        seed_place(&pool, "p1", "Sunrise ABA", "TX").await;
        seed_place(&pool, "p2", "Gone ABA", "TX").await;
        sqlx::query("UPDATE ingested_listings SET status = 'removed' WHERE place_id = 'p2'")
            .execute(&pool)
            .await
            .expect("remove p2");

        let rows = search_active_places(&pool, &SearchFilters::default())
            .await
            .expect("search");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].place_id, "p1");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn state_filter_accepts_full_name_input(pool: PgPool) {
        seed_place(&pool, "p1", "Sunrise ABA", "TX").await;
        seed_place(&pool, "p2", "Coastal ABA", "CA").await;

        let filters = SearchFilters {
            state: Some("Texas".to_string()),
            ..SearchFilters::default()
        };
        let rows = search_active_places(&pool, &filters).await.expect("search");

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].place_id, "p1");
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn approved_removals_collects_only_approved(pool: PgPool) {
        seed_place(&pool, "p1", "Sunrise ABA", "TX").await;
        seed_place(&pool, "p2", "Coastal ABA", "CA").await;
        let (listing_id, _) = crate::listings::tests::seed_listing(
            &pool,
            "Sunrise ABA",
            "sunrise-aba",
            "published",
            "TX",
            "Austin",
        )
        .await;
        sqlx::query(
            "INSERT INTO removal_requests (ingested_listing_id, requesting_listing_id, status) \
             VALUES ('p1', $1, 'approved'), \
                    ('p2', $1, 'pending')",
        )
        .bind(listing_id)
        .execute(&pool)
        .await
        .expect("insert requests");

        let ids = approved_removal_ids(&pool).await.expect("ids");

        assert_eq!(ids, HashSet::from(["p1".to_string()]));
    }
}
