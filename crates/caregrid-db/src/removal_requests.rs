//! Removal-request workflow for ingested places.
//!
//! State machine: `pending` -> `approved` or `rejected`, enforced in SQL with
//! compare-and-set updates so concurrent moderators cannot double-decide a
//! request. Approval also flips the ingested row to `removed`, in the same
//! transaction.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

use caregrid_core::RemovalState;

#[derive(Debug, Error)]
pub enum WorkflowError {
    /// The ingested place, the requesting listing, or the request itself
    /// does not exist (or the place is already removed).
    #[error("removal request target not found")]
    NotFound,
    /// A pending request already covers this place.
    #[error("a pending removal request already exists for this place")]
    Conflict,
    /// The request has already left `pending`; terminal states are immutable.
    #[error("removal request already decided: {current}")]
    InvalidState { current: String },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

#[derive(Debug, Clone)]
pub struct NewRemovalRequest {
    pub ingested_listing_id: String,
    pub requesting_listing_id: Uuid,
    pub reason: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct RemovalRequestRow {
    pub id: Uuid,
    pub ingested_listing_id: String,
    pub requesting_listing_id: Uuid,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl RemovalRequestRow {
    #[must_use]
    pub fn state(&self) -> Option<RemovalState> {
        self.status.parse().ok()
    }
}

const RETURNING_COLS: &str =
    "id, ingested_listing_id, requesting_listing_id, reason, status, created_at, decided_at";

/// File a new removal request against an ingested place.
///
/// # Errors
///
/// [`WorkflowError::NotFound`] if the place is missing or already removed, or
/// if the requesting listing does not exist; [`WorkflowError::Conflict`] if an
/// open request already covers the place; [`WorkflowError::Sqlx`] otherwise.
pub async fn submit_removal_request(
    pool: &PgPool,
    request: &NewRemovalRequest,
) -> Result<RemovalRequestRow, WorkflowError> {
    let place_status: Option<String> =
        sqlx::query_scalar("SELECT status FROM ingested_listings WHERE place_id = $1")
            .bind(&request.ingested_listing_id)
            .fetch_optional(pool)
            .await?;
    match place_status.as_deref() {
        Some("active") => {}
        // An already-removed place has nothing left to suppress.
        Some(_) | None => return Err(WorkflowError::NotFound),
    }

    let sql = format!(
        "INSERT INTO removal_requests (ingested_listing_id, requesting_listing_id, reason) \
         VALUES ($1, $2, $3) RETURNING {RETURNING_COLS}"
    );
    sqlx::query_as::<_, RemovalRequestRow>(&sql)
        .bind(&request.ingested_listing_id)
        .bind(request.requesting_listing_id)
        .bind(&request.reason)
        .fetch_one(pool)
        .await
        .map_err(map_insert_error)
}

fn map_insert_error(err: sqlx::Error) -> WorkflowError {
    if let sqlx::Error::Database(db_err) = &err {
        match db_err.kind() {
            // The partial unique index guards one pending request per place.
            sqlx::error::ErrorKind::UniqueViolation => return WorkflowError::Conflict,
            sqlx::error::ErrorKind::ForeignKeyViolation => return WorkflowError::NotFound,
            _ => {}
        }
    }
    WorkflowError::Sqlx(err)
}

/// Approve a pending request and mark the referenced ingested row removed.
///
/// # Errors
///
/// [`WorkflowError::NotFound`] if no such request exists,
/// [`WorkflowError::InvalidState`] if it has already left `pending`,
/// [`WorkflowError::Sqlx`] for any other database failure.
pub async fn approve_removal_request(
    pool: &PgPool,
    id: Uuid,
) -> Result<RemovalRequestRow, WorkflowError> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "UPDATE removal_requests \
         SET status = 'approved', decided_at = NOW() \
         WHERE id = $1 AND status = 'pending' \
         RETURNING {RETURNING_COLS}"
    );
    let updated = sqlx::query_as::<_, RemovalRequestRow>(&sql)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(row) = updated else {
        // The CAS missed: either the request is gone or it was already
        // decided. Distinguish the two for the caller.
        let current: Option<String> =
            sqlx::query_scalar("SELECT status FROM removal_requests WHERE id = $1")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        tx.rollback().await?;
        return Err(match current {
            Some(status) => WorkflowError::InvalidState { current: status },
            None => WorkflowError::NotFound,
        });
    };

    sqlx::query(
        "UPDATE ingested_listings SET status = 'removed', updated_at = NOW() WHERE place_id = $1",
    )
    .bind(&row.ingested_listing_id)
    .execute(&mut *tx)
    .await?;

    tx.commit().await?;
    tracing::info!(request_id = %row.id, place_id = %row.ingested_listing_id, "removal request approved");
    Ok(row)
}

/// Reject a pending request. The ingested row is untouched and keeps
/// appearing in search.
///
/// # Errors
///
/// Same failure modes as [`approve_removal_request`].
pub async fn reject_removal_request(
    pool: &PgPool,
    id: Uuid,
) -> Result<RemovalRequestRow, WorkflowError> {
    let sql = format!(
        "UPDATE removal_requests \
         SET status = 'rejected', decided_at = NOW() \
         WHERE id = $1 AND status = 'pending' \
         RETURNING {RETURNING_COLS}"
    );
    let updated = sqlx::query_as::<_, RemovalRequestRow>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await?;

    match updated {
        Some(row) => {
            tracing::info!(request_id = %row.id, "removal request rejected");
            Ok(row)
        }
        None => {
            let current: Option<String> =
                sqlx::query_scalar("SELECT status FROM removal_requests WHERE id = $1")
                    .bind(id)
                    .fetch_optional(pool)
                    .await?;
            Err(match current {
                Some(status) => WorkflowError::InvalidState { current: status },
                None => WorkflowError::NotFound,
            })
        }
    }
}

/// List removal requests for the review queue, optionally narrowed to one
/// state, newest first.
///
/// # Errors
///
/// Returns [`sqlx::Error`] if the query fails.
pub async fn list_removal_requests(
    pool: &PgPool,
    state: Option<RemovalState>,
    limit: i64,
) -> Result<Vec<RemovalRequestRow>, sqlx::Error> {
    let sql = format!(
        "SELECT {RETURNING_COLS} FROM removal_requests \
         WHERE ($1::TEXT IS NULL OR status = $1) \
         ORDER BY created_at DESC, id DESC \
         LIMIT $2"
    );
    sqlx::query_as::<_, RemovalRequestRow>(&sql)
        .bind(state.map(RemovalState::as_str))
        .bind(limit)
        .fetch_all(pool)
        .await
}
