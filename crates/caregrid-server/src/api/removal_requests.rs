use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use caregrid_core::RemovalState;
use caregrid_db::{NewRemovalRequest, RemovalRequestRow, WorkflowError};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct SubmitBody {
    ingested_listing_id: String,
    requesting_listing_id: Uuid,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct ListParams {
    status: Option<String>,
    limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct RemovalRequestItem {
    pub id: Uuid,
    pub ingested_listing_id: String,
    pub requesting_listing_id: Uuid,
    pub reason: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub decided_at: Option<DateTime<Utc>>,
}

impl From<RemovalRequestRow> for RemovalRequestItem {
    fn from(row: RemovalRequestRow) -> Self {
        Self {
            id: row.id,
            ingested_listing_id: row.ingested_listing_id,
            requesting_listing_id: row.requesting_listing_id,
            reason: row.reason,
            status: row.status,
            created_at: row.created_at,
            decided_at: row.decided_at,
        }
    }
}

fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

fn map_workflow_error(request_id: String, error: &WorkflowError) -> ApiError {
    match error {
        WorkflowError::NotFound => {
            ApiError::new(request_id, "not_found", "removal request target not found")
        }
        WorkflowError::Conflict => ApiError::new(
            request_id,
            "conflict",
            "a pending removal request already exists for this place",
        ),
        WorkflowError::InvalidState { current } => ApiError::new(
            request_id,
            "conflict",
            format!("removal request already decided: {current}"),
        ),
        WorkflowError::Sqlx(e) => {
            tracing::error!(error = %e, "removal request query failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) async fn submit(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<SubmitBody>,
) -> Result<(StatusCode, Json<ApiResponse<RemovalRequestItem>>), ApiError> {
    if body.ingested_listing_id.trim().is_empty() {
        return Err(ApiError::new(
            req_id.0,
            "validation_error",
            "ingested_listing_id must not be empty",
        ));
    }

    let request = NewRemovalRequest {
        ingested_listing_id: body.ingested_listing_id,
        requesting_listing_id: body.requesting_listing_id,
        reason: body.reason,
    };
    let row = caregrid_db::submit_removal_request(&state.pool, &request)
        .await
        .map_err(|e| map_workflow_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: row.into(),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

pub(super) async fn list(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<ListParams>,
) -> Result<Json<ApiResponse<Vec<RemovalRequestItem>>>, ApiError> {
    let filter = match params.status.as_deref() {
        None => None,
        Some(raw) => Some(raw.parse::<RemovalState>().map_err(|e| {
            ApiError::new(req_id.0.clone(), "validation_error", e.to_string())
        })?),
    };

    let rows = caregrid_db::list_removal_requests(&state.pool, filter, normalize_limit(params.limit))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "removal request query failed");
            ApiError::new(req_id.0.clone(), "internal_error", "database query failed")
        })?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(Into::into).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn approve(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RemovalRequestItem>>, ApiError> {
    let row = caregrid_db::approve_removal_request(&state.pool, id)
        .await
        .map_err(|e| map_workflow_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

pub(super) async fn reject(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<RemovalRequestItem>>, ApiError> {
    let row = caregrid_db::reject_removal_request(&state.pool, id)
        .await
        .map_err(|e| map_workflow_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: row.into(),
        meta: ResponseMeta::new(req_id.0),
    }))
}
