use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use caregrid_core::{AgeRange, SearchFilters, SearchOptions, ServiceMode, SortBy};
use caregrid_search::{CombinedSearchResult, SearchError};

use crate::middleware::RequestId;

use super::{ApiError, ApiResponse, AppState, ResponseMeta};

/// Raw query-string shape of `GET /api/v1/search`. List-valued parameters are
/// comma-separated; age bounds use the camelCase names web clients send.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct SearchParams {
    q: Option<String>,
    state: Option<String>,
    city: Option<String>,
    services: Option<String>,
    insurance: Option<String>,
    languages: Option<String>,
    diagnoses: Option<String>,
    #[serde(rename = "minAge")]
    min_age: Option<u8>,
    #[serde(rename = "maxAge")]
    max_age: Option<u8>,
    accepting: Option<bool>,
    lat: Option<f64>,
    lng: Option<f64>,
    radius: Option<f64>,
    page: Option<u32>,
    limit: Option<u32>,
    sort: Option<String>,
}

fn csv(value: Option<&str>) -> Vec<String> {
    value
        .map(|v| {
            v.split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_lowercase)
                .collect()
        })
        .unwrap_or_default()
}

fn parse_params(params: &SearchParams) -> Result<(SearchFilters, SearchOptions), String> {
    let service_modes = csv(params.services.as_deref())
        .iter()
        .map(|s| s.parse::<ServiceMode>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;

    let ages_served = if params.min_age.is_some() || params.max_age.is_some() {
        Some(AgeRange {
            min: params.min_age,
            max: params.max_age,
        })
    } else {
        None
    };

    let filters = SearchFilters {
        query: params.q.clone().filter(|q| !q.trim().is_empty()),
        state: params.state.clone(),
        city: params.city.clone(),
        insurances: csv(params.insurance.as_deref()),
        service_modes,
        languages: csv(params.languages.as_deref()),
        diagnoses: csv(params.diagnoses.as_deref()),
        ages_served,
        availability_only: params.accepting.unwrap_or(false),
        user_lat: params.lat,
        user_lng: params.lng,
        radius_miles: params.radius,
    };

    let sort_by = match params.sort.as_deref() {
        None => SortBy::default(),
        Some(raw) => raw
            .parse()
            .map_err(|()| format!("unknown sort value: {raw}"))?,
    };
    let defaults = SearchOptions::default();
    let options = SearchOptions {
        sort_by,
        page: params.page.unwrap_or(defaults.page),
        page_size: params.limit.unwrap_or(defaults.page_size),
    };

    Ok((filters, options))
}

fn map_search_error(request_id: String, error: &SearchError) -> ApiError {
    match error {
        SearchError::Validation(e) => ApiError::new(request_id, "validation_error", e.to_string()),
        SearchError::SourceUnavailable(_) => {
            tracing::error!(error = %error, "search failed: authoritative source down");
            ApiError::new(request_id, "source_unavailable", "listing data is unavailable")
        }
        SearchError::Cancelled => ApiError::new(request_id, "timeout", "search deadline exceeded"),
    }
}

pub(super) async fn search(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(params): Query<SearchParams>,
) -> Result<Json<ApiResponse<CombinedSearchResult>>, ApiError> {
    let (filters, options) = parse_params(&params)
        .map_err(|msg| ApiError::new(req_id.0.clone(), "validation_error", msg))?;

    let result = state
        .engine
        .search(&filters, &options)
        .await
        .map_err(|e| map_search_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: result,
        meta: ResponseMeta::new(req_id.0),
    }))
}
