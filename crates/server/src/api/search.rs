//! Search API handlers.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, Json};
use indexhub_core::{AggregatedResults, IndexerFailure, MediaType, SearchError, SearchRequest};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::state::AppState;

// ============================================================================
// Request/Response types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct QuerySearchRequest {
    pub query: String,
    pub media_type: MediaType,
}

#[derive(Debug, Serialize)]
pub struct SearchErrorsResponse {
    pub errors: Vec<IndexerFailure>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

/// Map an orchestrator error onto a status code and body.
pub fn error_response(err: SearchError) -> ApiError {
    let status = match &err {
        SearchError::AllIndexersFailed { .. } | SearchError::Indexer(_) => StatusCode::BAD_GATEWAY,
        SearchError::IndexerNotFound(_) => StatusCode::NOT_FOUND,
        SearchError::Cancelled => StatusCode::SERVICE_UNAVAILABLE,
        SearchError::Store(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/v1/search
///
/// Search every active indexer by title id.
pub async fn search(
    State(state): State<Arc<AppState>>,
    Json(request): Json<SearchRequest>,
) -> Result<Json<AggregatedResults>, ApiError> {
    if request.title_id.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "title_id cannot be empty".to_string(),
            }),
        ));
    }

    state
        .manager()
        .search(&request)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(title_id = %request.title_id, error = %e, "Search failed");
            error_response(e)
        })
}

/// POST /api/v1/search/query
///
/// Free-text search across every active indexer.
pub async fn search_by_query(
    State(state): State<Arc<AppState>>,
    Json(body): Json<QuerySearchRequest>,
) -> Result<Json<AggregatedResults>, ApiError> {
    if body.query.trim().is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "query cannot be empty".to_string(),
            }),
        ));
    }

    state
        .manager()
        .search_by_query(&body.query, body.media_type)
        .await
        .map(Json)
        .map_err(|e| {
            warn!(query = %body.query, error = %e, "Search failed");
            error_response(e)
        })
}

/// GET /api/v1/search/errors
///
/// Backends that failed during the most recent search.
pub async fn last_errors(State(state): State<Arc<AppState>>) -> Json<SearchErrorsResponse> {
    Json(SearchErrorsResponse {
        errors: state.manager().last_search_errors().await,
    })
}
