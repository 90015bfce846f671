//! Indexer management API handlers.

use std::sync::Arc;
use std::time::Instant;

use axum::{
    extract::{Path, State},
    Json,
};
use indexhub_core::{indexer::ApiKeyTransport, IndexerConfig, IndexerType, SearchError};
use serde::Serialize;
use tracing::info;

use super::search::{error_response, ApiError};
use crate::state::AppState;

/// An indexer config as exposed over the API, with the API key redacted.
#[derive(Debug, Serialize)]
pub struct IndexerResponse {
    pub id: String,
    pub name: String,
    pub indexer_type: IndexerType,
    pub base_url: Option<String>,
    pub is_active: bool,
    pub priority: u32,
    pub endpoint_path: String,
    pub category_filter: Option<String>,
    pub api_key_transport: ApiKeyTransport,
    pub api_key_configured: bool,
}

impl From<IndexerConfig> for IndexerResponse {
    fn from(config: IndexerConfig) -> Self {
        let api_key_configured = config.api_key().is_some();
        Self {
            id: config.id,
            name: config.name,
            indexer_type: config.indexer_type,
            base_url: config.base_url,
            is_active: config.is_active,
            priority: config.priority,
            endpoint_path: config.endpoint_path,
            category_filter: config.category_filter,
            api_key_transport: config.api_key_transport,
            api_key_configured,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct IndexersResponse {
    pub indexers: Vec<IndexerResponse>,
    /// Names of the indexers currently searched.
    pub active: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub active: usize,
}

#[derive(Debug, Serialize)]
pub struct TestIndexerResponse {
    pub id: String,
    pub success: bool,
    pub response_time_ms: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// GET /api/v1/indexers
pub async fn list_indexers(
    State(state): State<Arc<AppState>>,
) -> Result<Json<IndexersResponse>, ApiError> {
    let configs = state.manager().configs().map_err(error_response)?;
    Ok(Json(IndexersResponse {
        indexers: configs.into_iter().map(IndexerResponse::from).collect(),
        active: state.manager().indexer_names().await,
    }))
}

/// POST /api/v1/indexers/reload
///
/// Re-read persisted configs and rebuild the active client set.
pub async fn reload(State(state): State<Arc<AppState>>) -> Result<Json<ReloadResponse>, ApiError> {
    let active = state.manager().reload().await.map_err(error_response)?;
    info!(active, "Indexers reloaded");
    Ok(Json(ReloadResponse { active }))
}

/// POST /api/v1/indexers/{id}/test
///
/// Connectivity check. An unknown id is a 404; a failing backend is
/// reported in the body with `success: false`.
pub async fn test_indexer(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<TestIndexerResponse>, ApiError> {
    let start = Instant::now();
    let outcome = state.manager().test_indexer(&id).await;
    let response_time_ms = start.elapsed().as_millis() as u64;

    match outcome {
        Ok(()) => Ok(Json(TestIndexerResponse {
            id,
            success: true,
            response_time_ms,
            error: None,
        })),
        Err(SearchError::Indexer(e)) => Ok(Json(TestIndexerResponse {
            id,
            success: false,
            response_time_ms,
            error: Some(e.to_string()),
        })),
        Err(e) => Err(error_response(e)),
    }
}
