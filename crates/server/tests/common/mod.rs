//! Common test utilities for API testing with mocks.
//!
//! This module provides a test fixture that creates an in-process router
//! with mock indexers injected, enabling API tests without real backends
//! or a database.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tower::ServiceExt;

use indexhub_core::{
    testing::{MemoryConfigStore, MockIndexer},
    ClientSettings, Config, IndexerClient, IndexerConfig, IndexerConfigStore, IndexerManager,
};
use indexhub_server::{api::create_router, state::AppState};

/// Re-export fixtures for test convenience
pub use indexhub_core::testing::fixtures;

/// Test fixture wrapping a router over mock indexers.
///
/// # Example
///
/// ```rust,ignore
/// #[tokio::test]
/// async fn test_search() {
///     let fixture = TestFixture::new(&["tracker-a"]).await;
///     fixture.indexers[0].set_results(vec![fixtures::result(1, "Movie", 10)]).await;
///
///     let response = fixture.post("/api/v1/search", json!({
///         "title_id": "tt0111161",
///         "media_type": "movie"
///     })).await;
///
///     assert_eq!(response.status, 200);
/// }
/// ```
pub struct TestFixture {
    /// The Axum router for testing
    pub router: Router,
    /// Mock indexers, in the order they were registered
    pub indexers: Vec<Arc<MockIndexer>>,
    /// Persisted configs backing `/indexers`
    pub store: Arc<MemoryConfigStore>,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with one mock indexer per name and an empty config store.
    pub async fn new(names: &[&str]) -> Self {
        Self::with_configs(names, Vec::new()).await
    }

    /// Fixture whose config store holds `configs`.
    pub async fn with_configs(names: &[&str], configs: Vec<IndexerConfig>) -> Self {
        let indexers: Vec<Arc<MockIndexer>> = names
            .iter()
            .map(|name| Arc::new(MockIndexer::new(*name)))
            .collect();
        let clients: Vec<Arc<dyn IndexerClient>> = indexers
            .iter()
            .map(|indexer| Arc::clone(indexer) as Arc<dyn IndexerClient>)
            .collect();

        let store = Arc::new(MemoryConfigStore::with_configs(configs));
        let config_store: Arc<dyn IndexerConfigStore> = store.clone();
        let manager = Arc::new(IndexerManager::with_clients(
            config_store,
            ClientSettings::default(),
            clients,
        ));

        let state = Arc::new(AppState::new(Config::default(), manager));

        Self {
            router: create_router(state),
            indexers,
            store,
        }
    }

    /// Make a GET request
    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make a POST request with JSON body
    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(
            Request::post(uri)
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }

    /// Make a POST request with no body
    pub async fn post_empty(&self, uri: &str) -> TestResponse {
        self.request(Request::post(uri).body(Body::empty()).unwrap())
            .await
    }

    /// Make a GET request and return the raw body text
    pub async fn get_text(&self, uri: &str) -> (StatusCode, String) {
        let response = self
            .router
            .clone()
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8_lossy(&bytes).into_owned())
    }

    async fn request(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(Value::Null)
        };
        TestResponse { status, body }
    }
}
