//! Mock indexer for testing.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;

use crate::indexer::{IndexerClient, IndexerError, MediaType, SearchRequest, TorrentResult};

/// What a recorded search asked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedQuery {
    Id(SearchRequest),
    Text { query: String, media_type: MediaType },
}

/// A recorded search for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedSearch {
    pub query: RecordedQuery,
    /// When the search was made.
    pub timestamp: Instant,
}

/// Mock implementation of the `IndexerClient` trait.
///
/// Provides controllable behavior for testing:
/// - Return configurable results, echoed with this mock's name as provenance
/// - Track searches for assertions
/// - Simulate failures (one-shot or persistent) and slow responses
///
/// # Example
///
/// ```rust,ignore
/// use indexhub_core::testing::{fixtures, MockIndexer};
///
/// let indexer = MockIndexer::new("tracker-a");
/// indexer.set_results(vec![fixtures::result(1, "Movie.2020.1080p", 25)]).await;
///
/// let hits = indexer.search(&SearchRequest::movie("tt0111161")).await?;
/// assert_eq!(hits[0].indexer_name, "tracker-a");
/// assert_eq!(indexer.search_count().await, 1);
/// ```
#[derive(Debug)]
pub struct MockIndexer {
    name: String,
    /// Configured results to return.
    results: Arc<RwLock<Vec<TorrentResult>>>,
    /// Recorded searches.
    searches: Arc<RwLock<Vec<RecordedSearch>>>,
    /// If set, the next search fails with this error.
    next_error: Arc<RwLock<Option<IndexerError>>>,
    /// If set, every search fails with this error.
    error: Arc<RwLock<Option<IndexerError>>>,
    /// If set, health checks fail with this error.
    health_check_error: Arc<RwLock<Option<IndexerError>>>,
    /// Simulated latency before answering.
    delay: Arc<RwLock<Option<Duration>>>,
}

impl MockIndexer {
    /// Create a mock indexer with empty results.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            results: Arc::new(RwLock::new(Vec::new())),
            searches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
            error: Arc::new(RwLock::new(None)),
            health_check_error: Arc::new(RwLock::new(None)),
            delay: Arc::new(RwLock::new(None)),
        }
    }

    /// Set the results to return for subsequent searches.
    pub async fn set_results(&self, results: Vec<TorrentResult>) {
        *self.results.write().await = results;
    }

    /// Add a single result.
    pub async fn add_result(&self, result: TorrentResult) {
        self.results.write().await.push(result);
    }

    /// Get recorded searches.
    pub async fn recorded_searches(&self) -> Vec<RecordedSearch> {
        self.searches.read().await.clone()
    }

    /// Get the number of searches performed.
    pub async fn search_count(&self) -> usize {
        self.searches.read().await.len()
    }

    /// Configure the next search to fail with the given error.
    pub async fn set_next_error(&self, error: IndexerError) {
        *self.next_error.write().await = Some(error);
    }

    /// Fail every search with the given error until cleared.
    pub async fn set_error(&self, error: IndexerError) {
        *self.error.write().await = Some(error);
    }

    /// Clear any pending or persistent error.
    pub async fn clear_errors(&self) {
        *self.next_error.write().await = None;
        *self.error.write().await = None;
    }

    pub async fn set_health_check_error(&self, error: IndexerError) {
        *self.health_check_error.write().await = Some(error);
    }

    /// Delay every answer by `delay`.
    pub async fn set_delay(&self, delay: Duration) {
        *self.delay.write().await = Some(delay);
    }

    async fn answer(&self, query: RecordedQuery) -> Result<Vec<TorrentResult>, IndexerError> {
        self.searches.write().await.push(RecordedSearch {
            query,
            timestamp: Instant::now(),
        });

        let delay = *self.delay.read().await;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }
        if let Some(err) = self.error.read().await.clone() {
            return Err(err);
        }

        Ok(self
            .results
            .read()
            .await
            .iter()
            .cloned()
            .map(|mut result| {
                result.indexer_name = self.name.clone();
                result
            })
            .collect())
    }
}

#[async_trait]
impl IndexerClient for MockIndexer {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        self.answer(RecordedQuery::Id(request.clone())).await
    }

    async fn search_by_query(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        self.answer(RecordedQuery::Text {
            query: query.to_string(),
            media_type,
        })
        .await
    }

    async fn health_check(&self) -> Result<(), IndexerError> {
        match self.health_check_error.read().await.clone() {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    #[tokio::test]
    async fn test_results_carry_mock_name() {
        let indexer = MockIndexer::new("tracker-a");
        indexer
            .set_results(vec![fixtures::result(1, "Movie.2020.1080p", 25)])
            .await;

        let hits = indexer.search(&SearchRequest::movie("tt1")).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].indexer_name, "tracker-a");
    }

    #[tokio::test]
    async fn test_recorded_searches() {
        let indexer = MockIndexer::new("m");
        indexer.search(&SearchRequest::movie("tt1")).await.unwrap();
        indexer
            .search_by_query("some show", MediaType::Series)
            .await
            .unwrap();

        let searches = indexer.recorded_searches().await;
        assert_eq!(searches.len(), 2);
        assert_eq!(searches[0].query, RecordedQuery::Id(SearchRequest::movie("tt1")));
        assert_eq!(
            searches[1].query,
            RecordedQuery::Text {
                query: "some show".into(),
                media_type: MediaType::Series,
            }
        );
    }

    #[tokio::test]
    async fn test_next_error_is_consumed() {
        let indexer = MockIndexer::new("m");
        indexer.set_next_error(IndexerError::Timeout).await;

        assert!(indexer.search(&SearchRequest::movie("tt1")).await.is_err());
        assert!(indexer.search(&SearchRequest::movie("tt1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_persistent_error_until_cleared() {
        let indexer = MockIndexer::new("m");
        indexer.set_error(IndexerError::Parse("bad".into())).await;

        assert!(indexer.search(&SearchRequest::movie("tt1")).await.is_err());
        assert!(indexer.search(&SearchRequest::movie("tt1")).await.is_err());

        indexer.clear_errors().await;
        assert!(indexer.search(&SearchRequest::movie("tt1")).await.is_ok());
    }

    #[tokio::test]
    async fn test_health_check_error() {
        let indexer = MockIndexer::new("m");
        assert!(indexer.health_check().await.is_ok());

        indexer
            .set_health_check_error(IndexerError::HttpStatus {
                status: 401,
                body: "unauthorized".into(),
            })
            .await;
        assert!(indexer.health_check().await.is_err());
    }
}
