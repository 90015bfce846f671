//! Search orchestration across every active backend.
//!
//! The `IndexerManager` owns the instantiated clients, fans each search out
//! to all of them concurrently and merges what comes back. Its mutable state
//! (client list, last error manifest) sits behind `RwLock`s; a single search
//! only takes a snapshot of the client list, so fan-out stays parallel.

mod types;

pub use types::*;

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures::future::join_all;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::indexer::merge::merge;
use crate::indexer::{
    build_client, canonicalizing_known_defaults, default_configs, prioritize_known_defaults,
    ClientSettings, IndexerClient, IndexerConfig, IndexerError, MediaType, SearchRequest,
    TorrentResult,
};
use crate::metrics;
use crate::release::{extract_from_query, EpisodeContext};
use crate::store::IndexerConfigStore;

/// What a fan-out branch asks its backend for.
#[derive(Debug, Clone, Copy)]
enum Query<'a> {
    Id(&'a SearchRequest),
    Text(&'a str, MediaType),
}

/// One branch's outcome, tagged with the backend that produced it.
struct BranchOutcome {
    indexer: String,
    result: Result<Vec<TorrentResult>, IndexerError>,
    elapsed: Duration,
}

/// Fans searches out to every active backend and merges the answers.
pub struct IndexerManager {
    store: Arc<dyn IndexerConfigStore>,
    settings: ClientSettings,
    clients: RwLock<Vec<Arc<dyn IndexerClient>>>,
    last_errors: RwLock<Vec<IndexerFailure>>,
}

impl IndexerManager {
    /// Create a manager with no active clients. Call [`initialize`](Self::initialize)
    /// before searching.
    pub fn new(store: Arc<dyn IndexerConfigStore>, settings: ClientSettings) -> Self {
        Self::with_clients(store, settings, Vec::new())
    }

    /// Create a manager around pre-built clients.
    pub fn with_clients(
        store: Arc<dyn IndexerConfigStore>,
        settings: ClientSettings,
        clients: Vec<Arc<dyn IndexerClient>>,
    ) -> Self {
        Self {
            store,
            settings,
            clients: RwLock::new(clients),
            last_errors: RwLock::new(Vec::new()),
        }
    }

    /// Load, migrate and persist the config set, then build a client per
    /// active config. Returns the number of active clients.
    ///
    /// An empty store is seeded with the built-in registry. Configs that
    /// cannot be turned into a client are skipped.
    pub async fn initialize(&self) -> Result<usize, SearchError> {
        let stored = self.store.fetch_all()?;

        let configs = if stored.is_empty() {
            info!("No persisted indexers, seeding built-in defaults");
            default_configs()
        } else {
            prioritize_known_defaults(canonicalizing_known_defaults(stored.clone()))
        };

        if configs != stored {
            debug!(count = configs.len(), "Persisting migrated indexer configs");
            self.store.save_all(&configs)?;
        }

        let clients = self.build_clients(&configs);
        let active = clients.len();
        *self.clients.write().await = clients;

        info!(active, total = configs.len(), "Indexers initialized");
        Ok(active)
    }

    /// Re-run [`initialize`](Self::initialize) after external config changes.
    pub async fn reload(&self) -> Result<usize, SearchError> {
        self.initialize().await
    }

    fn build_clients(&self, configs: &[IndexerConfig]) -> Vec<Arc<dyn IndexerClient>> {
        configs
            .iter()
            .filter(|config| config.is_active)
            .filter_map(|config| match build_client(config, &self.settings) {
                Ok(client) => Some(client),
                Err(e) => {
                    debug!(indexer = %config.name, error = %e, "Skipping unconstructable indexer");
                    None
                }
            })
            .collect()
    }

    /// Search every backend by title id.
    pub async fn search(&self, request: &SearchRequest) -> Result<AggregatedResults, SearchError> {
        self.search_cancellable(request, &CancellationToken::new())
            .await
    }

    /// Like [`search`](Self::search), aborting every branch once `cancel` fires.
    pub async fn search_cancellable(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResults, SearchError> {
        self.execute(Query::Id(request), request.episode_context(), cancel)
            .await
    }

    /// Search every backend by free text. An `S01E02` or `1x02` token in the
    /// text narrows the merged results to that episode.
    pub async fn search_by_query(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<AggregatedResults, SearchError> {
        self.search_by_query_cancellable(query, media_type, &CancellationToken::new())
            .await
    }

    pub async fn search_by_query_cancellable(
        &self,
        query: &str,
        media_type: MediaType,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResults, SearchError> {
        self.execute(
            Query::Text(query, media_type),
            extract_from_query(query),
            cancel,
        )
        .await
    }

    async fn execute(
        &self,
        query: Query<'_>,
        target: Option<EpisodeContext>,
        cancel: &CancellationToken,
    ) -> Result<AggregatedResults, SearchError> {
        let start = Instant::now();
        let clients = self.clients.read().await.clone();

        debug!(indexers = clients.len(), ?query, "Starting parallel search");

        let branches = clients
            .iter()
            .map(|client| run_branch(client.as_ref(), query, cancel));
        let outcomes = join_all(branches).await;

        if cancel.is_cancelled() {
            debug!("Search cancelled");
            metrics::SEARCHES.with_label_values(&["cancelled"]).inc();
            return Err(SearchError::Cancelled);
        }

        let mut pool: Vec<TorrentResult> = Vec::new();
        let mut errors: Vec<IndexerFailure> = Vec::new();

        for outcome in outcomes {
            let seconds = outcome.elapsed.as_secs_f64();
            match outcome.result {
                Ok(mut hits) => {
                    debug!(indexer = %outcome.indexer, results = hits.len(), "Indexer search complete");
                    metrics::record_indexer_request(&outcome.indexer, "success", seconds);
                    pool.append(&mut hits);
                }
                Err(e) if e.is_cancelled() => {
                    debug!(indexer = %outcome.indexer, "Indexer search cancelled");
                    metrics::record_indexer_request(&outcome.indexer, "cancelled", seconds);
                }
                Err(e) => {
                    warn!(indexer = %outcome.indexer, error = %e, "Indexer search failed");
                    metrics::record_indexer_request(&outcome.indexer, "error", seconds);
                    errors.push(IndexerFailure {
                        indexer: outcome.indexer,
                        message: e.to_string(),
                    });
                }
            }
        }

        let results = merge(pool, target);
        *self.last_errors.write().await = errors.clone();
        metrics::SEARCH_RESULTS.observe(results.len() as f64);

        if results.is_empty() {
            if let Some(first) = errors.first() {
                metrics::SEARCHES.with_label_values(&["failed"]).inc();
                return Err(SearchError::AllIndexersFailed {
                    indexer: first.indexer.clone(),
                    message: first.message.clone(),
                });
            }
        }

        let outcome = if errors.is_empty() { "ok" } else { "partial" };
        metrics::SEARCHES.with_label_values(&[outcome]).inc();

        let duration_ms = start.elapsed().as_millis() as u64;
        debug!(
            results = results.len(),
            errors = errors.len(),
            duration_ms,
            "Search complete"
        );

        Ok(AggregatedResults {
            results,
            errors,
            duration_ms,
        })
    }

    /// Probe the persisted indexer `id`, active or not.
    pub async fn test_indexer(&self, id: &str) -> Result<(), SearchError> {
        let config = self
            .store
            .fetch_all()?
            .into_iter()
            .find(|config| config.id == id)
            .ok_or_else(|| SearchError::IndexerNotFound(id.to_string()))?;

        let client = build_client(&config, &self.settings)?;
        client.health_check().await?;
        Ok(())
    }

    /// Names of the active clients, in priority order.
    pub async fn indexer_names(&self) -> Vec<String> {
        self.clients
            .read()
            .await
            .iter()
            .map(|client| client.name().to_string())
            .collect()
    }

    /// Persisted configs, in priority order.
    pub fn configs(&self) -> Result<Vec<IndexerConfig>, SearchError> {
        Ok(self.store.fetch_all()?)
    }

    /// Failures recorded by the most recent completed search.
    pub async fn last_search_errors(&self) -> Vec<IndexerFailure> {
        self.last_errors.read().await.clone()
    }
}

async fn run_branch(
    client: &dyn IndexerClient,
    query: Query<'_>,
    cancel: &CancellationToken,
) -> BranchOutcome {
    let start = Instant::now();
    let call = async {
        match query {
            Query::Id(request) => client.search(request).await,
            Query::Text(text, media_type) => client.search_by_query(text, media_type).await,
        }
    };

    let result = tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(IndexerError::Cancelled),
        result = call => result,
    };

    BranchOutcome {
        indexer: client.name().to_string(),
        result,
        elapsed: start.elapsed(),
    }
}
