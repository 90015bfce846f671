//! Types for the search orchestrator.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::indexer::{IndexerError, TorrentResult};
use crate::store::StoreError;

/// One backend that failed during the last fan-out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexerFailure {
    /// Backend display name.
    pub indexer: String,
    pub message: String,
}

/// Merged outcome of one fan-out search.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AggregatedResults {
    /// Deduplicated, ranked and (for episodes) filtered results.
    pub results: Vec<TorrentResult>,
    /// Backends that failed while others still answered.
    pub errors: Vec<IndexerFailure>,
    pub duration_ms: u64,
}

/// Errors surfaced by the orchestrator.
#[derive(Debug, Error)]
pub enum SearchError {
    /// Nothing was found and at least one backend failed.
    #[error("All indexers failed; {indexer}: {message}")]
    AllIndexersFailed { indexer: String, message: String },

    #[error("Search cancelled")]
    Cancelled,

    #[error("Indexer not found: {0}")]
    IndexerNotFound(String),

    /// Single-backend failure, from a connectivity check.
    #[error(transparent)]
    Indexer(#[from] IndexerError),

    #[error("Config store error: {0}")]
    Store(#[from] StoreError),
}
