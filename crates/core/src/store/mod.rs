//! Persistence of indexer definitions.

mod sqlite;

pub use sqlite::SqliteIndexerStore;

use thiserror::Error;

use crate::indexer::IndexerConfig;

/// Errors for config storage.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Source of truth for persisted `IndexerConfig` records.
pub trait IndexerConfigStore: Send + Sync {
    /// All configs, ordered by priority.
    fn fetch_all(&self) -> Result<Vec<IndexerConfig>, StoreError>;

    /// Replace the stored set with `configs`.
    fn save_all(&self, configs: &[IndexerConfig]) -> Result<(), StoreError>;
}
