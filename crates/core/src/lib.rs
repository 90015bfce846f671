pub mod config;
pub mod indexer;
pub mod manager;
pub mod metrics;
pub mod release;
pub mod store;
pub mod testing;

pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use indexer::{
    ClientSettings, IndexerClient, IndexerConfig, IndexerError, IndexerType, MediaType,
    SearchRequest, TorrentResult,
};
pub use manager::{AggregatedResults, IndexerFailure, IndexerManager, SearchError};
pub use store::{IndexerConfigStore, SqliteIndexerStore, StoreError};
