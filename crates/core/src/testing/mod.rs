//! Testing utilities and mock implementations.
//!
//! This module provides a mock `IndexerClient` and an in-memory
//! `IndexerConfigStore`, allowing orchestrator and API tests without
//! real backends or a database.
//!
//! # Example
//!
//! ```rust,ignore
//! use indexhub_core::testing::{fixtures, MemoryConfigStore, MockIndexer};
//!
//! let tracker = Arc::new(MockIndexer::new("tracker"));
//! tracker.set_results(vec![fixtures::result(1, "Movie.2020.1080p", 25)]).await;
//!
//! let manager = IndexerManager::with_clients(
//!     Arc::new(MemoryConfigStore::new()),
//!     ClientSettings::default(),
//!     vec![tracker],
//! );
//! ```

mod memory_store;
mod mock_indexer;

pub use memory_store::MemoryConfigStore;
pub use mock_indexer::{MockIndexer, RecordedQuery, RecordedSearch};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::indexer::{build_magnet, IndexerConfig, IndexerType, TorrentResult};

    /// A deterministic 40-char hex hash derived from `seed`.
    pub fn info_hash(seed: u64) -> String {
        format!("{:040x}", seed)
    }

    /// Create a test result with reasonable defaults.
    pub fn result(seed: u64, title: &str, seeders: u32) -> TorrentResult {
        let hash = info_hash(seed);
        let mut result = TorrentResult::new(hash.clone(), title, "mock-indexer");
        result.size_bytes = 1024 * 1024 * 1024 * 2; // 2 GB
        result.seeders = seeders;
        result.leechers = seeders / 2;
        result.magnet_uri = Some(build_magnet(&hash, title));
        result
    }

    /// Create a test result for one episode of a show.
    pub fn episode_result(
        seed: u64,
        show: &str,
        season: u32,
        episode: u32,
        seeders: u32,
    ) -> TorrentResult {
        result(
            seed,
            &format!("{}.S{:02}E{:02}.1080p.WEB-DL.x264", show, season, episode),
            seeders,
        )
    }

    /// Create a user-added indexer config at `priority`.
    pub fn indexer_config(id: &str, indexer_type: IndexerType, priority: u32) -> IndexerConfig {
        IndexerConfig::new(id, id, indexer_type).with_priority(priority)
    }
}
