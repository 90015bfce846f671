//! Search backends.
//!
//! This module provides the `IndexerClient` trait, one implementation per
//! backend protocol, the factory that builds them from persisted configs,
//! the built-in registry and the merge pipeline used by the manager.

mod de;
pub mod eztv;
pub mod factory;
pub mod hash;
mod http;
pub mod merge;
pub mod piratebay;
pub mod registry;
pub mod stremio;
pub mod torznab;
mod types;
pub mod yts;
pub mod zilean;

pub use factory::{build_client, ClientSettings};
pub use hash::{build_magnet, info_hash_from_magnet, normalize_info_hash, synthesize_hash_from_url};
pub use http::HttpSettings;
pub use registry::{
    canonicalizing_known_defaults, default_configs, prioritize_known_defaults, DefaultIndexer,
    DEFAULT_INDEXERS,
};
pub use types::*;
