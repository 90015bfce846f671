//! Built-in backend definitions and reconciliation of persisted configs.
//!
//! The registry only creates entries on a true first run
//! ([`default_configs`]). Reconciliation ([`canonicalizing_known_defaults`],
//! [`prioritize_known_defaults`]) rewrites and reorders what is already
//! persisted and never brings back a built-in the user deleted.

use super::types::{IndexerConfig, IndexerType};

/// One built-in backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DefaultIndexer {
    pub id: &'static str,
    /// Ids this entry was persisted under by earlier releases.
    pub legacy_ids: &'static [&'static str],
    pub name: &'static str,
    pub indexer_type: IndexerType,
    pub base_url: &'static str,
    pub is_active: bool,
}

/// Best first.
pub const DEFAULT_INDEXERS: &[DefaultIndexer] = &[
    DefaultIndexer {
        id: "builtin.torrentio",
        legacy_ids: &["torrentio"],
        name: "Torrentio",
        indexer_type: IndexerType::Stremio,
        base_url: "https://torrentio.strem.fun",
        is_active: true,
    },
    DefaultIndexer {
        id: "builtin.yts",
        legacy_ids: &["yts"],
        name: "YTS",
        indexer_type: IndexerType::Yts,
        base_url: "https://yts.mx",
        is_active: true,
    },
    DefaultIndexer {
        id: "builtin.eztv",
        legacy_ids: &["eztv"],
        name: "EZTV",
        indexer_type: IndexerType::Eztv,
        base_url: "https://eztvx.to",
        is_active: true,
    },
    DefaultIndexer {
        id: "builtin.thepiratebay",
        legacy_ids: &["thepiratebay", "piratebay", "tpb"],
        name: "The Pirate Bay",
        indexer_type: IndexerType::ThePirateBay,
        base_url: "https://apibay.org",
        is_active: true,
    },
    DefaultIndexer {
        id: "builtin.mediafusion",
        legacy_ids: &["mediafusion"],
        name: "MediaFusion",
        indexer_type: IndexerType::Stremio,
        base_url: "https://mediafusion.elfhosted.com",
        is_active: false,
    },
];

impl DefaultIndexer {
    fn matches(&self, id: &str) -> bool {
        self.id == id || self.legacy_ids.contains(&id)
    }

    /// Materialize as a config at the given priority.
    pub fn to_config(&self, priority: u32) -> IndexerConfig {
        IndexerConfig::new(self.id, self.name, self.indexer_type)
            .with_base_url(self.base_url)
            .with_active(self.is_active)
            .with_priority(priority)
    }

    /// Overwrite the registry-owned fields of `config`.
    fn canonicalize(&self, config: &mut IndexerConfig) {
        let kind = self.indexer_type;
        config.indexer_type = kind;
        config.base_url = Some(self.base_url.to_string());
        config.endpoint_path = kind.default_endpoint_path().to_string();
        config.provider_subtype = kind.as_str().to_string();
        config.api_key_transport = kind.default_api_key_transport();
    }
}

/// Registry position of the built-in matching `id`.
pub fn registry_rank(id: &str) -> Option<usize> {
    DEFAULT_INDEXERS.iter().position(|entry| entry.matches(id))
}

/// Find the built-in whose id or legacy id equals `id`.
pub fn find_default(id: &str) -> Option<&'static DefaultIndexer> {
    DEFAULT_INDEXERS.iter().find(|entry| entry.matches(id))
}

/// The full registry as priority-ordered configs. First run only.
pub fn default_configs() -> Vec<IndexerConfig> {
    DEFAULT_INDEXERS
        .iter()
        .enumerate()
        .map(|(i, entry)| entry.to_config(i as u32))
        .collect()
}

/// Migrate persisted built-ins to the registry's current shape.
///
/// Only type, base URL, endpoint, subtype and key transport are rewritten;
/// activity, name, key, category filter and priority stay as persisted.
/// Configs that match no built-in pass through untouched.
pub fn canonicalizing_known_defaults(configs: Vec<IndexerConfig>) -> Vec<IndexerConfig> {
    configs
        .into_iter()
        .map(|mut config| {
            if let Some(entry) = find_default(&config.id) {
                entry.canonicalize(&mut config);
            }
            config
        })
        .collect()
}

/// Built-ins first in registry order, then everything else in its current
/// relative order, then priorities renumbered densely from 0.
pub fn prioritize_known_defaults(configs: Vec<IndexerConfig>) -> Vec<IndexerConfig> {
    let (mut known, unknown): (Vec<_>, Vec<_>) = configs
        .into_iter()
        .partition(|config| registry_rank(&config.id).is_some());
    known.sort_by_key(|config| registry_rank(&config.id));

    known
        .into_iter()
        .chain(unknown)
        .enumerate()
        .map(|(i, mut config)| {
            config.priority = i as u32;
            config
        })
        .collect()
}
