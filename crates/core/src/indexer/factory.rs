//! Maps an `IndexerConfig` to a concrete client.

use std::sync::Arc;

use super::eztv::EztvClient;
use super::http::HttpSettings;
use super::piratebay::PirateBayClient;
use super::stremio::StremioClient;
use super::torznab::TorznabClient;
use super::types::{IndexerClient, IndexerConfig, IndexerError, IndexerType};
use super::yts::{YtsClient, DEFAULT_MIRRORS};
use super::zilean::ZileanClient;

/// Settings shared by every client the factory builds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientSettings {
    pub http: HttpSettings,
    /// Ordered YTS mirrors.
    pub yts_mirrors: Vec<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            http: HttpSettings::default(),
            yts_mirrors: DEFAULT_MIRRORS.iter().map(|m| m.to_string()).collect(),
        }
    }
}

/// Build the client for `config`.
///
/// Fails with `InvalidConfiguration` when a required field (usually the
/// base URL of a self-hosted backend) is missing.
pub fn build_client(
    config: &IndexerConfig,
    settings: &ClientSettings,
) -> Result<Arc<dyn IndexerClient>, IndexerError> {
    let http = &settings.http;
    let client: Arc<dyn IndexerClient> = match config.indexer_type {
        IndexerType::ThePirateBay => Arc::new(PirateBayClient::new(config, http)?),
        IndexerType::Eztv => Arc::new(EztvClient::new(config, http)?),
        IndexerType::Yts => Arc::new(YtsClient::new(config, http, &settings.yts_mirrors)?),
        IndexerType::Jackett | IndexerType::Prowlarr | IndexerType::Torznab => {
            Arc::new(TorznabClient::new(config, http)?)
        }
        IndexerType::Zilean => Arc::new(ZileanClient::new(config, http)?),
        IndexerType::Stremio => Arc::new(StremioClient::new(config, http)?),
    };
    Ok(client)
}
