//! The Pirate Bay backend (apibay JSON API).

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::release::episode;

use super::de::{decode_rows, lenient_u32, lenient_u64};
use super::hash::RawRelease;
use super::http::{join_url, HttpFetcher, HttpSettings};
use super::types::{
    IndexerClient, IndexerConfig, IndexerError, MediaType, SearchRequest, TorrentResult,
};

/// apibay answers an empty search with a single record of this id.
const NO_RESULTS_ID: u64 = 0;

#[derive(Debug, Deserialize)]
struct ApibayTorrent {
    #[serde(default, deserialize_with = "lenient_u64")]
    id: u64,
    #[serde(default)]
    name: String,
    #[serde(default)]
    info_hash: String,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeders: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    leechers: u32,
}

pub struct PirateBayClient {
    name: String,
    search_url: String,
    category: String,
    http: HttpFetcher,
}

impl PirateBayClient {
    pub fn new(config: &IndexerConfig, settings: &HttpSettings) -> Result<Self, IndexerError> {
        let base = config
            .trimmed_base_url()
            .or(config.indexer_type.default_base_url())
            .ok_or_else(|| IndexerError::InvalidConfiguration("missing base URL".into()))?;
        Ok(Self {
            name: config.name.clone(),
            search_url: join_url(base, &config.endpoint_path),
            category: config
                .category_filter
                .clone()
                .filter(|c| !c.trim().is_empty())
                .unwrap_or_else(|| "0".to_string()),
            http: HttpFetcher::new(&config.name, settings)?,
        })
    }

    fn url_for(&self, query: &str) -> String {
        format!(
            "{}?q={}&cat={}",
            self.search_url,
            urlencoding::encode(query),
            urlencoding::encode(&self.category)
        )
    }

    async fn query(&self, query: &str) -> Result<Vec<TorrentResult>, IndexerError> {
        let rows: Vec<serde_json::Value> = self.http.get_json(&self.url_for(query), &[]).await?;
        let results: Vec<TorrentResult> = decode_rows::<ApibayTorrent>(rows)
            .into_iter()
            .filter(|row| row.id != NO_RESULTS_ID)
            .filter_map(|row| {
                RawRelease {
                    info_hash: Some(row.info_hash),
                    title: row.name,
                    size_bytes: row.size,
                    seeders: row.seeders,
                    leechers: row.leechers,
                    ..Default::default()
                }
                .into_result(&self.name)
            })
            .collect();
        debug!(indexer = %self.name, results = results.len(), "apibay search complete");
        Ok(results)
    }
}

#[async_trait]
impl IndexerClient for PirateBayClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        let mut results = self.query(&request.title_id).await?;
        if let Some(ctx) = request.episode_context() {
            results.retain(|r| episode::matches(&r.title, ctx.season, ctx.episode));
        }
        Ok(results)
    }

    async fn search_by_query(
        &self,
        query: &str,
        _media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        self.query(query).await
    }

    async fn health_check(&self) -> Result<(), IndexerError> {
        self.http
            .get_text(&format!("{}?q=test&cat=0", self.search_url), &[])
            .await
            .map(|_| ())
    }
}
