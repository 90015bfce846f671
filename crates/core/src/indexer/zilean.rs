//! Zilean backend: DMM-scraped hash lists.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use super::de::{decode_rows, lenient_u64};
use super::hash::RawRelease;
use super::http::{join_url, HttpFetcher, HttpSettings};
use super::types::{
    IndexerClient, IndexerConfig, IndexerError, MediaType, SearchRequest, TorrentResult,
};

#[derive(Debug, Deserialize)]
struct DmmTorrent {
    #[serde(default, rename = "infoHash", alias = "info_hash")]
    info_hash: Option<String>,
    #[serde(default, rename = "rawTitle", alias = "raw_title", alias = "filename")]
    raw_title: Option<String>,
    #[serde(default, deserialize_with = "lenient_u64")]
    size: u64,
}

pub struct ZileanClient {
    name: String,
    base_url: String,
    dmm_url: String,
    http: HttpFetcher,
}

impl ZileanClient {
    pub fn new(config: &IndexerConfig, settings: &HttpSettings) -> Result<Self, IndexerError> {
        let base = config.trimmed_base_url().ok_or_else(|| {
            IndexerError::InvalidConfiguration(format!(
                "zilean indexer '{}' has no base URL",
                config.name
            ))
        })?;
        Ok(Self {
            name: config.name.clone(),
            base_url: base.to_string(),
            dmm_url: join_url(base, &config.endpoint_path),
            http: HttpFetcher::new(&config.name, settings)?,
        })
    }

    pub(crate) fn filtered_url(&self, request: &SearchRequest) -> String {
        let mut url = format!(
            "{}/filtered?imdbId={}",
            self.dmm_url,
            urlencoding::encode(&request.title_id)
        );
        if let Some(season) = request.season {
            url.push_str(&format!("&season={}", season));
        }
        if let Some(episode) = request.episode {
            url.push_str(&format!("&episode={}", episode));
        }
        url
    }

    pub(crate) fn search_url(&self, query: &str) -> String {
        format!("{}/search?query={}", self.dmm_url, urlencoding::encode(query))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<TorrentResult>, IndexerError> {
        let rows: Vec<serde_json::Value> = self.http.get_json(url, &[]).await?;
        let results: Vec<TorrentResult> = decode_rows::<DmmTorrent>(rows)
            .into_iter()
            .filter_map(|row| {
                RawRelease {
                    info_hash: row.info_hash,
                    title: row.raw_title.unwrap_or_default(),
                    size_bytes: row.size,
                    ..Default::default()
                }
                .into_result(&self.name)
            })
            .collect();
        debug!(indexer = %self.name, results = results.len(), "Zilean search complete");
        Ok(results)
    }
}

#[async_trait]
impl IndexerClient for ZileanClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        self.fetch(&self.filtered_url(request)).await
    }

    async fn search_by_query(
        &self,
        query: &str,
        _media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        self.fetch(&self.search_url(query)).await
    }

    async fn health_check(&self) -> Result<(), IndexerError> {
        self.http
            .get_text(&join_url(&self.base_url, "/healthchecks/ping"), &[])
            .await
            .map(|_| ())
    }
}
