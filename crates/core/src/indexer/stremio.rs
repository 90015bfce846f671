//! Stremio addon backend (Torrentio, MediaFusion and compatible addons).

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex_lite::Regex;
use serde::Deserialize;
use tracing::debug;

use super::de::{lenient_opt_u32, lenient_u64, lenient_vec};
use super::hash::{
    info_hash_from_magnet, normalize_info_hash, synthesize_hash_from_url, RawRelease,
};
use super::http::{HttpFetcher, HttpSettings};
use super::types::{
    IndexerClient, IndexerConfig, IndexerError, MediaType, SearchRequest, TorrentResult,
};

static SEEDERS_IN_TITLE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"👤\s*(\d+)").expect("seeders pattern is valid"));

static SIZE_IN_TITLE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)💾\s*(\d+(?:[.,]\d+)?)\s*([KMGT])i?B").expect("size pattern is valid")
});

#[derive(Debug, Deserialize)]
struct StreamsResponse {
    #[serde(default, deserialize_with = "lenient_vec")]
    streams: Vec<Stream>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Stream {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    external_url: Option<String>,
    #[serde(default)]
    info_hash: Option<String>,
    #[serde(default)]
    magnet: Option<String>,
    #[serde(default)]
    behavior_hints: Option<BehaviorHints>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BehaviorHints {
    #[serde(default, deserialize_with = "lenient_u64")]
    video_size: u64,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    seeders: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    leechers: Option<u32>,
}

/// Seeder count embedded as `👤 123` in a Torrentio title.
pub(crate) fn seeders_from_title(text: &str) -> Option<u32> {
    SEEDERS_IN_TITLE
        .captures(text)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Size embedded as `💾 1.4 GB` in a Torrentio title, in bytes.
pub(crate) fn size_from_title(text: &str) -> Option<u64> {
    let caps = SIZE_IN_TITLE.captures(text)?;
    let number: f64 = caps.get(1)?.as_str().replace(',', ".").parse().ok()?;
    let multiplier = match caps.get(2)?.as_str().to_ascii_uppercase().as_str() {
        "K" => 1024f64,
        "M" => 1024f64.powi(2),
        "G" => 1024f64.powi(3),
        "T" => 1024f64.powi(4),
        _ => return None,
    };
    Some((number * multiplier) as u64)
}

impl Stream {
    fn details(&self) -> String {
        [&self.title, &self.description, &self.name]
            .into_iter()
            .flatten()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn release_title(&self) -> String {
        self.title
            .as_deref()
            .or(self.description.as_deref())
            .or(self.name.as_deref())
            .and_then(|text| text.lines().map(str::trim).find(|line| !line.is_empty()))
            .unwrap_or_default()
            .to_string()
    }

    fn into_raw(self) -> Option<RawRelease> {
        let links: Vec<&str> = [&self.magnet, &self.url, &self.external_url]
            .into_iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect();
        let magnet = links
            .iter()
            .find(|link| link.starts_with("magnet:"))
            .map(|m| m.to_string());

        let info_hash = self
            .info_hash
            .as_deref()
            .and_then(normalize_info_hash)
            .or_else(|| magnet.as_deref().and_then(info_hash_from_magnet))
            .or_else(|| {
                links
                    .iter()
                    .find(|link| link.starts_with("http://") || link.starts_with("https://"))
                    .map(|url| synthesize_hash_from_url(url))
            })?;

        let details = self.details();
        let hints = self.behavior_hints.as_ref();
        let size_bytes = hints
            .map(|h| h.video_size)
            .filter(|size| *size > 0)
            .or_else(|| size_from_title(&details))
            .unwrap_or(0);
        let seeders = hints
            .and_then(|h| h.seeders)
            .or_else(|| seeders_from_title(&details))
            .unwrap_or(0);
        let leechers = hints.and_then(|h| h.leechers).unwrap_or(0);

        Some(RawRelease {
            info_hash: Some(info_hash),
            magnet_uri: magnet,
            title: self.release_title(),
            size_bytes,
            seeders,
            leechers,
        })
    }
}

pub struct StremioClient {
    name: String,
    base_url: String,
    http: HttpFetcher,
}

/// Addon base from a configured URL, dropping a trailing `/manifest.json`.
pub(crate) fn addon_base(url: &str) -> &str {
    let url = url.trim().trim_end_matches('/');
    url.strip_suffix("/manifest.json")
        .unwrap_or(url)
        .trim_end_matches('/')
}

fn looks_like_imdb_id(text: &str) -> bool {
    text.strip_prefix("tt")
        .is_some_and(|digits| !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()))
}

impl StremioClient {
    pub fn new(config: &IndexerConfig, settings: &HttpSettings) -> Result<Self, IndexerError> {
        let base = config
            .trimmed_base_url()
            .map(addon_base)
            .filter(|b| !b.is_empty())
            .ok_or_else(|| {
                IndexerError::InvalidConfiguration(format!(
                    "stremio addon '{}' has no base URL",
                    config.name
                ))
            })?;
        Ok(Self {
            name: config.name.clone(),
            base_url: base.to_string(),
            http: HttpFetcher::new(&config.name, settings)?,
        })
    }

    pub(crate) fn stream_url(&self, request: &SearchRequest) -> String {
        let id = match (request.media_type, request.season, request.episode) {
            (MediaType::Series, Some(season), Some(episode)) => {
                format!("{}:{}:{}", request.title_id, season, episode)
            }
            _ => request.title_id.clone(),
        };
        format!(
            "{}/stream/{}/{}.json",
            self.base_url,
            request.media_type.as_str(),
            id
        )
    }

    async fn fetch(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        let response: StreamsResponse = self.http.get_json(&self.stream_url(request), &[]).await?;
        let results: Vec<TorrentResult> = response
            .streams
            .into_iter()
            .filter_map(Stream::into_raw)
            .filter_map(|raw| raw.into_result(&self.name))
            .collect();
        debug!(indexer = %self.name, results = results.len(), "Stremio addon search complete");
        Ok(results)
    }
}

#[async_trait]
impl IndexerClient for StremioClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        self.fetch(request).await
    }

    /// Addons resolve ids only; free text that is not an IMDb id finds nothing.
    async fn search_by_query(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        let query = query.trim();
        if !looks_like_imdb_id(query) {
            return Ok(Vec::new());
        }
        let request = match media_type {
            MediaType::Movie => SearchRequest::movie(query),
            MediaType::Series => SearchRequest::series(query),
        };
        self.fetch(&request).await
    }

    async fn health_check(&self) -> Result<(), IndexerError> {
        self.http
            .get_text(&format!("{}/manifest.json", self.base_url), &[])
            .await
            .map(|_| ())
    }
}
