//! Indexer data model and the `IndexerClient` trait.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::release::{
    AudioFormat, EpisodeContext, HdrFormat, ReleaseInfo, SourceType, VideoCodec, VideoQuality,
};

/// Kind of media a search targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Movie,
    Series,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Series => "series",
        }
    }
}

/// A search by title identifier (usually an IMDb id such as `tt0111161`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub title_id: String,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
}

impl SearchRequest {
    pub fn movie(title_id: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            media_type: MediaType::Movie,
            season: None,
            episode: None,
        }
    }

    pub fn series(title_id: impl Into<String>) -> Self {
        Self {
            title_id: title_id.into(),
            media_type: MediaType::Series,
            season: None,
            episode: None,
        }
    }

    pub fn episode(title_id: impl Into<String>, season: u32, episode: u32) -> Self {
        Self {
            title_id: title_id.into(),
            media_type: MediaType::Series,
            season: Some(season),
            episode: Some(episode),
        }
    }

    /// The targeted episode, when both season and episode are known.
    pub fn episode_context(&self) -> Option<EpisodeContext> {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) => Some(EpisodeContext::new(season, episode)),
            _ => None,
        }
    }
}

/// Backend protocol of a configured indexer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IndexerType {
    /// The Pirate Bay JSON API (apibay).
    ThePirateBay,
    /// EZTV paginated show API.
    Eztv,
    /// YTS multi-mirror movie API.
    Yts,
    Jackett,
    Prowlarr,
    /// Any other Torznab endpoint.
    Torznab,
    /// DMM-style hash list (Zilean).
    Zilean,
    /// Stremio addon exposing `/stream/...` lookups.
    Stremio,
}

impl IndexerType {
    pub const ALL: [IndexerType; 8] = [
        IndexerType::ThePirateBay,
        IndexerType::Eztv,
        IndexerType::Yts,
        IndexerType::Jackett,
        IndexerType::Prowlarr,
        IndexerType::Torznab,
        IndexerType::Zilean,
        IndexerType::Stremio,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IndexerType::ThePirateBay => "thepiratebay",
            IndexerType::Eztv => "eztv",
            IndexerType::Yts => "yts",
            IndexerType::Jackett => "jackett",
            IndexerType::Prowlarr => "prowlarr",
            IndexerType::Torznab => "torznab",
            IndexerType::Zilean => "zilean",
            IndexerType::Stremio => "stremio",
        }
    }

    /// Default path appended to the base URL.
    pub fn default_endpoint_path(&self) -> &'static str {
        match self {
            IndexerType::ThePirateBay => "/q.php",
            IndexerType::Eztv => "/api/get-torrents",
            IndexerType::Yts => "/api/v2/list_movies.json",
            IndexerType::Jackett => "/api/v2.0/indexers/all/results/torznab/api",
            IndexerType::Prowlarr => "/api/v1/search",
            IndexerType::Torznab => "/api",
            IndexerType::Zilean => "/dmm",
            IndexerType::Stremio => "",
        }
    }

    pub fn default_api_key_transport(&self) -> ApiKeyTransport {
        match self {
            IndexerType::Prowlarr => ApiKeyTransport::Header,
            _ => ApiKeyTransport::Query,
        }
    }

    /// Public trackers have a well-known host; everything else is
    /// self-hosted or user-supplied and cannot be built without one.
    pub fn default_base_url(&self) -> Option<&'static str> {
        match self {
            IndexerType::ThePirateBay => Some("https://apibay.org"),
            IndexerType::Eztv => Some("https://eztvx.to"),
            IndexerType::Yts => Some("https://yts.mx"),
            _ => None,
        }
    }

    /// Whether the type speaks Torznab (XML or the JSON variant).
    pub fn is_torznab_family(&self) -> bool {
        matches!(
            self,
            IndexerType::Jackett | IndexerType::Prowlarr | IndexerType::Torznab
        )
    }
}

impl fmt::Display for IndexerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndexerType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "thepiratebay" | "piratebay" | "tpb" | "apibay" => Ok(IndexerType::ThePirateBay),
            "eztv" => Ok(IndexerType::Eztv),
            "yts" => Ok(IndexerType::Yts),
            "jackett" => Ok(IndexerType::Jackett),
            "prowlarr" => Ok(IndexerType::Prowlarr),
            "torznab" => Ok(IndexerType::Torznab),
            "zilean" | "dmm" => Ok(IndexerType::Zilean),
            "stremio" | "torrentio" => Ok(IndexerType::Stremio),
            other => Err(format!("Unknown indexer type: {}", other)),
        }
    }
}

/// Where the API key travels on each request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiKeyTransport {
    /// `apikey=` query parameter.
    Query,
    /// `X-Api-Key` header.
    Header,
}

impl ApiKeyTransport {
    pub fn as_str(&self) -> &'static str {
        match self {
            ApiKeyTransport::Query => "query",
            ApiKeyTransport::Header => "header",
        }
    }
}

impl FromStr for ApiKeyTransport {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "query" => Ok(ApiKeyTransport::Query),
            "header" => Ok(ApiKeyTransport::Header),
            other => Err(format!("Unknown API key transport: {}", other)),
        }
    }
}

/// A persisted backend definition.
///
/// `endpoint_path`, `api_key_transport` and `provider_subtype` always carry
/// a value: deserialization and [`IndexerConfig::new`] fill them from the
/// indexer type when absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "IndexerConfigRecord")]
pub struct IndexerConfig {
    pub id: String,
    pub name: String,
    pub indexer_type: IndexerType,
    pub base_url: Option<String>,
    pub api_key: Option<String>,
    pub is_active: bool,
    /// Lower is preferred. Dense from 0 after any reconciliation.
    pub priority: u32,
    pub provider_subtype: String,
    pub endpoint_path: String,
    /// Passed verbatim to backends that support category filtering.
    pub category_filter: Option<String>,
    pub api_key_transport: ApiKeyTransport,
}

impl IndexerConfig {
    pub fn new(id: impl Into<String>, name: impl Into<String>, indexer_type: IndexerType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            indexer_type,
            base_url: indexer_type.default_base_url().map(str::to_string),
            api_key: None,
            is_active: true,
            priority: 0,
            provider_subtype: indexer_type.as_str().to_string(),
            endpoint_path: indexer_type.default_endpoint_path().to_string(),
            category_filter: None,
            api_key_transport: indexer_type.default_api_key_transport(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn with_priority(mut self, priority: u32) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_category_filter(mut self, filter: impl Into<String>) -> Self {
        self.category_filter = Some(filter.into());
        self
    }

    pub fn with_active(mut self, is_active: bool) -> Self {
        self.is_active = is_active;
        self
    }

    /// Base URL without trailing slash, or `None` when unset/blank.
    pub fn trimmed_base_url(&self) -> Option<&str> {
        self.base_url
            .as_deref()
            .map(|url| url.trim().trim_end_matches('/'))
            .filter(|url| !url.is_empty())
    }

    /// API key when set and non-blank.
    pub fn api_key(&self) -> Option<&str> {
        self.api_key
            .as_deref()
            .map(str::trim)
            .filter(|key| !key.is_empty())
    }
}

/// Wire shape of [`IndexerConfig`] with the type-derived fields optional.
#[derive(Deserialize)]
struct IndexerConfigRecord {
    id: String,
    name: String,
    indexer_type: IndexerType,
    #[serde(default)]
    base_url: Option<String>,
    #[serde(default)]
    api_key: Option<String>,
    #[serde(default = "default_true")]
    is_active: bool,
    #[serde(default)]
    priority: u32,
    #[serde(default)]
    provider_subtype: Option<String>,
    #[serde(default)]
    endpoint_path: Option<String>,
    #[serde(default)]
    category_filter: Option<String>,
    #[serde(default)]
    api_key_transport: Option<ApiKeyTransport>,
}

fn default_true() -> bool {
    true
}

impl From<IndexerConfigRecord> for IndexerConfig {
    fn from(record: IndexerConfigRecord) -> Self {
        let kind = record.indexer_type;
        Self {
            id: record.id,
            name: record.name,
            indexer_type: kind,
            base_url: record.base_url,
            api_key: record.api_key,
            is_active: record.is_active,
            priority: record.priority,
            provider_subtype: record
                .provider_subtype
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| kind.as_str().to_string()),
            endpoint_path: record
                .endpoint_path
                .filter(|s| !s.is_empty())
                .unwrap_or_else(|| kind.default_endpoint_path().to_string()),
            category_filter: record.category_filter,
            api_key_transport: record
                .api_key_transport
                .unwrap_or_else(|| kind.default_api_key_transport()),
        }
    }
}

/// A normalized search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentResult {
    /// 40 lower-case hex chars. The dedup key.
    pub info_hash: String,
    pub title: String,
    /// 0 when unknown.
    pub size_bytes: u64,
    pub seeders: u32,
    pub leechers: u32,
    pub quality: VideoQuality,
    pub codec: VideoCodec,
    pub audio_format: AudioFormat,
    pub source_type: SourceType,
    pub hdr_format: HdrFormat,
    /// Which backend produced this hit.
    pub indexer_name: String,
    pub magnet_uri: Option<String>,
    /// Filled by debrid resolution downstream, never by a backend.
    pub is_cached: Option<bool>,
    pub cached_on_service: Option<String>,
}

impl TorrentResult {
    /// Build a result for an already-normalized hash, classifying the title.
    pub fn new(
        info_hash: impl Into<String>,
        title: impl Into<String>,
        indexer_name: impl Into<String>,
    ) -> Self {
        let title = title.into();
        let info = ReleaseInfo::parse(&title);
        Self {
            info_hash: info_hash.into(),
            title,
            size_bytes: 0,
            seeders: 0,
            leechers: 0,
            quality: info.quality,
            codec: info.codec,
            audio_format: info.audio_format,
            source_type: info.source_type,
            hdr_format: info.hdr_format,
            indexer_name: indexer_name.into(),
            magnet_uri: None,
            is_cached: None,
            cached_on_service: None,
        }
    }

    pub fn cached(&self) -> bool {
        self.is_cached.unwrap_or(false)
    }
}

/// Errors raised by a single backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IndexerError {
    #[error("Invalid indexer configuration: {0}")]
    InvalidConfiguration(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Request timeout")]
    Timeout,

    #[error("HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Request cancelled")]
    Cancelled,
}

impl IndexerError {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, IndexerError::Cancelled)
    }
}

/// One search backend.
#[async_trait]
pub trait IndexerClient: Send + Sync {
    /// Display name, used as provenance on results and in error manifests.
    fn name(&self) -> &str;

    /// Search by title identifier.
    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError>;

    /// Search by free text.
    async fn search_by_query(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError>;

    /// Minimal request proving the backend is reachable (expects 2xx).
    async fn health_check(&self) -> Result<(), IndexerError>;
}
