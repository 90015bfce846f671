//! Torznab family backend: Jackett, Prowlarr and generic Torznab endpoints.
//!
//! Responses are either Torznab XML or one of the JSON shapes Jackett and
//! Prowlarr emit; the first non-whitespace byte decides which parser runs.

use async_trait::async_trait;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use serde::Deserialize;
use tracing::debug;

use super::de::{decode_rows, lenient_opt_u32, lenient_u64};
use super::hash::RawRelease;
use super::http::{decode_json, join_url, HttpFetcher, HttpSettings};
use super::types::{
    ApiKeyTransport, IndexerClient, IndexerConfig, IndexerError, IndexerType, MediaType,
    SearchRequest, TorrentResult,
};

const API_KEY_HEADER: &str = "x-api-key";

/// Query dialect spoken by the endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dialect {
    /// `t=search` with `imdbid`, `season`, `ep` or `q`, plus `cat`.
    Torznab,
    /// Prowlarr's own search API: `type=` plus a structured `query`.
    Prowlarr,
}

pub struct TorznabClient {
    name: String,
    dialect: Dialect,
    base_url: String,
    search_url: String,
    api_key: Option<String>,
    transport: ApiKeyTransport,
    category_filter: Option<String>,
    http: HttpFetcher,
}

impl TorznabClient {
    pub fn new(config: &IndexerConfig, settings: &HttpSettings) -> Result<Self, IndexerError> {
        let base = config.trimmed_base_url().ok_or_else(|| {
            IndexerError::InvalidConfiguration(format!(
                "{} indexer '{}' has no base URL",
                config.indexer_type, config.name
            ))
        })?;
        let dialect = match config.indexer_type {
            IndexerType::Prowlarr => Dialect::Prowlarr,
            _ => Dialect::Torznab,
        };
        Ok(Self {
            name: config.name.clone(),
            dialect,
            base_url: base.to_string(),
            search_url: join_url(base, &config.endpoint_path),
            api_key: config.api_key().map(str::to_string),
            transport: config.api_key_transport,
            category_filter: config
                .category_filter
                .clone()
                .filter(|c| !c.trim().is_empty()),
            http: HttpFetcher::new(&config.name, settings)?,
        })
    }

    fn with_params(&self, url: String, params: &[(&str, String)]) -> String {
        let mut url = url;
        let mut separator = if url.contains('?') { '&' } else { '?' };
        let key_param = match (&self.api_key, self.transport) {
            (Some(key), ApiKeyTransport::Query) => Some(("apikey", key.clone())),
            _ => None,
        };
        for (key, value) in params.iter().cloned().chain(key_param) {
            url.push(separator);
            url.push_str(key);
            url.push('=');
            url.push_str(&urlencoding::encode(&value));
            separator = '&';
        }
        url
    }

    fn headers(&self) -> Vec<(&'static str, &str)> {
        match (&self.api_key, self.transport) {
            (Some(key), ApiKeyTransport::Header) => vec![(API_KEY_HEADER, key.as_str())],
            _ => Vec::new(),
        }
    }

    fn category_param(&self) -> Option<(&'static str, String)> {
        let name = match self.dialect {
            Dialect::Torznab => "cat",
            Dialect::Prowlarr => "categories",
        };
        self.category_filter.clone().map(|c| (name, c))
    }

    pub(crate) fn id_search_url(&self, request: &SearchRequest) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();
        match self.dialect {
            Dialect::Torznab => {
                params.push(("t", "search".to_string()));
                params.push(("imdbid", request.title_id.clone()));
                if request.media_type == MediaType::Series {
                    if let Some(season) = request.season {
                        params.push(("season", season.to_string()));
                    }
                    if let Some(episode) = request.episode {
                        params.push(("ep", episode.to_string()));
                    }
                }
            }
            Dialect::Prowlarr => {
                let kind = match request.media_type {
                    MediaType::Movie => "moviesearch",
                    MediaType::Series => "tvsearch",
                };
                let mut query = format!("{{ImdbId:{}}}", request.title_id);
                if request.media_type == MediaType::Series {
                    if let Some(season) = request.season {
                        query.push_str(&format!("{{Season:{:02}}}", season));
                    }
                    if let Some(episode) = request.episode {
                        query.push_str(&format!("{{Episode:{:02}}}", episode));
                    }
                }
                params.push(("type", kind.to_string()));
                params.push(("query", query));
            }
        }
        params.extend(self.category_param());
        self.with_params(self.search_url.clone(), &params)
    }

    pub(crate) fn text_search_url(&self, query: &str) -> String {
        let mut params: Vec<(&str, String)> = match self.dialect {
            Dialect::Torznab => vec![("t", "search".into()), ("q", query.to_string())],
            Dialect::Prowlarr => vec![("type", "search".into()), ("query", query.to_string())],
        };
        params.extend(self.category_param());
        self.with_params(self.search_url.clone(), &params)
    }

    pub(crate) fn health_check_url(&self) -> String {
        match self.dialect {
            Dialect::Torznab => {
                self.with_params(self.search_url.clone(), &[("t", "caps".to_string())])
            }
            Dialect::Prowlarr => self.with_params(join_url(&self.base_url, "/api/v1/indexer"), &[]),
        }
    }

    async fn run(&self, url: &str) -> Result<Vec<TorrentResult>, IndexerError> {
        let headers = self.headers();
        let body = self.http.get_text(url, &headers).await?;
        let results = parse_body(&body, &self.name)?;
        debug!(indexer = %self.name, results = results.len(), "Torznab search complete");
        Ok(results)
    }
}

#[async_trait]
impl IndexerClient for TorznabClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        self.run(&self.id_search_url(request)).await
    }

    async fn search_by_query(
        &self,
        query: &str,
        _media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        self.run(&self.text_search_url(query)).await
    }

    async fn health_check(&self) -> Result<(), IndexerError> {
        let headers = self.headers();
        self.http
            .get_text(&self.health_check_url(), &headers)
            .await
            .map(|_| ())
    }
}

/// Parse a Torznab response, XML or JSON.
pub fn parse_body(body: &str, indexer: &str) -> Result<Vec<TorrentResult>, IndexerError> {
    let trimmed = body.trim_start_matches('\u{feff}').trim_start();
    if trimmed.starts_with('<') {
        parse_xml(trimmed, indexer)
    } else if trimmed.is_empty() {
        Ok(Vec::new())
    } else {
        parse_json(trimmed, indexer)
    }
}

#[derive(Debug, Default)]
struct XmlItem {
    title: Option<String>,
    link: Option<String>,
    guid: Option<String>,
    enclosure: Option<String>,
    size: Option<u64>,
    seeders: Option<u32>,
    peers: Option<u32>,
    leechers: Option<u32>,
    info_hash: Option<String>,
    magnet: Option<String>,
}

impl XmlItem {
    fn set_text(&mut self, tag: &str, text: String) {
        match tag {
            "title" => self.title = Some(text),
            "link" => self.link = Some(text),
            "guid" => self.guid = Some(text),
            "size" => self.size = text.trim().parse().ok(),
            _ => {}
        }
    }

    fn set_attr(&mut self, name: &str, value: String) {
        match name.to_ascii_lowercase().as_str() {
            "infohash" => self.info_hash = Some(value),
            "magneturl" => self.magnet = Some(value),
            "size" => {
                if let Ok(size) = value.trim().parse() {
                    self.size = Some(size);
                }
            }
            "seeders" => self.seeders = value.trim().parse().ok(),
            "peers" => self.peers = value.trim().parse().ok(),
            "leechers" => self.leechers = value.trim().parse().ok(),
            _ => {}
        }
    }

    fn into_result(self, indexer: &str) -> Option<TorrentResult> {
        let seeders = self.seeders.unwrap_or(0);
        let leechers = self
            .leechers
            .unwrap_or_else(|| self.peers.unwrap_or(0).saturating_sub(seeders));
        let magnet = self
            .magnet
            .into_iter()
            .chain(self.link)
            .chain(self.enclosure)
            .chain(self.guid)
            .find(|candidate| candidate.trim_start().starts_with("magnet:"));
        RawRelease {
            info_hash: self.info_hash,
            magnet_uri: magnet,
            title: self.title.unwrap_or_default(),
            size_bytes: self.size.unwrap_or(0),
            seeders,
            leechers,
        }
        .into_result(indexer)
    }
}

fn attribute(element: &BytesStart<'_>, key: &str) -> Option<String> {
    element
        .attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key.as_bytes())
        .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()))
}

fn element_name(element: &BytesStart<'_>) -> String {
    String::from_utf8_lossy(element.name().as_ref()).into_owned()
}

/// Start and empty tags are handled alike; returns an error from an
/// `<error code=.. description=..>` root.
fn open_element(
    element: &BytesStart<'_>,
    current: &mut Option<XmlItem>,
) -> Result<(), IndexerError> {
    let name = element_name(element);
    match name.as_str() {
        "item" => *current = Some(XmlItem::default()),
        "error" if current.is_none() => {
            let code = attribute(element, "code").unwrap_or_default();
            let description = attribute(element, "description").unwrap_or_default();
            return Err(IndexerError::Network(format!(
                "Torznab error {}: {}",
                code, description
            )));
        }
        "torznab:attr" | "newznab:attr" => {
            if let (Some(item), Some(attr_name), Some(value)) = (
                current.as_mut(),
                attribute(element, "name"),
                attribute(element, "value"),
            ) {
                item.set_attr(&attr_name, value);
            }
        }
        "enclosure" => {
            if let Some(item) = current.as_mut() {
                item.enclosure = attribute(element, "url");
                if item.size.is_none() {
                    item.size = attribute(element, "length").and_then(|l| l.parse().ok());
                }
            }
        }
        _ => {}
    }
    Ok(())
}

fn parse_xml(xml: &str, indexer: &str) -> Result<Vec<TorrentResult>, IndexerError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut results = Vec::new();
    let mut current: Option<XmlItem> = None;
    let mut current_tag = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                current_tag = element_name(e);
                open_element(e, &mut current)?;
            }
            Ok(Event::Empty(ref e)) => open_element(e, &mut current)?,
            Ok(Event::Text(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = e
                        .unescape()
                        .map_err(|err| IndexerError::Parse(err.to_string()))?
                        .into_owned();
                    if !text.is_empty() {
                        item.set_text(&current_tag, text);
                    }
                }
            }
            Ok(Event::CData(ref e)) => {
                if let Some(item) = current.as_mut() {
                    let text = String::from_utf8_lossy(&e[..]).trim().to_string();
                    if !text.is_empty() {
                        item.set_text(&current_tag, text);
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                if e.name().as_ref() == b"item" {
                    if let Some(result) = current.take().and_then(|item| item.into_result(indexer))
                    {
                        results.push(result);
                    }
                }
                current_tag.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(IndexerError::Parse(format!("XML parse error: {}", e))),
            _ => {}
        }
    }

    Ok(results)
}

/// One result in any of the JSON shapes (Prowlarr camelCase, Jackett
/// PascalCase, snake_case).
#[derive(Debug, Deserialize)]
struct JsonItem {
    #[serde(default, alias = "Title")]
    title: Option<String>,
    #[serde(default, alias = "Size", deserialize_with = "lenient_u64")]
    size: u64,
    #[serde(default, alias = "Seeders", deserialize_with = "lenient_opt_u32")]
    seeders: Option<u32>,
    #[serde(default, alias = "Leechers", deserialize_with = "lenient_opt_u32")]
    leechers: Option<u32>,
    #[serde(default, alias = "Peers", deserialize_with = "lenient_opt_u32")]
    peers: Option<u32>,
    #[serde(
        default,
        rename = "infoHash",
        alias = "InfoHash",
        alias = "info_hash",
        alias = "infohash"
    )]
    info_hash: Option<String>,
    #[serde(
        default,
        rename = "magnetUrl",
        alias = "MagnetUri",
        alias = "magnetUri",
        alias = "magnet_uri",
        alias = "magneturl"
    )]
    magnet: Option<String>,
    #[serde(default, rename = "downloadUrl", alias = "Link", alias = "link")]
    link: Option<String>,
    #[serde(default, alias = "Guid")]
    guid: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonEnvelope {
    List(Vec<serde_json::Value>),
    Wrapped {
        #[serde(alias = "Results")]
        results: Vec<serde_json::Value>,
    },
}

fn parse_json(body: &str, indexer: &str) -> Result<Vec<TorrentResult>, IndexerError> {
    let items = match decode_json::<JsonEnvelope>(body)? {
        JsonEnvelope::List(items) => items,
        JsonEnvelope::Wrapped { results } => results,
    };
    Ok(decode_rows::<JsonItem>(items)
        .into_iter()
        .filter_map(|item| {
            let seeders = item.seeders.unwrap_or(0);
            let leechers = item
                .leechers
                .unwrap_or_else(|| item.peers.unwrap_or(0).saturating_sub(seeders));
            let magnet = item
                .magnet
                .into_iter()
                .chain(item.link)
                .chain(item.guid)
                .find(|candidate| candidate.trim_start().starts_with("magnet:"));
            RawRelease {
                info_hash: item.info_hash,
                magnet_uri: magnet,
                title: item.title.unwrap_or_default(),
                size_bytes: item.size,
                seeders,
                leechers,
            }
            .into_result(indexer)
        })
        .collect())
}
