//! YTS backend: movie lookups tried across an ordered mirror list.

use async_trait::async_trait;
use serde::Deserialize;
use std::future::Future;
use tracing::{debug, warn};

use super::de::{lenient_u32, lenient_u64, lenient_vec};
use super::hash::RawRelease;
use super::http::{join_url, HttpFetcher, HttpSettings};
use super::registry::find_default;
use super::types::{
    IndexerClient, IndexerConfig, IndexerError, MediaType, SearchRequest, TorrentResult,
};

pub const DEFAULT_MIRRORS: &[&str] = &["https://yts.mx", "https://yts.lt", "https://yts.am"];

const RESULT_LIMIT: u32 = 20;

#[derive(Debug, Deserialize)]
struct YtsResponse {
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    status_message: Option<String>,
    #[serde(default)]
    data: Option<YtsData>,
}

#[derive(Debug, Deserialize)]
struct YtsData {
    #[serde(default, deserialize_with = "lenient_vec")]
    movies: Vec<YtsMovie>,
}

#[derive(Debug, Deserialize)]
struct YtsMovie {
    #[serde(default)]
    title: String,
    #[serde(default)]
    title_long: Option<String>,
    #[serde(default, deserialize_with = "lenient_vec")]
    torrents: Vec<YtsTorrent>,
}

#[derive(Debug, Deserialize)]
struct YtsTorrent {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    quality: String,
    #[serde(default, rename = "type")]
    kind: String,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeds: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    peers: u32,
    #[serde(default, deserialize_with = "lenient_u64")]
    size_bytes: u64,
}

fn release_title(movie: &YtsMovie, torrent: &YtsTorrent) -> String {
    let name = movie
        .title_long
        .as_deref()
        .filter(|t| !t.is_empty())
        .unwrap_or(&movie.title);
    let mut title = name.to_string();
    if !torrent.quality.is_empty() {
        title.push_str(&format!(" [{}]", torrent.quality));
    }
    if !torrent.kind.is_empty() {
        title.push_str(&format!(" [{}]", torrent.kind));
    }
    title
}

/// Try `attempt` on each mirror in order.
///
/// The first non-empty answer wins. Cancellation is returned at once.
/// An empty answer is only returned when every mirror answered empty;
/// if any mirror failed and none had results, the last error is.
pub(crate) async fn try_mirrors<'a, F, Fut>(
    mirrors: &'a [String],
    mut attempt: F,
) -> Result<Vec<TorrentResult>, IndexerError>
where
    F: FnMut(&'a str) -> Fut,
    Fut: Future<Output = Result<Vec<TorrentResult>, IndexerError>>,
{
    let mut empty_answer: Option<Vec<TorrentResult>> = None;
    let mut last_error: Option<IndexerError> = None;

    for mirror in mirrors {
        match attempt(mirror).await {
            Ok(results) if !results.is_empty() => return Ok(results),
            Ok(results) => {
                debug!(mirror = %mirror, "YTS mirror returned no results");
                empty_answer = Some(results);
            }
            Err(e) if e.is_cancelled() => return Err(e),
            Err(e) => {
                warn!(mirror = %mirror, error = %e, "YTS mirror failed");
                last_error = Some(e);
            }
        }
    }

    match (empty_answer, last_error) {
        (_, Some(e)) => Err(e),
        (Some(results), None) => Ok(results),
        (None, None) => Ok(Vec::new()),
    }
}

pub struct YtsClient {
    name: String,
    mirrors: Vec<String>,
    endpoint_path: String,
    http: HttpFetcher,
}

impl YtsClient {
    /// A user-set base URL is tried before `mirrors`. The built-in entry's
    /// stock base is not, so the mirror list alone decides its order.
    pub fn new(
        config: &IndexerConfig,
        settings: &HttpSettings,
        mirrors: &[String],
    ) -> Result<Self, IndexerError> {
        let stock_base = find_default(&config.id).map(|entry| entry.base_url);
        let mut ordered: Vec<String> = Vec::with_capacity(mirrors.len() + 1);
        if let Some(base) = config
            .trimmed_base_url()
            .filter(|base| Some(*base) != stock_base)
        {
            ordered.push(base.to_string());
        }
        for mirror in mirrors {
            let mirror = mirror.trim().trim_end_matches('/');
            if !mirror.is_empty() && !ordered.iter().any(|m| m == mirror) {
                ordered.push(mirror.to_string());
            }
        }
        if ordered.is_empty() {
            return Err(IndexerError::InvalidConfiguration(
                "no YTS mirrors configured".into(),
            ));
        }
        Ok(Self {
            name: config.name.clone(),
            mirrors: ordered,
            endpoint_path: config.endpoint_path.clone(),
            http: HttpFetcher::new(&config.name, settings)?,
        })
    }

    pub fn mirrors(&self) -> &[String] {
        &self.mirrors
    }

    fn search_url(&self, mirror: &str, term: &str) -> String {
        format!(
            "{}?query_term={}&limit={}",
            join_url(mirror, &self.endpoint_path),
            urlencoding::encode(term),
            RESULT_LIMIT
        )
    }

    async fn query_mirror(
        &self,
        mirror: &str,
        term: &str,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        let response: YtsResponse = self
            .http
            .get_json(&self.search_url(mirror, term), &[])
            .await?;

        if let Some(status) = response.status.as_deref() {
            if !status.eq_ignore_ascii_case("ok") {
                return Err(IndexerError::Network(format!(
                    "YTS API error: {}",
                    response.status_message.unwrap_or_default()
                )));
            }
        }

        let movies = response.data.map(|d| d.movies).unwrap_or_default();
        Ok(movies
            .iter()
            .flat_map(|movie| {
                movie.torrents.iter().filter_map(move |torrent| {
                    RawRelease {
                        info_hash: torrent.hash.clone(),
                        title: release_title(movie, torrent),
                        size_bytes: torrent.size_bytes,
                        seeders: torrent.seeds,
                        leechers: torrent.peers,
                        ..Default::default()
                    }
                    .into_result(&self.name)
                })
            })
            .collect())
    }

    async fn search_term(&self, term: &str) -> Result<Vec<TorrentResult>, IndexerError> {
        try_mirrors(&self.mirrors, |mirror| self.query_mirror(mirror, term)).await
    }
}

#[async_trait]
impl IndexerClient for YtsClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        if request.media_type == MediaType::Series {
            return Ok(Vec::new());
        }
        self.search_term(&request.title_id).await
    }

    async fn search_by_query(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        if media_type == MediaType::Series {
            return Ok(Vec::new());
        }
        self.search_term(query).await
    }

    async fn health_check(&self) -> Result<(), IndexerError> {
        let mirror = self
            .mirrors
            .first()
            .ok_or_else(|| IndexerError::InvalidConfiguration("no YTS mirrors configured".into()))?;
        let url = format!("{}?limit=1", join_url(mirror, &self.endpoint_path));
        self.http.get_text(&url, &[]).await.map(|_| ())
    }
}
