//! EZTV backend: paginated TV lookups by IMDb id.

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::release::{episode, EpisodeContext};

use super::de::{decode_rows, lenient_opt_u32, lenient_u32, lenient_u64};
use super::hash::RawRelease;
use super::http::{join_url, HttpFetcher, HttpSettings};
use super::types::{
    IndexerClient, IndexerConfig, IndexerError, MediaType, SearchRequest, TorrentResult,
};

pub(crate) const PAGE_SIZE: usize = 100;
pub(crate) const MAX_PAGES: u32 = 3;

#[derive(Debug, Deserialize)]
struct EztvPage {
    #[serde(default)]
    torrents: Option<Vec<serde_json::Value>>,
}

#[derive(Debug, Deserialize)]
struct EztvTorrent {
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    filename: Option<String>,
    #[serde(default)]
    magnet_url: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    season: Option<u32>,
    #[serde(default, deserialize_with = "lenient_opt_u32")]
    episode: Option<u32>,
    #[serde(default, deserialize_with = "lenient_u32")]
    seeds: u32,
    #[serde(default, deserialize_with = "lenient_u32")]
    peers: u32,
    #[serde(default, deserialize_with = "lenient_u64")]
    size_bytes: u64,
}

impl EztvTorrent {
    fn display_title(&self) -> String {
        self.title
            .as_deref()
            .filter(|t| !t.trim().is_empty())
            .or(self.filename.as_deref())
            .unwrap_or_default()
            .to_string()
    }

    /// Explicit season/episode fields win; otherwise the title token decides.
    fn is_episode(&self, ctx: EpisodeContext) -> bool {
        match (self.season, self.episode) {
            (Some(season), Some(episode)) if season > 0 || episode > 0 => {
                season == ctx.season && episode == ctx.episode
            }
            _ => episode::matches(&self.display_title(), ctx.season, ctx.episode),
        }
    }
}

pub struct EztvClient {
    name: String,
    api_url: String,
    http: HttpFetcher,
}

/// Strip an optional `tt` prefix; `None` unless the rest is numeric.
pub(crate) fn imdb_digits(id: &str) -> Option<&str> {
    let id = id.trim();
    let digits = id.strip_prefix("tt").unwrap_or(id);
    (!digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())).then_some(digits)
}

impl EztvClient {
    pub fn new(config: &IndexerConfig, settings: &HttpSettings) -> Result<Self, IndexerError> {
        let base = config
            .trimmed_base_url()
            .or(config.indexer_type.default_base_url())
            .ok_or_else(|| IndexerError::InvalidConfiguration("missing base URL".into()))?;
        Ok(Self {
            name: config.name.clone(),
            api_url: join_url(base, &config.endpoint_path),
            http: HttpFetcher::new(&config.name, settings)?,
        })
    }

    fn page_url(&self, imdb_id: &str, page: u32) -> String {
        format!(
            "{}?imdb_id={}&limit={}&page={}",
            self.api_url, imdb_id, PAGE_SIZE, page
        )
    }

    async fn fetch_show(
        &self,
        imdb_id: &str,
        target: Option<EpisodeContext>,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        let mut collected = Vec::new();
        for page in 1..=MAX_PAGES {
            let body: EztvPage = self.http.get_json(&self.page_url(imdb_id, page), &[]).await?;
            let torrents = body.torrents.unwrap_or_default();
            let full_page = torrents.len() >= PAGE_SIZE;

            collected.extend(
                decode_rows::<EztvTorrent>(torrents)
                    .into_iter()
                    .filter(|t| target.is_none_or(|ctx| t.is_episode(ctx)))
                    .filter_map(|t| {
                        let title = t.display_title();
                        RawRelease {
                            info_hash: t.hash,
                            magnet_uri: t.magnet_url,
                            title,
                            size_bytes: t.size_bytes,
                            seeders: t.seeds,
                            leechers: t.peers,
                        }
                        .into_result(&self.name)
                    }),
            );

            if !full_page {
                break;
            }
        }
        debug!(indexer = %self.name, results = collected.len(), "EZTV search complete");
        Ok(collected)
    }
}

#[async_trait]
impl IndexerClient for EztvClient {
    fn name(&self) -> &str {
        &self.name
    }

    async fn search(&self, request: &SearchRequest) -> Result<Vec<TorrentResult>, IndexerError> {
        if request.media_type == MediaType::Movie {
            return Ok(Vec::new());
        }
        let Some(imdb_id) = imdb_digits(&request.title_id) else {
            return Ok(Vec::new());
        };
        self.fetch_show(imdb_id, request.episode_context()).await
    }

    async fn search_by_query(
        &self,
        query: &str,
        media_type: MediaType,
    ) -> Result<Vec<TorrentResult>, IndexerError> {
        if media_type == MediaType::Movie {
            return Ok(Vec::new());
        }
        // The API only supports id lookups.
        match imdb_digits(query) {
            Some(imdb_id) => self.fetch_show(imdb_id, None).await,
            None => Ok(Vec::new()),
        }
    }

    async fn health_check(&self) -> Result<(), IndexerError> {
        self.http
            .get_text(&format!("{}?limit=1&page=1", self.api_url), &[])
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indexer::IndexerType;

    #[test]
    fn test_imdb_digits() {
        assert_eq!(imdb_digits("tt0944947"), Some("0944947"));
        assert_eq!(imdb_digits("0944947"), Some("0944947"));
        assert_eq!(imdb_digits("game of thrones"), None);
        assert_eq!(imdb_digits("tt"), None);
    }

    #[test]
    fn test_page_url() {
        let config = IndexerConfig::new("eztv", "EZTV", IndexerType::Eztv)
            .with_base_url("https://eztv.example");
        let client = EztvClient::new(&config, &HttpSettings::default()).unwrap();
        assert_eq!(
            client.page_url("0944947", 2),
            "https://eztv.example/api/get-torrents?imdb_id=0944947&limit=100&page=2"
        );
    }

    #[test]
    fn test_episode_fields_take_precedence() {
        let torrent: EztvTorrent = serde_json::from_str(
            r#"{"title":"Show S01E05 720p","season":"1","episode":"6"}"#,
        )
        .unwrap();
        assert!(torrent.is_episode(EpisodeContext::new(1, 6)));
        assert!(!torrent.is_episode(EpisodeContext::new(1, 5)));
    }

    #[test]
    fn test_missing_fields_fall_back_to_title() {
        let torrent: EztvTorrent =
            serde_json::from_str(r#"{"filename":"Show.S02E03.1080p.mkv","season":"0","episode":"0"}"#)
                .unwrap();
        assert_eq!(torrent.display_title(), "Show.S02E03.1080p.mkv");
        assert!(torrent.is_episode(EpisodeContext::new(2, 3)));
    }
}
