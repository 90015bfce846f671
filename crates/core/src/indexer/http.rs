//! Shared HTTP plumbing for backends.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::debug;

use super::types::IndexerError;

/// Per-backend HTTP client settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpSettings {
    pub timeout: Duration,
    pub user_agent: String,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(15),
            user_agent: concat!("indexhub/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

/// A reqwest client bound to one backend, with its own timeout.
#[derive(Debug, Clone)]
pub(crate) struct HttpFetcher {
    client: Client,
    indexer: String,
}

impl HttpFetcher {
    pub fn new(indexer: &str, settings: &HttpSettings) -> Result<Self, IndexerError> {
        let client = Client::builder()
            .timeout(settings.timeout)
            .user_agent(settings.user_agent.as_str())
            .build()
            .map_err(|e| {
                IndexerError::InvalidConfiguration(format!("Failed to create HTTP client: {}", e))
            })?;
        Ok(Self {
            client,
            indexer: indexer.to_string(),
        })
    }

    /// GET `url` and return the body of a 2xx response.
    pub async fn get_text(
        &self,
        url: &str,
        headers: &[(&'static str, &str)],
    ) -> Result<String, IndexerError> {
        debug!(indexer = %self.indexer, url = %redact_url(url), "Requesting backend");

        let response = self
            .client
            .get(url)
            .headers(header_map(headers)?)
            .send()
            .await
            .map_err(map_request_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(IndexerError::HttpStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        response.text().await.map_err(map_request_error)
    }

    /// GET `url` and decode a JSON body.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        headers: &[(&'static str, &str)],
    ) -> Result<T, IndexerError> {
        let body = self.get_text(url, headers).await?;
        decode_json(&body)
    }
}

pub(crate) fn decode_json<T: DeserializeOwned>(body: &str) -> Result<T, IndexerError> {
    serde_json::from_str(body).map_err(|e| IndexerError::Parse(e.to_string()))
}

fn header_map(headers: &[(&'static str, &str)]) -> Result<HeaderMap, IndexerError> {
    let mut map = HeaderMap::with_capacity(headers.len());
    for &(name, value) in headers {
        let value = HeaderValue::from_str(value).map_err(|_| {
            IndexerError::InvalidConfiguration(format!("Invalid value for header {}", name))
        })?;
        map.insert(HeaderName::from_static(name), value);
    }
    Ok(map)
}

fn map_request_error(e: reqwest::Error) -> IndexerError {
    if e.is_timeout() {
        IndexerError::Timeout
    } else if e.is_decode() || e.is_body() {
        IndexerError::Parse(e.to_string())
    } else {
        IndexerError::Network(e.to_string())
    }
}

/// Mask secret query parameters before a URL reaches the logs.
pub(crate) fn redact_url(url: &str) -> String {
    let Some((base, query)) = url.split_once('?') else {
        return url.to_string();
    };
    let params: Vec<String> = query
        .split('&')
        .map(|param| match param.split_once('=') {
            Some((key, _)) if key.eq_ignore_ascii_case("apikey") => format!("{}=***", key),
            _ => param.to_string(),
        })
        .collect();
    format!("{}?{}", base, params.join("&"))
}

/// Join a base URL and a path with exactly one slash between them.
pub(crate) fn join_url(base: &str, path: &str) -> String {
    let base = base.trim_end_matches('/');
    let path = path.trim();
    if path.is_empty() {
        base.to_string()
    } else if path.starts_with('/') {
        format!("{}{}", base, path)
    } else {
        format!("{}/{}", base, path)
    }
}
