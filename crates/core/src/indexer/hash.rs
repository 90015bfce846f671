//! Info-hash normalization and magnet handling.
//!
//! Every backend funnels its records through [`RawRelease::into_result`] so
//! that a result only exists when it carries a valid, non-zero 40-char hex
//! hash and a magnet URI.

use sha2::{Digest, Sha256};

use super::types::TorrentResult;

const PUBLIC_TRACKERS: &[&str] = &[
    "udp://tracker.opentrackr.org:1337/announce",
    "udp://open.demonii.com:1337/announce",
    "udp://tracker.openbittorrent.com:6969/announce",
    "udp://exodus.desync.com:6969/announce",
    "udp://tracker.torrent.eu.org:451/announce",
];

/// Normalize a raw info hash into 40 lower-case hex chars.
///
/// Accepts hex (40 chars, any case) and base32 (32 chars). Rejects the
/// all-zero placeholder some APIs use for "no results".
pub fn normalize_info_hash(raw: &str) -> Option<String> {
    let raw = raw.trim();
    let hash = match raw.len() {
        40 if raw.chars().all(|c| c.is_ascii_hexdigit()) => raw.to_ascii_lowercase(),
        32 => hex::encode(decode_base32(raw)?),
        _ => return None,
    };
    if hash.bytes().all(|b| b == b'0') {
        return None;
    }
    Some(hash)
}

fn decode_base32(input: &str) -> Option<Vec<u8>> {
    let mut out = Vec::with_capacity(input.len() * 5 / 8);
    let mut buffer: u32 = 0;
    let mut bits: u32 = 0;
    for c in input.chars() {
        let value = match c.to_ascii_uppercase() {
            c @ 'A'..='Z' => c as u32 - 'A' as u32,
            c @ '2'..='7' => c as u32 - '2' as u32 + 26,
            _ => return None,
        };
        buffer = (buffer << 5) | value;
        bits += 5;
        if bits >= 8 {
            bits -= 8;
            out.push((buffer >> bits) as u8);
            buffer &= (1 << bits) - 1;
        }
    }
    Some(out)
}

/// Extract and normalize the `xt=urn:btih:` hash of a magnet URI.
pub fn info_hash_from_magnet(magnet: &str) -> Option<String> {
    let (_, query) = magnet.trim().split_once('?')?;
    query.split('&').find_map(|param| {
        let (key, value) = param.split_once('=')?;
        if !key.eq_ignore_ascii_case("xt") {
            return None;
        }
        let value = value.to_ascii_lowercase();
        let hash = value
            .strip_prefix("urn:btih:")
            .or_else(|| value.strip_prefix("urn%3abtih%3a"))?;
        normalize_info_hash(hash)
    })
}

/// Build a magnet URI for the hash with a display name and public trackers.
pub fn build_magnet(info_hash: &str, title: &str) -> String {
    let mut magnet = format!(
        "magnet:?xt=urn:btih:{}&dn={}",
        info_hash,
        urlencoding::encode(title)
    );
    for tracker in PUBLIC_TRACKERS {
        magnet.push_str("&tr=");
        magnet.push_str(&urlencoding::encode(tracker));
    }
    magnet
}

/// Stable pseudo-hash for a direct URL: first 20 bytes of its SHA-256.
pub fn synthesize_hash_from_url(url: &str) -> String {
    let digest = Sha256::digest(url.as_bytes());
    hex::encode(&digest[..20])
}

/// A backend record before validation.
#[derive(Debug, Clone, Default)]
pub(crate) struct RawRelease {
    pub info_hash: Option<String>,
    pub magnet_uri: Option<String>,
    pub title: String,
    pub size_bytes: u64,
    pub seeders: u32,
    pub leechers: u32,
}

impl RawRelease {
    /// Validate and classify. Returns `None` for records without a usable
    /// hash or title.
    pub fn into_result(self, indexer_name: &str) -> Option<TorrentResult> {
        let title = self.title.trim();
        if title.is_empty() {
            return None;
        }
        let magnet = self
            .magnet_uri
            .as_deref()
            .map(str::trim)
            .filter(|m| m.starts_with("magnet:"));
        let info_hash = self
            .info_hash
            .as_deref()
            .and_then(normalize_info_hash)
            .or_else(|| magnet.and_then(info_hash_from_magnet))?;

        let magnet_uri = match magnet {
            Some(m) => m.to_string(),
            None => build_magnet(&info_hash, title),
        };

        let mut result = TorrentResult::new(info_hash, title, indexer_name);
        result.size_bytes = self.size_bytes;
        result.seeders = self.seeders;
        result.leechers = self.leechers;
        result.magnet_uri = Some(magnet_uri);
        Some(result)
    }
}
