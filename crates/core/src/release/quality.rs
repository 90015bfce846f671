//! Release title classification.
//!
//! Infers resolution, codec, audio, source and HDR tier from a free-text
//! release title. Each parser lower-cases the title and walks an ordered
//! signature table where the first hit wins, so more specific signatures
//! are listed before the generic ones they contain.

use serde::{Deserialize, Serialize};
use std::fmt;

/// How a signature is matched against a lower-cased title.
#[derive(Debug, Clone, Copy)]
enum Signature {
    /// Plain substring.
    Substr(&'static str),
    /// Standalone token: the characters around the hit must not be
    /// alphanumeric ("ts" matches `Movie.TS.x264`, not `Monsters`).
    Token(&'static str),
}

use Signature::{Substr, Token};

impl Signature {
    fn is_match(self, haystack: &str) -> bool {
        match self {
            Substr(needle) => haystack.contains(needle),
            Token(token) => contains_token(haystack, token),
        }
    }
}

/// Whether `token` appears in `haystack` delimited by non-alphanumerics.
pub(crate) fn contains_token(haystack: &str, token: &str) -> bool {
    haystack.match_indices(token).any(|(start, hit)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + hit.len()..].chars().next();
        !before.is_some_and(|c| c.is_alphanumeric()) && !after.is_some_and(|c| c.is_alphanumeric())
    })
}

fn classify<T: Copy>(title: &str, table: &[(Signature, T)], fallback: T) -> T {
    let lowered = title.to_lowercase();
    table
        .iter()
        .find(|(signature, _)| signature.is_match(&lowered))
        .map(|(_, value)| *value)
        .unwrap_or(fallback)
}

/// Video resolution tier.
///
/// Variants are declared worst-to-best so the derived `Ord` is the ranking
/// used when sorting results (4K > 1080p > 720p > 480p > SD > unknown).
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum VideoQuality {
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
    #[serde(rename = "sd")]
    Sd,
    #[serde(rename = "480p")]
    P480,
    #[serde(rename = "720p")]
    P720,
    #[serde(rename = "1080p")]
    P1080,
    #[serde(rename = "4k")]
    Uhd4k,
}

const QUALITY_SIGNATURES: &[(Signature, VideoQuality)] = &[
    (Substr("2160p"), VideoQuality::Uhd4k),
    (Token("4k"), VideoQuality::Uhd4k),
    (Token("uhd"), VideoQuality::Uhd4k),
    (Substr("1080p"), VideoQuality::P1080),
    (Substr("1080i"), VideoQuality::P1080),
    (Token("fhd"), VideoQuality::P1080),
    (Substr("720p"), VideoQuality::P720),
    (Substr("576p"), VideoQuality::P480),
    (Substr("480p"), VideoQuality::P480),
    (Substr("360p"), VideoQuality::Sd),
    (Token("sd"), VideoQuality::Sd),
    (Token("dvdrip"), VideoQuality::Sd),
    (Token("xvid"), VideoQuality::Sd),
];

impl VideoQuality {
    pub fn parse(title: &str) -> Self {
        classify(title, QUALITY_SIGNATURES, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Unknown => "unknown",
            Self::Sd => "sd",
            Self::P480 => "480p",
            Self::P720 => "720p",
            Self::P1080 => "1080p",
            Self::Uhd4k => "4k",
        }
    }
}

/// Video codec.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    Av1,
    Hevc,
    Avc,
    Vp9,
    Xvid,
    #[default]
    Unknown,
}

const CODEC_SIGNATURES: &[(Signature, VideoCodec)] = &[
    (Token("av1"), VideoCodec::Av1),
    (Substr("x265"), VideoCodec::Hevc),
    (Substr("h265"), VideoCodec::Hevc),
    (Substr("h.265"), VideoCodec::Hevc),
    (Token("hevc"), VideoCodec::Hevc),
    (Substr("x264"), VideoCodec::Avc),
    (Substr("h264"), VideoCodec::Avc),
    (Substr("h.264"), VideoCodec::Avc),
    (Token("avc"), VideoCodec::Avc),
    (Token("vp9"), VideoCodec::Vp9),
    (Token("xvid"), VideoCodec::Xvid),
    (Token("divx"), VideoCodec::Xvid),
];

impl VideoCodec {
    pub fn parse(title: &str) -> Self {
        classify(title, CODEC_SIGNATURES, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Av1 => "av1",
            Self::Hevc => "hevc",
            Self::Avc => "avc",
            Self::Vp9 => "vp9",
            Self::Xvid => "xvid",
            Self::Unknown => "unknown",
        }
    }
}

/// Audio track format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AudioFormat {
    Atmos,
    TrueHd,
    DtsX,
    DtsHd,
    Dts,
    Eac3,
    Ac3,
    Aac,
    Flac,
    Opus,
    Mp3,
    #[default]
    Unknown,
}

const AUDIO_SIGNATURES: &[(Signature, AudioFormat)] = &[
    (Token("atmos"), AudioFormat::Atmos),
    (Substr("truehd"), AudioFormat::TrueHd),
    (Substr("dts:x"), AudioFormat::DtsX),
    (Substr("dts-x"), AudioFormat::DtsX),
    (Token("dtsx"), AudioFormat::DtsX),
    (Substr("dts-hd"), AudioFormat::DtsHd),
    (Substr("dtshd"), AudioFormat::DtsHd),
    (Substr("dts-ma"), AudioFormat::DtsHd),
    (Token("dts"), AudioFormat::Dts),
    (Substr("ddp"), AudioFormat::Eac3),
    (Substr("dd+"), AudioFormat::Eac3),
    (Substr("eac3"), AudioFormat::Eac3),
    (Substr("e-ac-3"), AudioFormat::Eac3),
    (Substr("ac3"), AudioFormat::Ac3),
    (Substr("dd5.1"), AudioFormat::Ac3),
    (Substr("dd2.0"), AudioFormat::Ac3),
    (Substr("aac"), AudioFormat::Aac),
    (Substr("flac"), AudioFormat::Flac),
    (Token("opus"), AudioFormat::Opus),
    (Token("mp3"), AudioFormat::Mp3),
];

impl AudioFormat {
    pub fn parse(title: &str) -> Self {
        classify(title, AUDIO_SIGNATURES, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Atmos => "atmos",
            Self::TrueHd => "true_hd",
            Self::DtsX => "dts_x",
            Self::DtsHd => "dts_hd",
            Self::Dts => "dts",
            Self::Eac3 => "eac3",
            Self::Ac3 => "ac3",
            Self::Aac => "aac",
            Self::Flac => "flac",
            Self::Opus => "opus",
            Self::Mp3 => "mp3",
            Self::Unknown => "unknown",
        }
    }
}

/// Where the release was ripped from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceType {
    Remux,
    BluRay,
    WebDl,
    WebRip,
    Hdtv,
    Screener,
    Dvd,
    Telesync,
    Cam,
    #[default]
    Unknown,
}

const SOURCE_SIGNATURES: &[(Signature, SourceType)] = &[
    (Token("remux"), SourceType::Remux),
    (Substr("bluray"), SourceType::BluRay),
    (Substr("blu-ray"), SourceType::BluRay),
    (Token("bdrip"), SourceType::BluRay),
    (Token("brrip"), SourceType::BluRay),
    (Substr("web-dl"), SourceType::WebDl),
    (Token("webdl"), SourceType::WebDl),
    (Substr("webrip"), SourceType::WebRip),
    (Substr("web-rip"), SourceType::WebRip),
    (Token("web"), SourceType::WebDl),
    (Token("hdtv"), SourceType::Hdtv),
    (Token("pdtv"), SourceType::Hdtv),
    (Token("dvdscr"), SourceType::Screener),
    (Token("screener"), SourceType::Screener),
    (Token("scr"), SourceType::Screener),
    (Token("dvdrip"), SourceType::Dvd),
    (Token("dvd"), SourceType::Dvd),
    (Token("telesync"), SourceType::Telesync),
    (Token("hdts"), SourceType::Telesync),
    (Token("ts"), SourceType::Telesync),
    (Token("hdcam"), SourceType::Cam),
    (Token("camrip"), SourceType::Cam),
    (Token("cam"), SourceType::Cam),
];

impl SourceType {
    pub fn parse(title: &str) -> Self {
        classify(title, SOURCE_SIGNATURES, Self::Unknown)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Remux => "remux",
            Self::BluRay => "blu_ray",
            Self::WebDl => "web_dl",
            Self::WebRip => "web_rip",
            Self::Hdtv => "hdtv",
            Self::Screener => "screener",
            Self::Dvd => "dvd",
            Self::Telesync => "telesync",
            Self::Cam => "cam",
            Self::Unknown => "unknown",
        }
    }
}

/// High dynamic range tier. `Sdr` when nothing is advertised.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HdrFormat {
    DolbyVision,
    Hdr10Plus,
    Hdr10,
    Hlg,
    Hdr,
    #[default]
    Sdr,
}

const HDR_SIGNATURES: &[(Signature, HdrFormat)] = &[
    (Substr("dolby vision"), HdrFormat::DolbyVision),
    (Substr("dolby.vision"), HdrFormat::DolbyVision),
    (Substr("dolbyvision"), HdrFormat::DolbyVision),
    (Token("dovi"), HdrFormat::DolbyVision),
    (Token("dv"), HdrFormat::DolbyVision),
    (Substr("hdr10+"), HdrFormat::Hdr10Plus),
    (Substr("hdr10plus"), HdrFormat::Hdr10Plus),
    (Substr("hdr10"), HdrFormat::Hdr10),
    (Token("hlg"), HdrFormat::Hlg),
    (Token("hdr"), HdrFormat::Hdr),
];

impl HdrFormat {
    pub fn parse(title: &str) -> Self {
        classify(title, HDR_SIGNATURES, Self::Sdr)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DolbyVision => "dolby_vision",
            Self::Hdr10Plus => "hdr10_plus",
            Self::Hdr10 => "hdr10",
            Self::Hlg => "hlg",
            Self::Hdr => "hdr",
            Self::Sdr => "sdr",
        }
    }
}

macro_rules! impl_display {
    ($($ty:ty),*) => {
        $(impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        })*
    };
}

impl_display!(VideoQuality, VideoCodec, AudioFormat, SourceType, HdrFormat);

/// All classification axes for one title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReleaseInfo {
    pub quality: VideoQuality,
    pub codec: VideoCodec,
    pub audio_format: AudioFormat,
    pub source_type: SourceType,
    pub hdr_format: HdrFormat,
}

impl ReleaseInfo {
    pub fn parse(title: &str) -> Self {
        Self {
            quality: VideoQuality::parse(title),
            codec: VideoCodec::parse(title),
            audio_format: AudioFormat::parse(title),
            source_type: SourceType::parse(title),
            hdr_format: HdrFormat::parse(title),
        }
    }
}
