//! Metadata inference from unstructured release titles.

pub mod episode;
pub mod quality;

pub use episode::{extract_from_query, extract_from_title, EpisodeContext};
pub use quality::{AudioFormat, HdrFormat, ReleaseInfo, SourceType, VideoCodec, VideoQuality};
