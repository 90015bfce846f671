//! Merge pipeline for fan-out results: dedup, rank, episode filter.

use std::cmp::Ordering;
use std::collections::HashMap;

use crate::release::{episode, EpisodeContext};

use super::types::TorrentResult;

/// Keep one result per info hash.
///
/// The survivor is the copy with the most seeders; on a tie the first
/// seen wins. Survivors keep the slot of the first occurrence of their hash.
pub fn deduplicate(results: Vec<TorrentResult>) -> Vec<TorrentResult> {
    let mut slots: HashMap<String, usize> = HashMap::with_capacity(results.len());
    let mut unique: Vec<TorrentResult> = Vec::with_capacity(results.len());

    for result in results {
        let key = result.info_hash.to_lowercase();
        match slots.get(&key) {
            Some(&slot) => {
                if result.seeders > unique[slot].seeders {
                    unique[slot] = result;
                }
            }
            None => {
                slots.insert(key, unique.len());
                unique.push(result);
            }
        }
    }

    unique
}

/// Cached first, then quality descending, then seeders descending.
pub fn rank(a: &TorrentResult, b: &TorrentResult) -> Ordering {
    b.cached()
        .cmp(&a.cached())
        .then_with(|| b.quality.cmp(&a.quality))
        .then_with(|| b.seeders.cmp(&a.seeders))
}

/// Stable sort by [`rank`].
pub fn sort_results(results: &mut [TorrentResult]) {
    results.sort_by(rank);
}

/// Drop results whose title is not exactly the target episode.
pub fn filter_episode(results: &mut Vec<TorrentResult>, target: EpisodeContext) {
    results.retain(|r| episode::matches(&r.title, target.season, target.episode));
}

/// Dedup the whole candidate pool, sort it, then apply the episode filter.
pub fn merge(results: Vec<TorrentResult>, target: Option<EpisodeContext>) -> Vec<TorrentResult> {
    let mut merged = deduplicate(results);
    sort_results(&mut merged);
    if let Some(target) = target {
        filter_episode(&mut merged, target);
    }
    merged
}
