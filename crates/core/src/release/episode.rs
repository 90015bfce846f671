//! Season/episode token extraction and matching.

use once_cell::sync::Lazy;
use regex_lite::Regex;

/// Season and episode numbers extracted from a string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EpisodeContext {
    pub season: u32,
    pub episode: u32,
}

impl EpisodeContext {
    pub fn new(season: u32, episode: u32) -> Self {
        Self { season, episode }
    }
}

// S02E05, s2 e05, S02 E105
static SXXEXX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])s\s*(\d{1,2})\s*e\s*(\d{1,3})(?:[^0-9]|$)")
        .expect("episode pattern is valid")
});

// 2x05, 12x105
static NXNN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(?:^|[^a-z0-9])(\d{1,2})x(\d{2,3})(?:[^0-9]|$)")
        .expect("episode pattern is valid")
});

// "Season 2 Episode 5", "season 2 - episode 5"
static VERBOSE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)season\s*(\d{1,3}).{0,20}?episode\s*(\d{1,4})")
        .expect("episode pattern is valid")
});

fn capture(re: &Regex, text: &str) -> Option<EpisodeContext> {
    let caps = re.captures(text)?;
    let season = caps.get(1)?.as_str().parse().ok()?;
    let episode = caps.get(2)?.as_str().parse().ok()?;
    Some(EpisodeContext { season, episode })
}

/// Extract an episode context from a user's free-text query.
///
/// Only the compact `S##E###` and `##x###` forms are recognized here.
pub fn extract_from_query(query: &str) -> Option<EpisodeContext> {
    capture(&SXXEXX, query).or_else(|| capture(&NXNN, query))
}

/// Extract an episode context from a release title.
///
/// Tries `S##E###`, then `##x###`, then the verbose "season N ... episode M"
/// form (at most 20 characters between the two words). The first pattern
/// that matches wins.
pub fn extract_from_title(title: &str) -> Option<EpisodeContext> {
    extract_from_query(title).or_else(|| capture(&VERBOSE, title))
}

/// Whether `title` carries exactly the given season and episode.
///
/// A title without a recognizable token never matches.
pub fn matches(title: &str, season: u32, episode: u32) -> bool {
    extract_from_title(title) == Some(EpisodeContext { season, episode })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_sxxexx() {
        assert!(matches("Show.Name.S02E05.1080p", 2, 5));
        assert!(!matches("Show.Name.S02E06.1080p", 2, 5));
        assert!(!matches("Show.Name.S03E05.1080p", 2, 5));
    }

    #[test]
    fn test_matches_x_form() {
        assert!(matches("Show.Name.2x05", 2, 5));
        assert!(matches("Show Name 12x105 HDTV", 12, 105));
        assert!(!matches("Show.Name.2x06", 2, 5));
    }

    #[test]
    fn test_no_token_never_matches() {
        assert!(!matches("Movie.2020.1080p.BluRay", 1, 1));
        assert!(!matches("", 0, 0));
        assert_eq!(extract_from_title("Show.Complete.Series"), None);
    }

    #[test]
    fn test_resolution_is_not_an_episode() {
        assert_eq!(extract_from_title("Movie.1920x1080.mkv"), None);
        assert_eq!(extract_from_query("Movie 1280x720"), None);
    }

    #[test]
    fn test_whitespace_between_letters() {
        assert_eq!(
            extract_from_query("show name s 2 e 5"),
            Some(EpisodeContext::new(2, 5))
        );
        assert_eq!(
            extract_from_query("Show S02 E05"),
            Some(EpisodeContext::new(2, 5))
        );
    }

    #[test]
    fn test_first_pattern_wins() {
        // Both forms present; the S/E token is taken.
        assert_eq!(
            extract_from_title("Show.S01E02.aka.3x04"),
            Some(EpisodeContext::new(1, 2))
        );
    }

    #[test]
    fn test_verbose_is_title_only() {
        let title = "Show Name Season 2 Episode 5 720p";
        assert_eq!(extract_from_title(title), Some(EpisodeContext::new(2, 5)));
        assert_eq!(extract_from_query(title), None);
        assert!(matches(title, 2, 5));
    }

    #[test]
    fn test_verbose_window_is_bounded() {
        let title = "Season 2 and a very long digression here Episode 5";
        assert_eq!(extract_from_title(title), None);
    }

    #[test]
    fn test_sxxexx_inside_word_is_ignored() {
        assert_eq!(extract_from_title("Notes01e02"), None);
    }
}
