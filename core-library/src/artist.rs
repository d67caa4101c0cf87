//! # Album Artist Resolution
//!
//! Decides the canonical artist of an album from its tags.
//!
//! ## Overview
//!
//! Resolution is a pure function of four inputs: the explicit album-artist
//! tag, whether any track is flagged as a compilation, the per-track artists
//! and a name derived from the folder layout. The decision order is:
//!
//! 1. A non-empty explicit album-artist tag wins.
//! 2. With no usable track artists, the folder name, else `"Unknown Artist"`.
//! 3. A compilation is `"Various Artists"`.
//! 4. An artist holding at least the majority share of tracks wins.
//! 5. Enough distinct artists without a majority is `"Various Artists"`.
//! 6. Otherwise the most frequent artist.
//!
//! All names pass through [`normalize_artist_delimiters`] first, so
//! `"A / B"`, `"A;B"` and `"A, B"` count as the same artist.
//!
//! Ties in "most frequent" go to the artist that appears first in track
//! order. A two-artist 50/50 split therefore resolves to the first one.

use core_runtime::config::{
    ArtistHeuristicsConfig, DEFAULT_MAJORITY_SHARE, DEFAULT_VARIOUS_MIN_DISTINCT,
};

pub const UNKNOWN_ARTIST: &str = "Unknown Artist";
pub const VARIOUS_ARTISTS: &str = "Various Artists";

/// Tunable thresholds for [`ArtistHeuristics::choose_album_artist`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtistHeuristics {
    /// Share of tracks an artist needs for the majority rule
    pub majority_share: f64,
    /// Distinct artists at which a majority-less album is a compilation
    pub various_min_distinct: usize,
}

impl Default for ArtistHeuristics {
    fn default() -> Self {
        Self {
            majority_share: DEFAULT_MAJORITY_SHARE,
            various_min_distinct: DEFAULT_VARIOUS_MIN_DISTINCT,
        }
    }
}

impl From<ArtistHeuristicsConfig> for ArtistHeuristics {
    fn from(config: ArtistHeuristicsConfig) -> Self {
        Self {
            majority_share: config.majority_share,
            various_min_distinct: config.various_min_distinct,
        }
    }
}

impl ArtistHeuristics {
    /// Resolves the album artist.
    pub fn choose_album_artist<S: AsRef<str>>(
        &self,
        explicit: Option<&str>,
        is_compilation: bool,
        track_artists: &[S],
        folder_fallback: Option<&str>,
    ) -> String {
        if let Some(explicit) = explicit.map(normalize_artist_delimiters) {
            if !explicit.is_empty() {
                return explicit;
            }
        }

        let fallback = || {
            folder_fallback
                .map(normalize_artist_delimiters)
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| UNKNOWN_ARTIST.to_string())
        };

        let artists: Vec<String> = track_artists
            .iter()
            .map(|a| normalize_artist_delimiters(a.as_ref()))
            .filter(|a| !a.is_empty())
            .collect();

        if artists.is_empty() {
            return fallback();
        }

        if is_compilation {
            return VARIOUS_ARTISTS.to_string();
        }

        let counts = frequencies(&artists);
        let Some((top, top_count)) = most_frequent(&counts) else {
            return fallback();
        };

        let share = top_count as f64 / artists.len() as f64;
        if share >= self.majority_share {
            return top.to_string();
        }

        if counts.len() >= self.various_min_distinct {
            return VARIOUS_ARTISTS.to_string();
        }

        top.to_string()
    }
}

/// Resolves the album artist with the default thresholds.
pub fn choose_album_artist<S: AsRef<str>>(
    explicit: Option<&str>,
    is_compilation: bool,
    track_artists: &[S],
    folder_fallback: Option<&str>,
) -> String {
    ArtistHeuristics::default().choose_album_artist(
        explicit,
        is_compilation,
        track_artists,
        folder_fallback,
    )
}

/// Rewrites artist separators into a canonical `", "` form.
///
/// `" / "`, `"/"` and `";"` become commas, empty segments left by doubled
/// separators are dropped, and runs of whitespace collapse to one space.
/// Applying it twice yields the same string as applying it once.
pub fn normalize_artist_delimiters(name: &str) -> String {
    name.replace(['/', ';'], ",")
        .split(',')
        .map(|part| part.split_whitespace().collect::<Vec<_>>().join(" "))
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

// Counts in first-appearance order.
fn frequencies(artists: &[String]) -> Vec<(&str, usize)> {
    let mut counts: Vec<(&str, usize)> = Vec::new();
    for artist in artists {
        match counts.iter_mut().find(|(name, _)| *name == artist.as_str()) {
            Some((_, count)) => *count += 1,
            None => counts.push((artist.as_str(), 1)),
        }
    }
    counts
}

fn most_frequent<'a>(counts: &[(&'a str, usize)]) -> Option<(&'a str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for &(name, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((name, count));
        }
    }
    best
}
