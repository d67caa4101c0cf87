//! # Album Assembly
//!
//! Turns one album folder's raw tag records into an [`Album`].
//!
//! ## Overview
//!
//! Records are first put into playback order (disc, track number, title,
//! path). Every "first" below refers to that order:
//!
//! - title: album tag of the first track, else the folder name
//! - year: first original-release year, else first plain year, each reduced
//!   to its leading four digits when it starts with them
//! - artist: resolved by [`ArtistHeuristics`] from the first album-artist
//!   tag, any compilation flag, every track artist and the parent folder name
//! - a track with no artist inherits the album artist
//!
//! A folder with no records produces no album.

use crate::artist::ArtistHeuristics;
use crate::models::{Album, AlbumId, ExternalIds, RawTrack, Track, TrackId};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Builds albums for folders under one scan root.
#[derive(Debug, Clone)]
pub struct AlbumAssembler {
    root: PathBuf,
    heuristics: ArtistHeuristics,
}

impl AlbumAssembler {
    pub fn new(root: impl Into<PathBuf>, heuristics: ArtistHeuristics) -> Self {
        Self {
            root: root.into(),
            heuristics,
        }
    }

    /// Assembles the album for `folder`, or `None` when `raw_tracks` is empty.
    pub fn assemble(
        &self,
        folder: &Path,
        mut raw_tracks: Vec<RawTrack>,
        cover: Option<Vec<u8>>,
    ) -> Option<Album> {
        if raw_tracks.is_empty() {
            debug!(folder = %folder.display(), "No parseable tracks; skipping folder");
            return None;
        }

        raw_tracks.sort_by(RawTrack::playback_cmp);

        let title = first_non_empty(raw_tracks.first().map(|t| t.album.as_str()))
            .or_else(|| file_name(folder))
            .unwrap_or_default();

        let original_year = raw_tracks
            .iter()
            .find_map(|t| t.original_year.as_deref().and_then(normalize_year));
        let year = original_year
            .clone()
            .or_else(|| raw_tracks.iter().find_map(|t| t.year.as_deref().and_then(normalize_year)));

        let explicit = raw_tracks
            .iter()
            .find_map(|t| first_non_empty(t.album_artist.as_deref()));
        let is_compilation = raw_tracks.iter().any(|t| t.is_compilation);
        let track_artists: Vec<&str> = raw_tracks.iter().map(|t| t.artist.as_str()).collect();
        let folder_fallback = self.folder_fallback(folder);

        let artist = self.heuristics.choose_album_artist(
            explicit.as_deref(),
            is_compilation,
            &track_artists,
            folder_fallback.as_deref(),
        );

        let title_sort = raw_tracks
            .iter()
            .find_map(|t| first_non_empty(t.album_sort.as_deref()));
        let artist_sort = raw_tracks
            .iter()
            .find_map(|t| first_non_empty(t.album_artist_sort.as_deref()));

        let external_ids = ExternalIds {
            release_id: raw_tracks
                .iter()
                .find_map(|t| first_non_empty(t.external_ids.release_id.as_deref())),
            release_group_id: raw_tracks
                .iter()
                .find_map(|t| first_non_empty(t.external_ids.release_group_id.as_deref())),
            album_artist_id: raw_tracks
                .iter()
                .find_map(|t| first_non_empty(t.external_ids.album_artist_id.as_deref())),
            ..Default::default()
        }
        .into_option();

        let tracks: Vec<Track> = raw_tracks
            .into_iter()
            .map(|raw| build_track(raw, &artist))
            .collect();

        debug!(
            folder = %folder.display(),
            album = %title,
            artist = %artist,
            tracks = tracks.len(),
            "Assembled album"
        );

        Some(Album {
            id: AlbumId::new(),
            title,
            title_sort,
            artist,
            artist_sort,
            year,
            original_year,
            cover,
            external_ids,
            tracks,
        })
    }

    /// Name of the folder's parent when that parent lies strictly inside the root.
    fn folder_fallback(&self, folder: &Path) -> Option<String> {
        let parent = folder.parent()?;
        if parent != self.root && parent.starts_with(&self.root) {
            file_name(parent)
        } else {
            None
        }
    }
}

/// Reduces a tagged date to its leading four-digit year.
///
/// `"1999-05-01"` becomes `"1999"`; text that does not start with four
/// digits is kept trimmed; blank text is `None`.
pub fn normalize_year(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    let leading: String = trimmed.chars().take(4).collect();
    if leading.len() == 4 && leading.chars().all(|c| c.is_ascii_digit()) {
        Some(leading)
    } else {
        Some(trimmed.to_string())
    }
}

fn build_track(raw: RawTrack, album_artist: &str) -> Track {
    let (track_number, disc_number) = (raw.track(), raw.disc());
    let artist = match raw.artist.trim() {
        "" => album_artist.to_string(),
        artist => artist.to_string(),
    };

    Track {
        id: TrackId::new(),
        title: raw.title,
        title_sort: raw.title_sort.filter(|s| !s.trim().is_empty()),
        duration: raw.duration_ms,
        track_number,
        disc_number,
        artist,
        artist_sort: raw.artist_sort.filter(|s| !s.trim().is_empty()),
        external_ids: raw.external_ids.into_option(),
        locator: raw.locator,
    }
}

fn first_non_empty(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}
