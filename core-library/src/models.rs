//! Domain models for the music catalog
//!
//! `RawTrack` is the per-file parse result handed from metadata extraction to
//! album assembly. `Track` and `Album` are the immutable values a scan
//! produces and the cache persists.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};
use uuid::Uuid;

// =============================================================================
// ID Types
// =============================================================================

/// Unique identifier for a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackId(pub Uuid);

impl TrackId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for TrackId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TrackId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for an album
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AlbumId(pub Uuid);

impl AlbumId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_string(s: &str) -> Result<Self, uuid::Error> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

impl Default for AlbumId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AlbumId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// =============================================================================
// External identifiers
// =============================================================================

/// Stable identifiers from the MusicBrainz namespace
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExternalIds {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recording_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub track_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub release_group_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub album_artist_id: Option<String>,
}

impl ExternalIds {
    pub fn is_empty(&self) -> bool {
        self.recording_id.is_none()
            && self.track_id.is_none()
            && self.release_id.is_none()
            && self.release_group_id.is_none()
            && self.artist_id.is_none()
            && self.album_artist_id.is_none()
    }

    /// Collapses an all-empty set to `None`.
    pub fn into_option(self) -> Option<Self> {
        if self.is_empty() {
            None
        } else {
            Some(self)
        }
    }
}

// =============================================================================
// Raw parse result
// =============================================================================

/// Per-file tag record produced by metadata extraction.
///
/// Lives for a single scan pass; assembly turns a folder's worth of these
/// into one [`Album`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTrack {
    /// Absolute path of the audio file
    pub locator: PathBuf,
    pub title: String,
    pub title_sort: Option<String>,
    pub artist: String,
    pub artist_sort: Option<String>,
    pub album: String,
    pub album_sort: Option<String>,
    /// Explicit album-artist tag, if any
    pub album_artist: Option<String>,
    pub album_artist_sort: Option<String>,
    pub track_number: Option<u32>,
    pub disc_number: Option<u32>,
    /// Raw year text as tagged
    pub year: Option<String>,
    /// Raw original-release date as tagged
    pub original_year: Option<String>,
    pub is_compilation: bool,
    pub external_ids: ExternalIds,
    pub duration_ms: u64,
}

/// Disc number of a track without one.
pub const UNTAGGED_DISC_NUMBER: u32 = 1;

/// Track number of a track without one; sorts before numbered tracks.
pub const UNTAGGED_TRACK_NUMBER: u32 = 0;

impl RawTrack {
    /// Creates an empty record for `locator`.
    pub fn new(locator: impl Into<PathBuf>) -> Self {
        Self {
            locator: locator.into(),
            ..Default::default()
        }
    }

    pub fn disc(&self) -> u32 {
        self.disc_number.unwrap_or(UNTAGGED_DISC_NUMBER)
    }

    pub fn track(&self) -> u32 {
        self.track_number.unwrap_or(UNTAGGED_TRACK_NUMBER)
    }

    /// Title used for ordering: a non-blank sort key, else the title.
    pub fn sort_title(&self) -> &str {
        self.title_sort
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or(&self.title)
    }

    /// Playback order: disc, track number, case-insensitive title, then path.
    ///
    /// Albums keep their tracks in this order.
    pub fn playback_cmp(&self, other: &Self) -> Ordering {
        self.disc()
            .cmp(&other.disc())
            .then(self.track().cmp(&other.track()))
            .then_with(|| {
                self.sort_title()
                    .to_lowercase()
                    .cmp(&other.sort_title().to_lowercase())
            })
            .then_with(|| self.locator.cmp(&other.locator))
    }
}

// =============================================================================
// Domain Models
// =============================================================================

/// A playable track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: TrackId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_sort: Option<String>,
    /// Duration in milliseconds
    pub duration: u64,
    /// Position on the disc, 0 when untagged
    pub track_number: u32,
    /// Disc number, 1 when untagged
    pub disc_number: u32,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_sort: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<ExternalIds>,
    /// Absolute path of the audio file
    pub locator: PathBuf,
}

/// An album with its tracks in playback order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    pub id: AlbumId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_sort: Option<String>,
    pub artist: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artist_sort: Option<String>,
    /// Four-digit year where the tag allowed it, otherwise the raw text
    pub year: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_year: Option<String>,
    /// Cover image bytes, base64 on disk
    #[serde(default, skip_serializing_if = "Option::is_none", with = "cover_base64")]
    pub cover: Option<Vec<u8>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_ids: Option<ExternalIds>,
    pub tracks: Vec<Track>,
}

impl Album {
    /// Total playing time in milliseconds
    pub fn total_duration(&self) -> u64 {
        self.tracks.iter().map(|t| t.duration).sum()
    }

    /// Path of the first track, used as a stable tie-break
    pub fn first_locator(&self) -> Option<&Path> {
        self.tracks.first().map(|t| t.locator.as_path())
    }

    /// Catalog order: artist, year, title, then first track path.
    pub fn catalog_cmp(&self, other: &Self) -> Ordering {
        let artist = |a: &Album| a.artist_sort.as_deref().unwrap_or(&a.artist).to_lowercase();
        let title = |a: &Album| a.title_sort.as_deref().unwrap_or(&a.title).to_lowercase();

        artist(self)
            .cmp(&artist(other))
            .then_with(|| self.year.cmp(&other.year))
            .then_with(|| title(self).cmp(&title(other)))
            .then_with(|| self.first_locator().cmp(&other.first_locator()))
    }
}

/// Sorts albums into catalog order.
pub fn sort_albums(albums: &mut [Album]) {
    albums.sort_by(|a, b| a.catalog_cmp(b));
}

mod cover_base64 {
    use super::*;

    pub fn serialize<S: Serializer>(cover: &Option<Vec<u8>>, serializer: S) -> Result<S::Ok, S::Error> {
        match cover {
            Some(bytes) => serializer.serialize_some(&STANDARD.encode(bytes)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Vec<u8>>, D::Error> {
        let encoded = Option::<String>::deserialize(deserializer)?;
        encoded
            .map(|s| STANDARD.decode(s).map_err(serde::de::Error::custom))
            .transpose()
    }
}
