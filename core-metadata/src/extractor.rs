//! Audio Tag Extraction
//!
//! Turns one audio file into a [`RawTrack`] through a [`TagReader`].
//!
//! ## Overview
//!
//! Every value is resolved through an ordered [`Fallback`] chain:
//!
//! | value          | chain                                                   |
//! |----------------|---------------------------------------------------------|
//! | title          | title property, basic title, file stem, `""`            |
//! | artist         | artist property, basic artist, `""`                     |
//! | album          | album property, basic album, `""`                       |
//! | year           | recording date, year property, basic year, none         |
//! | original year  | original release date, none                             |
//! | track / disc   | `"N"` or `"N/total"` (total discarded), none            |
//!
//! A track is a compilation when the compilation flag is set, when the
//! release type mentions "compilation", or when the album artist is
//! "Various Artists" in any letter case.
//!
//! Extraction is synchronous; the scanner runs it on blocking worker
//! threads. Failures are per file and never affect sibling files.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::extractor::MetadataExtractor;
//! use std::path::Path;
//!
//! let extractor = MetadataExtractor::lofty();
//! let raw = extractor.extract(Path::new("/music/Album/01 Song.flac"))?;
//! println!("{} - {} ({} ms)", raw.artist, raw.title, raw.duration_ms);
//! ```

use core_library::models::{ExternalIds, RawTrack};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

use crate::artwork::embedded_cover;
use crate::error::Result;
use crate::fallback::Fallback;
use crate::source::{BasicField, LoftyTagReader, TagField, TagReader, TagSource};

/// Tags and, optionally, embedded artwork read from one open of a file
#[derive(Debug, Clone)]
pub struct ExtractedTrack {
    pub raw: RawTrack,
    pub cover: Option<Vec<u8>>,
}

/// Audio metadata extractor
pub struct MetadataExtractor {
    reader: Arc<dyn TagReader>,
}

impl MetadataExtractor {
    /// Create an extractor reading through `reader`
    pub fn new(reader: Arc<dyn TagReader>) -> Self {
        Self { reader }
    }

    /// Create an extractor backed by `lofty`
    pub fn lofty() -> Self {
        Self::new(Arc::new(LoftyTagReader::new()))
    }

    /// Extract the raw tag record of one file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened or parsed. Missing tags
    /// are not errors; they resolve to their defaults.
    pub fn extract(&self, path: &Path) -> Result<RawTrack> {
        Ok(self.extract_track(path, false)?.raw)
    }

    /// Extract the tag record and, when `with_cover` is set, the embedded
    /// cover of one file. The file is opened once.
    pub fn extract_track(&self, path: &Path, with_cover: bool) -> Result<ExtractedTrack> {
        let source = self.reader.open(path)?;
        let raw = resolve(path, source.as_ref());
        let cover = if with_cover {
            embedded_cover(source.as_ref())
        } else {
            None
        };
        debug!(
            file = %path.file_name().map(|n| n.to_string_lossy()).unwrap_or_default(),
            title = %raw.title,
            cover = cover.is_some(),
            "Extracted tags"
        );
        Ok(ExtractedTrack { raw, cover })
    }
}

fn resolve(path: &Path, source: &dyn TagSource) -> RawTrack {
    let prop = |field: TagField| move || source.property(field);
    let basic = |field: BasicField| move || source.basic(field);
    let clean = |field: TagField| {
        source
            .property(field)
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
    };

    let title = Fallback::new()
        .then(prop(TagField::Title))
        .then(basic(BasicField::Title))
        .then(|| {
            path.file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .resolve_or(String::new());

    let artist = Fallback::new()
        .then(prop(TagField::Artist))
        .then(basic(BasicField::Artist))
        .resolve_or(String::new());

    let album = Fallback::new()
        .then(prop(TagField::Album))
        .then(basic(BasicField::Album))
        .resolve_or(String::new());

    let year = Fallback::new()
        .then(prop(TagField::RecordingDate))
        .then(prop(TagField::Year))
        .then(basic(BasicField::Year))
        .resolve();

    let original_year = Fallback::new()
        .then(prop(TagField::OriginalReleaseDate))
        .resolve();

    let track_number = Fallback::new()
        .then(|| source.property(TagField::TrackNumber).and_then(|v| parse_position(&v)))
        .resolve();
    let disc_number = Fallback::new()
        .then(|| source.property(TagField::DiscNumber).and_then(|v| parse_position(&v)))
        .resolve();

    let album_artist = clean(TagField::AlbumArtist);
    let is_compilation = source
        .property(TagField::Compilation)
        .is_some_and(|v| is_truthy(&v))
        || source
            .property(TagField::ReleaseType)
            .is_some_and(|v| v.to_lowercase().contains("compilation"))
        || album_artist
            .as_deref()
            .is_some_and(|a| a.eq_ignore_ascii_case("various artists"));

    let external_ids = ExternalIds {
        recording_id: clean(TagField::MusicBrainzRecordingId),
        track_id: clean(TagField::MusicBrainzTrackId),
        release_id: clean(TagField::MusicBrainzReleaseId),
        release_group_id: clean(TagField::MusicBrainzReleaseGroupId),
        artist_id: clean(TagField::MusicBrainzArtistId),
        album_artist_id: clean(TagField::MusicBrainzAlbumArtistId),
    };

    RawTrack {
        locator: path.to_path_buf(),
        title: title.trim().to_string(),
        title_sort: clean(TagField::TitleSort),
        artist: artist.trim().to_string(),
        artist_sort: clean(TagField::ArtistSort),
        album: album.trim().to_string(),
        album_sort: clean(TagField::AlbumSort),
        album_artist,
        album_artist_sort: clean(TagField::AlbumArtistSort),
        track_number,
        disc_number,
        year: year.map(|y| y.trim().to_string()),
        original_year: original_year.map(|y| y.trim().to_string()),
        is_compilation,
        external_ids,
        duration_ms: source
            .duration()
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0),
    }
}

/// Parses a `"N"` or `"N/total"` position; the total is dropped.
pub fn parse_position(value: &str) -> Option<u32> {
    value
        .split('/')
        .next()?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|n| *n > 0)
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{tag_fixture, TextTagReader};
    use std::fs;
    use tempfile::TempDir;

    fn extract(fields: &[(&str, &str)], file_name: &str) -> RawTrack {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join(file_name);
        fs::write(&path, tag_fixture(fields)).unwrap();
        MetadataExtractor::new(Arc::new(TextTagReader::new()))
            .extract(&path)
            .unwrap()
    }

    #[test]
    fn test_parse_position() {
        assert_eq!(parse_position("3"), Some(3));
        assert_eq!(parse_position(" 4/12 "), Some(4));
        assert_eq!(parse_position("/12"), None);
        assert_eq!(parse_position("0"), None);
        assert_eq!(parse_position("A"), None);
    }

    #[test]
    fn test_title_falls_back_to_file_stem() {
        let raw = extract(&[], "07 Interlude.mp3");
        assert_eq!(raw.title, "07 Interlude");
        assert_eq!(raw.artist, "");
        assert_eq!(raw.album, "");
        assert_eq!(raw.track_number, None);
        assert_eq!(raw.duration_ms, 0);
    }

    #[test]
    fn test_property_preferred_over_basic() {
        let raw = extract(
            &[
                ("basic.title", "Old Title"),
                ("title", "New Title"),
                ("basic.artist", "Basic Artist"),
                ("basic.year", "1980"),
            ],
            "a.mp3",
        );
        assert_eq!(raw.title, "New Title");
        assert_eq!(raw.artist, "Basic Artist");
        assert_eq!(raw.year.as_deref(), Some("1980"));
    }

    #[test]
    fn test_blank_property_falls_through() {
        let raw = extract(&[("title", "  "), ("basic.title", "Basic")], "a.mp3");
        assert_eq!(raw.title, "Basic");
    }

    #[test]
    fn test_positions_dates_and_ids() {
        let raw = extract(
            &[
                ("track_number", "5/10"),
                ("disc_number", "2/2"),
                ("recording_date", "2003-04-05"),
                ("original_release_date", "1971"),
                ("musicbrainz_recording_id", "rec"),
                ("musicbrainz_release_id", " rel "),
                ("title_sort", "Song, The"),
                ("duration_ms", "215000"),
            ],
            "a.flac",
        );
        assert_eq!(raw.track_number, Some(5));
        assert_eq!(raw.disc_number, Some(2));
        assert_eq!(raw.year.as_deref(), Some("2003-04-05"));
        assert_eq!(raw.original_year.as_deref(), Some("1971"));
        assert_eq!(raw.external_ids.recording_id.as_deref(), Some("rec"));
        assert_eq!(raw.external_ids.release_id.as_deref(), Some("rel"));
        assert_eq!(raw.title_sort.as_deref(), Some("Song, The"));
        assert_eq!(raw.duration_ms, 215_000);
    }

    #[test]
    fn test_compilation_detection() {
        assert!(extract(&[("compilation", "1")], "a.mp3").is_compilation);
        assert!(extract(&[("release_type", "album; Compilation")], "a.mp3").is_compilation);
        assert!(extract(&[("album_artist", "VARIOUS ARTISTS")], "a.mp3").is_compilation);
        assert!(!extract(&[("compilation", "0"), ("album_artist", "Band")], "a.mp3").is_compilation);
    }

    #[test]
    fn test_extract_track_reads_cover_from_same_open() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("01.flac");
        fs::write(
            &path,
            tag_fixture(&[("title", "Intro"), ("attached_picture", "ART")]),
        )
        .unwrap();
        let reader = Arc::new(TextTagReader::new());
        let extractor = MetadataExtractor::new(reader.clone());

        let extracted = extractor.extract_track(&path, true).unwrap();
        assert_eq!(extracted.raw.title, "Intro");
        assert_eq!(extracted.cover, Some(b"ART".to_vec()));
        assert_eq!(reader.open_count(), 1);

        let extracted = extractor.extract_track(&path, false).unwrap();
        assert_eq!(extracted.cover, None);
        assert_eq!(reader.open_count(), 2);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.mp3");
        fs::write(&path, "garbage").unwrap();
        let extractor = MetadataExtractor::new(Arc::new(TextTagReader::new()));
        assert!(extractor.extract(&path).is_err());
    }
}
