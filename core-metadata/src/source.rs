//! # Tag Sources
//!
//! The narrow capability interface metadata extraction and cover lookup use
//! to read audio files.
//!
//! ## Overview
//!
//! A [`TagReader`] opens a file and returns a [`TagSource`], which answers
//! four kinds of questions:
//!
//! - basic fields every tag format has (title, artist, album, numeric year)
//! - named properties such as sort keys, positions and identifiers
//! - embedded pictures
//! - the audio duration
//!
//! [`LoftyTagReader`] is the production implementation. Named properties are
//! looked up in the file's primary tag first and then in every other tag.
//! Free-form properties without a common key (the MusicBrainz release type)
//! are matched per tag format: TXXX descriptions for ID3v2, field names for
//! Vorbis comments and APE, and freeform atoms for MP4.

use lofty::config::ParseOptions;
use lofty::error::ErrorKind;
use lofty::file::{AudioFile, TaggedFile, TaggedFileExt};
use lofty::picture::PictureType;
use lofty::probe::Probe;
use lofty::tag::{Accessor, ItemKey, Tag, TagType};
use std::path::Path;
use std::time::Duration;
use tracing::trace;

use crate::error::{MetadataError, Result};

/// Fields every tag format carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BasicField {
    Title,
    Artist,
    Album,
    Year,
}

impl BasicField {
    pub fn name(self) -> &'static str {
        match self {
            BasicField::Title => "title",
            BasicField::Artist => "artist",
            BasicField::Album => "album",
            BasicField::Year => "year",
        }
    }
}

/// Named properties read through the format-aware key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagField {
    Title,
    TitleSort,
    Artist,
    ArtistSort,
    Album,
    AlbumSort,
    AlbumArtist,
    AlbumArtistSort,
    TrackNumber,
    DiscNumber,
    RecordingDate,
    Year,
    OriginalReleaseDate,
    Compilation,
    ReleaseType,
    MusicBrainzRecordingId,
    MusicBrainzTrackId,
    MusicBrainzReleaseId,
    MusicBrainzReleaseGroupId,
    MusicBrainzArtistId,
    MusicBrainzAlbumArtistId,
}

impl TagField {
    /// Stable snake-case name, used in logs and text fixtures.
    pub fn name(self) -> &'static str {
        match self {
            TagField::Title => "title",
            TagField::TitleSort => "title_sort",
            TagField::Artist => "artist",
            TagField::ArtistSort => "artist_sort",
            TagField::Album => "album",
            TagField::AlbumSort => "album_sort",
            TagField::AlbumArtist => "album_artist",
            TagField::AlbumArtistSort => "album_artist_sort",
            TagField::TrackNumber => "track_number",
            TagField::DiscNumber => "disc_number",
            TagField::RecordingDate => "recording_date",
            TagField::Year => "year",
            TagField::OriginalReleaseDate => "original_release_date",
            TagField::Compilation => "compilation",
            TagField::ReleaseType => "release_type",
            TagField::MusicBrainzRecordingId => "musicbrainz_recording_id",
            TagField::MusicBrainzTrackId => "musicbrainz_track_id",
            TagField::MusicBrainzReleaseId => "musicbrainz_release_id",
            TagField::MusicBrainzReleaseGroupId => "musicbrainz_release_group_id",
            TagField::MusicBrainzArtistId => "musicbrainz_artist_id",
            TagField::MusicBrainzAlbumArtistId => "musicbrainz_album_artist_id",
        }
    }

    fn item_key(self) -> Option<ItemKey> {
        let key = match self {
            TagField::Title => ItemKey::TrackTitle,
            TagField::TitleSort => ItemKey::TrackTitleSortOrder,
            TagField::Artist => ItemKey::TrackArtist,
            TagField::ArtistSort => ItemKey::TrackArtistSortOrder,
            TagField::Album => ItemKey::AlbumTitle,
            TagField::AlbumSort => ItemKey::AlbumTitleSortOrder,
            TagField::AlbumArtist => ItemKey::AlbumArtist,
            TagField::AlbumArtistSort => ItemKey::AlbumArtistSortOrder,
            TagField::TrackNumber => ItemKey::TrackNumber,
            TagField::DiscNumber => ItemKey::DiscNumber,
            TagField::RecordingDate => ItemKey::RecordingDate,
            TagField::Year => ItemKey::Year,
            TagField::OriginalReleaseDate => ItemKey::OriginalReleaseDate,
            TagField::Compilation => ItemKey::FlagCompilation,
            TagField::MusicBrainzRecordingId => ItemKey::MusicBrainzRecordingId,
            TagField::MusicBrainzTrackId => ItemKey::MusicBrainzTrackId,
            TagField::MusicBrainzReleaseId => ItemKey::MusicBrainzReleaseId,
            TagField::MusicBrainzReleaseGroupId => ItemKey::MusicBrainzReleaseGroupId,
            TagField::MusicBrainzArtistId => ItemKey::MusicBrainzArtistId,
            TagField::MusicBrainzAlbumArtistId => ItemKey::MusicBrainzReleaseArtistId,
            TagField::ReleaseType => return None,
        };
        Some(key)
    }
}

/// Which embedded picture to look for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PictureKind {
    /// Front cover in the file's primary tag
    FrontCover,
    /// Any non-empty picture in any tag of the file
    AnyAttached,
}

/// Read access to one opened audio file.
pub trait TagSource: Send {
    fn basic(&self, field: BasicField) -> Option<String>;

    fn property(&self, field: TagField) -> Option<String>;

    fn picture(&self, kind: PictureKind) -> Option<Vec<u8>>;

    fn duration(&self) -> Option<Duration>;
}

/// Opens audio files as [`TagSource`]s.
///
/// Implementations are shared across folder workers.
pub trait TagReader: Send + Sync {
    fn open(&self, path: &Path) -> Result<Box<dyn TagSource>>;
}

/// [`TagReader`] backed by `lofty`.
#[derive(Debug, Clone, Copy)]
pub struct LoftyTagReader {
    parse_options: ParseOptions,
}

impl LoftyTagReader {
    pub fn new() -> Self {
        Self {
            parse_options: ParseOptions::new(),
        }
    }

    pub fn with_options(parse_options: ParseOptions) -> Self {
        Self { parse_options }
    }
}

impl Default for LoftyTagReader {
    fn default() -> Self {
        Self::new()
    }
}

impl TagReader for LoftyTagReader {
    fn open(&self, path: &Path) -> Result<Box<dyn TagSource>> {
        if !path.is_file() {
            return Err(MetadataError::FileNotFound(path.display().to_string()));
        }

        let file = Probe::open(path)
            .map_err(|e| MetadataError::ExtractionFailed(format!("{}: {}", path.display(), e)))?
            .options(self.parse_options)
            .guess_file_type()?
            .read()
            .map_err(|e| match e.kind() {
                ErrorKind::UnknownFormat => {
                    MetadataError::UnsupportedFormat(path.display().to_string())
                }
                _ => MetadataError::CorruptedFile(format!("{}: {}", path.display(), e)),
            })?;

        trace!(
            file_type = ?file.file_type(),
            tags = file.tags().len(),
            "Opened audio file"
        );
        Ok(Box::new(LoftyTagSource { file }))
    }
}

/// A parsed file.
pub struct LoftyTagSource {
    file: TaggedFile,
}

impl LoftyTagSource {
    fn main_tag(&self) -> Option<&Tag> {
        self.file.primary_tag().or_else(|| self.file.first_tag())
    }

    // Primary tag first, then the rest in file order.
    fn tags_by_priority(&self) -> impl Iterator<Item = &Tag> {
        self.file.primary_tag().into_iter().chain(self.file.tags().iter())
    }
}

impl TagSource for LoftyTagSource {
    fn basic(&self, field: BasicField) -> Option<String> {
        let tag = self.main_tag()?;
        match field {
            BasicField::Title => tag.title().map(|s| s.to_string()),
            BasicField::Artist => tag.artist().map(|s| s.to_string()),
            BasicField::Album => tag.album().map(|s| s.to_string()),
            BasicField::Year => tag.year().map(|y| y.to_string()),
        }
    }

    fn property(&self, field: TagField) -> Option<String> {
        property_from(self.tags_by_priority(), field)
    }

    fn picture(&self, kind: PictureKind) -> Option<Vec<u8>> {
        picture_from(self.main_tag(), self.file.tags(), kind)
    }

    fn duration(&self) -> Option<Duration> {
        Some(self.file.properties().duration()).filter(|d| !d.is_zero())
    }
}

/// First value of `field` across `tags`, in iteration order.
fn property_from<'a>(mut tags: impl Iterator<Item = &'a Tag>, field: TagField) -> Option<String> {
    match field.item_key() {
        Some(key) => tags.find_map(|tag| tag.get_string(&key).map(str::to_string)),
        None => tags.find_map(free_form_release_type),
    }
}

/// Front covers come from `main` only; any other picture may come from any
/// of `tags`. Empty images never match.
fn picture_from(main: Option<&Tag>, tags: &[Tag], kind: PictureKind) -> Option<Vec<u8>> {
    match kind {
        PictureKind::FrontCover => main?
            .pictures()
            .iter()
            .find(|p| p.pic_type() == PictureType::CoverFront && !p.data().is_empty())
            .map(|p| p.data().to_vec()),
        PictureKind::AnyAttached => tags
            .iter()
            .flat_map(|tag| tag.pictures())
            .find(|p| !p.data().is_empty())
            .map(|p| p.data().to_vec()),
    }
}

/// Free-form key names carrying the MusicBrainz release type, per tag format.
fn release_type_keys(tag_type: TagType) -> &'static [&'static str] {
    match tag_type {
        TagType::Id3v2 => &["MusicBrainz Album Type", "RELEASETYPE"],
        TagType::VorbisComments => &["RELEASETYPE", "MUSICBRAINZ_ALBUMTYPE"],
        TagType::Ape => &["MUSICBRAINZ_ALBUMTYPE", "RELEASETYPE", "MusicBrainz Album Type"],
        TagType::Mp4Ilst => &[
            "----:com.apple.iTunes:MusicBrainz Album Type",
            "----:com.apple.iTunes:RELEASETYPE",
        ],
        _ => &[],
    }
}

fn free_form_release_type(tag: &Tag) -> Option<String> {
    let keys = release_type_keys(tag.tag_type());
    tag.items().find_map(|item| match item.key() {
        ItemKey::Unknown(name) if keys.iter().any(|k| k.eq_ignore_ascii_case(name)) => {
            item.value().text().map(str::to_string)
        }
        _ => None,
    })
}
