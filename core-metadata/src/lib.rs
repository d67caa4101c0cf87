//! # Metadata Module
//!
//! Reads tags and artwork from audio files.
//!
//! ## Overview
//!
//! This module handles:
//! - The `TagReader`/`TagSource` capability seam and its `lofty` implementation
//!   (ID3v2, Vorbis comments, MP4, APE, ID3v1)
//! - Ordered fallback chains for tag values
//! - Per-file extraction into `RawTrack` records
//! - Embedded and sidecar cover lookup

pub mod artwork;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod source;

#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use artwork::{embedded_cover, CoverArtLocator};
pub use error::{MetadataError, Result};
pub use extractor::{ExtractedTrack, MetadataExtractor};
pub use source::{BasicField, LoftyTagReader, PictureKind, TagField, TagReader, TagSource};
