//! Album Cover Lookup
//!
//! Finds the cover image for an album folder.
//!
//! ## Overview
//!
//! Embedded artwork is read while a track's tags are extracted, so each
//! file is opened once. [`embedded_cover`] asks a source for the front
//! cover of the primary tag, then for any picture attached to any tag.
//! The scanner keeps the first non-empty image in folder order and hands
//! it to [`CoverArtLocator::locate`]. When no track carried artwork the
//! locator looks for a sidecar image next to the tracks (`cover.jpg`,
//! `folder.png`, ...), in the configured order. Images are never merged.
//!
//! ## Usage
//!
//! ```ignore
//! use core_metadata::artwork::CoverArtLocator;
//!
//! let locator = CoverArtLocator::new(config.cover_file_names.clone());
//! let cover: Option<Vec<u8>> = locator.locate(&folder, first_embedded);
//! ```

use std::fs;
use std::path::Path;
use tracing::debug;

use crate::source::{PictureKind, TagSource};

/// Returns the first non-empty embedded image of `source`: the primary
/// tag's front cover, else any attached picture.
pub fn embedded_cover(source: &dyn TagSource) -> Option<Vec<u8>> {
    [PictureKind::FrontCover, PictureKind::AnyAttached]
        .into_iter()
        .find_map(|kind| source.picture(kind).filter(|p| !p.is_empty()))
}

/// Sidecar cover lookup
pub struct CoverArtLocator {
    sidecar_names: Vec<String>,
}

impl CoverArtLocator {
    pub fn new(sidecar_names: Vec<String>) -> Self {
        Self { sidecar_names }
    }

    /// Returns the cover bytes for the album in `folder`, if any.
    ///
    /// `embedded` is the artwork found in the album's tracks; it wins over
    /// any sidecar file when non-empty.
    pub fn locate(&self, folder: &Path, embedded: Option<Vec<u8>>) -> Option<Vec<u8>> {
        match embedded.filter(|cover| !cover.is_empty()) {
            Some(cover) => {
                debug!(bytes = cover.len(), "Using embedded cover");
                Some(cover)
            }
            None => self.sidecar(folder),
        }
    }

    fn sidecar(&self, folder: &Path) -> Option<Vec<u8>> {
        self.sidecar_names.iter().find_map(|name| {
            let path = folder.join(name);
            match fs::read(&path) {
                Ok(bytes) if !bytes.is_empty() => {
                    debug!(file = %path.display(), bytes = bytes.len(), "Using sidecar cover");
                    Some(bytes)
                }
                _ => None,
            }
        })
    }
}
