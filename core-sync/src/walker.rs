//! Album folder discovery.
//!
//! An album folder is any directory that directly contains at least one
//! tracked audio file. Hidden entries and package-style directories
//! (`*.app`, `*.photoslibrary`, ...) are never descended into. Symbolic
//! links are neither followed nor counted as tracks.

use core_library::signature::{has_tracked_extension, is_hidden};
use core_runtime::config::CatalogConfig;
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

use crate::error::{Result, ScanError};

#[derive(Debug, Clone)]
pub struct DirectoryWalker {
    audio_extensions: Vec<String>,
    package_extensions: Vec<String>,
}

impl DirectoryWalker {
    pub fn new(audio_extensions: Vec<String>, package_extensions: Vec<String>) -> Self {
        Self {
            audio_extensions,
            package_extensions,
        }
    }

    pub fn from_config(config: &CatalogConfig) -> Self {
        Self::new(
            config.audio_extensions.clone(),
            config.package_extensions.clone(),
        )
    }

    /// Returns every album folder under `root`, sorted by path.
    ///
    /// Unreadable entries below the root are logged and skipped; an
    /// unreadable root fails with [`ScanError::RootInaccessible`].
    pub fn album_folders(&self, root: &Path) -> Result<Vec<PathBuf>> {
        fs::read_dir(root).map_err(|e| ScanError::root_inaccessible(root, e))?;

        let mut folders = BTreeSet::new();
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !self.is_skipped(e));

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) if e.depth() == 0 => {
                    return Err(ScanError::root_inaccessible(root, e));
                }
                Err(e) => {
                    warn!(error = %e, "Skipping unreadable entry");
                    continue;
                }
            };

            if entry.file_type().is_file()
                && has_tracked_extension(entry.path(), &self.audio_extensions)
            {
                if let Some(parent) = entry.path().parent() {
                    folders.insert(parent.to_path_buf());
                }
            }
        }

        debug!(root = %root.display(), folders = folders.len(), "Discovered album folders");
        Ok(folders.into_iter().collect())
    }

    fn is_skipped(&self, entry: &DirEntry) -> bool {
        is_hidden(entry.path()) || (entry.file_type().is_dir() && self.is_package(entry.path()))
    }

    fn is_package(&self, path: &Path) -> bool {
        has_tracked_extension(path, &self.package_extensions)
    }
}
