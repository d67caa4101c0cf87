//! Folder fingerprints used to validate the catalog cache.
//!
//! A [`CacheSignature`] lists every tracked audio file under a root's album
//! folders together with its modification time, sorted by path. Adding,
//! removing or touching a tracked file changes the signature; other files in
//! the folders (artwork, logs) never do.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::error::Result;

/// One tracked file and its last modification time.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignatureEntry {
    pub path: PathBuf,
    pub mod_time: DateTime<Utc>,
}

/// Ordered fingerprint of a root's tracked files.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheSignature {
    entries: Vec<SignatureEntry>,
}

impl CacheSignature {
    /// Builds a signature, sorting `entries` by path.
    pub fn new(mut entries: Vec<SignatureEntry>) -> Self {
        entries.sort();
        Self { entries }
    }

    pub fn entries(&self) -> &[SignatureEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Returns true when `path` has one of `extensions` (lowercase, no dot).
pub fn has_tracked_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| {
            let e = e.to_ascii_lowercase();
            extensions.iter().any(|x| *x == e)
        })
        .unwrap_or(false)
}

/// Returns true for names starting with a dot.
pub fn is_hidden(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| n.starts_with('.'))
        .unwrap_or(false)
}

/// Computes [`CacheSignature`]s for sets of album folders.
#[derive(Debug, Clone)]
pub struct SignatureBuilder {
    audio_extensions: Vec<String>,
}

impl SignatureBuilder {
    pub fn new(audio_extensions: Vec<String>) -> Self {
        Self { audio_extensions }
    }

    /// Fingerprints every tracked file directly inside `folders`.
    ///
    /// A folder that can no longer be read contributes no entries.
    pub fn build(&self, folders: &[PathBuf]) -> CacheSignature {
        let mut entries = Vec::new();
        for folder in folders {
            match self.folder_entries(folder) {
                Ok(mut found) => entries.append(&mut found),
                Err(e) => warn!(
                    folder = %folder.display(),
                    error = %e,
                    "Album folder unreadable while building signature"
                ),
            }
        }

        let signature = CacheSignature::new(entries);
        debug!(
            folders = folders.len(),
            files = signature.len(),
            "Built cache signature"
        );
        signature
    }

    /// Lists tracked files of one folder in path order.
    pub fn tracked_files(&self, folder: &Path) -> Result<Vec<PathBuf>> {
        let mut files: Vec<PathBuf> = self
            .folder_entries(folder)?
            .into_iter()
            .map(|e| e.path)
            .collect();
        files.sort();
        Ok(files)
    }

    fn folder_entries(&self, folder: &Path) -> Result<Vec<SignatureEntry>> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(folder)? {
            let path = entry?.path();
            if is_hidden(&path) || !has_tracked_extension(&path, &self.audio_extensions) {
                continue;
            }

            // Symlinks are not followed, matching the directory walk
            let metadata = match fs::symlink_metadata(&path) {
                Ok(m) if m.file_type().is_file() => m,
                Ok(_) => continue,
                Err(e) => {
                    warn!(file = %path.display(), error = %e, "Skipping unreadable file");
                    continue;
                }
            };

            entries.push(SignatureEntry {
                path,
                mod_time: DateTime::<Utc>::from(metadata.modified()?),
            });
        }
        Ok(entries)
    }
}
