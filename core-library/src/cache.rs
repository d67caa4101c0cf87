//! # Catalog Cache
//!
//! Persists the album list of a scanned root keyed by its [`CacheSignature`].
//!
//! ## Overview
//!
//! Each root maps to one JSON file under the store's cache directory. The file
//! holds a [`CacheContainer`]: schema version, signature and albums. A load
//! only returns albums when both the version and the signature match exactly;
//! anything else (missing file, undecodable content, older schema, changed
//! files) is a miss and the caller rescans. Old schemas are never migrated.
//!
//! Saves write a sibling temporary file and rename it over the target, so an
//! interrupted save leaves either the previous file or the new one.
//!
//! ## Usage
//!
//! ```ignore
//! use core_library::cache::CacheStore;
//!
//! let store = CacheStore::new("/path/to/cache");
//! if let Some(albums) = store.load(root, &signature).await {
//!     return Ok(albums);
//! }
//! let albums = rescan().await?;
//! store.save(&albums, root, &signature).await?;
//! ```

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{LibraryError, Result};
use crate::models::Album;
use crate::signature::CacheSignature;

/// Version of the on-disk cache layout.
///
/// Bump on any change to the serialized shape of the container or models.
pub const CACHE_SCHEMA_VERSION: u32 = 1;

/// Persisted scan result for one root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheContainer {
    pub version: u32,
    pub signature: CacheSignature,
    pub albums: Vec<Album>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CacheContainerRef<'a> {
    version: u32,
    signature: &'a CacheSignature,
    albums: &'a [Album],
}

/// Signature-keyed store of scanned catalogs.
#[derive(Debug, Clone)]
pub struct CacheStore {
    cache_dir: PathBuf,
}

impl CacheStore {
    pub fn new(cache_dir: impl Into<PathBuf>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
        }
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Cache file for `root`.
    ///
    /// Every character other than ASCII alphanumerics, `-`, `_` and `.` in
    /// the root path becomes `_`.
    pub fn cache_file_path(&self, root: &Path) -> PathBuf {
        let name: String = root
            .to_string_lossy()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.cache_dir.join(format!("{}.json", name))
    }

    /// Returns the cached albums for `root` when version and signature match.
    pub async fn load(&self, root: &Path, signature: &CacheSignature) -> Option<Vec<Album>> {
        let path = self.cache_file_path(root);

        let bytes = match fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) => {
                debug!(cache_file = %path.display(), error = %e, "No cached catalog");
                return None;
            }
        };

        let container: CacheContainer = match serde_json::from_slice(&bytes) {
            Ok(container) => container,
            Err(e) => {
                info!(cache_file = %path.display(), error = %e, "Cached catalog unreadable; rescanning");
                return None;
            }
        };

        if container.version != CACHE_SCHEMA_VERSION {
            info!(
                found = container.version,
                expected = CACHE_SCHEMA_VERSION,
                "Cached catalog has a different schema version; rescanning"
            );
            return None;
        }

        if container.signature != *signature {
            debug!(root = %root.display(), "Library changed since last scan");
            return None;
        }

        debug!(
            root = %root.display(),
            albums = container.albums.len(),
            "Cache hit"
        );
        Some(container.albums)
    }

    /// Persists `albums` for `root` atomically.
    pub async fn save(&self, albums: &[Album], root: &Path, signature: &CacheSignature) -> Result<()> {
        let path = self.cache_file_path(root);
        let container = CacheContainerRef {
            version: CACHE_SCHEMA_VERSION,
            signature,
            albums,
        };
        let bytes = serde_json::to_vec(&container)?;

        fs::create_dir_all(&self.cache_dir).await?;

        let file_name = path
            .file_name()
            .ok_or_else(|| LibraryError::CacheError(format!("Invalid cache path: {}", path.display())))?
            .to_string_lossy()
            .into_owned();
        let tmp_path = path.with_file_name(format!(".{}.{}.tmp", file_name, Uuid::new_v4()));

        if let Err(e) = write_and_rename(&tmp_path, &path, &bytes).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                debug!(error = %cleanup, "Temporary cache file already gone");
            }
            return Err(e);
        }

        debug!(
            cache_file = %path.display(),
            albums = albums.len(),
            bytes = bytes.len(),
            "Saved catalog cache"
        );
        Ok(())
    }

    /// Removes every cached catalog.
    pub async fn clear(&self) -> Result<()> {
        match fs::remove_dir_all(&self.cache_dir).await {
            Ok(()) => {
                info!(cache_dir = %self.cache_dir.display(), "Cleared catalog cache");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => {
                warn!(cache_dir = %self.cache_dir.display(), error = %e, "Failed to clear catalog cache");
                Err(e.into())
            }
        }
    }
}

async fn write_and_rename(tmp_path: &Path, path: &Path, bytes: &[u8]) -> Result<()> {
    fs::write(tmp_path, bytes).await?;
    fs::rename(tmp_path, path).await?;
    Ok(())
}
