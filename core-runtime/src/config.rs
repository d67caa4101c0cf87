//! # Core Configuration Module
//!
//! Provides configuration management for the music catalog core.
//!
//! ## Overview
//!
//! The configuration system uses a builder pattern to construct a
//! `CatalogConfig` value that is handed to the scanner and the cache store.
//! Nothing in the core reads process-wide state on its own: the cache
//! directory, the worker pool size and the classification tables all arrive
//! through this value, and `build()` validates them fail-fast.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//!
//! let config = CatalogConfig::builder()
//!     .cache_dir("/path/to/cache")
//!     .max_concurrent_folders(8)
//!     .build()
//!     .expect("Failed to build config");
//! ```
//!
//! ## Environment
//!
//! `MUSIC_CATALOG_CACHE_DIR` overrides the platform cache directory when no
//! explicit `cache_dir` was given to the builder.

use crate::error::{Error, Result};
use std::path::PathBuf;

/// Environment variable overriding the default cache directory.
pub const CACHE_DIR_ENV: &str = "MUSIC_CATALOG_CACHE_DIR";

/// Application directory name under the platform cache directory.
pub const APP_DIR_NAME: &str = "music-catalog";

/// Audio file extensions recognised by the walker (lowercase, no dot).
pub const DEFAULT_AUDIO_EXTENSIONS: &[&str] = &[
    "mp3", "m4a", "aac", "flac", "wav", "aiff", "alac", "ogg", "opus",
];

/// Directory extensions treated as opaque packages and never descended into.
pub const DEFAULT_PACKAGE_EXTENSIONS: &[&str] = &[
    "app",
    "bundle",
    "framework",
    "plugin",
    "kext",
    "pkg",
    "photoslibrary",
    "musiclibrary",
    "tvlibrary",
    "logicx",
    "band",
    "rtfd",
    "xcodeproj",
];

/// Sidecar artwork file names, in priority order.
pub const DEFAULT_COVER_FILE_NAMES: &[&str] = &[
    "cover.jpg",
    "cover.jpeg",
    "cover.png",
    "Cover.jpg",
    "Cover.jpeg",
    "Cover.png",
    "COVER.JPG",
    "COVER.PNG",
    "folder.jpg",
    "folder.jpeg",
    "folder.png",
    "Folder.jpg",
    "Folder.jpeg",
    "Folder.png",
    "FOLDER.JPG",
    "FOLDER.PNG",
    "front.jpg",
    "front.jpeg",
    "front.png",
    "Front.jpg",
    "Front.jpeg",
    "Front.png",
    "FRONT.JPG",
    "FRONT.PNG",
    "album.jpg",
    "album.png",
    "Album.jpg",
    "Album.png",
    "artwork.jpg",
    "artwork.png",
    "Artwork.jpg",
    "Artwork.png",
];

/// Share of tracks one artist needs to be named album artist.
pub const DEFAULT_MAJORITY_SHARE: f64 = 0.6;

/// Distinct artists (without a majority) at which an album becomes "Various Artists".
pub const DEFAULT_VARIOUS_MIN_DISTINCT: usize = 3;

const MAX_CONCURRENT_FOLDERS: usize = 256;

/// Core configuration for the catalog scanner.
///
/// Use [`CatalogConfigBuilder`] to construct instances.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogConfig {
    /// Directory holding one cache file per scanned root
    pub cache_dir: PathBuf,

    /// Maximum number of album folders extracted concurrently
    pub max_concurrent_folders: usize,

    /// Whether scans consult and persist the on-disk cache
    pub use_cache: bool,

    /// Tracked audio extensions (lowercase, no dot)
    pub audio_extensions: Vec<String>,

    /// Package-style directory extensions skipped by the walker
    pub package_extensions: Vec<String>,

    /// Sidecar artwork file names, tried in order
    pub cover_file_names: Vec<String>,

    /// Album artist heuristics
    pub artist_heuristics: ArtistHeuristicsConfig,
}

/// Tunable constants for album artist resolution.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArtistHeuristicsConfig {
    /// Minimum share (0, 1] of tracks for the majority rule
    pub majority_share: f64,
    /// Distinct artist count that marks a compilation when no majority exists
    pub various_min_distinct: usize,
}

impl Default for ArtistHeuristicsConfig {
    fn default() -> Self {
        Self {
            majority_share: DEFAULT_MAJORITY_SHARE,
            various_min_distinct: DEFAULT_VARIOUS_MIN_DISTINCT,
        }
    }
}

impl CatalogConfig {
    /// Creates a new builder for constructing a `CatalogConfig`.
    pub fn builder() -> CatalogConfigBuilder {
        CatalogConfigBuilder::default()
    }

    /// Validates the configuration and returns an error if invalid.
    ///
    /// This checks:
    /// - Cache directory is not empty
    /// - Concurrency is within 1..=256
    /// - At least one audio extension is configured
    /// - Artist heuristics are in range
    pub fn validate(&self) -> Result<()> {
        if self.cache_dir.as_os_str().is_empty() {
            return Err(Error::Config("Cache directory cannot be empty".to_string()));
        }

        if self.max_concurrent_folders == 0 {
            return Err(Error::Config(
                "max_concurrent_folders must be greater than 0".to_string(),
            ));
        }

        if self.max_concurrent_folders > MAX_CONCURRENT_FOLDERS {
            return Err(Error::Config(format!(
                "max_concurrent_folders exceeds maximum of {}",
                MAX_CONCURRENT_FOLDERS
            )));
        }

        if self.audio_extensions.iter().all(|e| e.trim().is_empty()) {
            return Err(Error::Config(
                "At least one audio extension must be configured".to_string(),
            ));
        }

        let share = self.artist_heuristics.majority_share;
        if !(share > 0.0 && share <= 1.0) {
            return Err(Error::Config(format!(
                "Artist majority share must be within (0, 1], got {}",
                share
            )));
        }

        if self.artist_heuristics.various_min_distinct < 2 {
            return Err(Error::Config(
                "various_min_distinct must be at least 2".to_string(),
            ));
        }

        Ok(())
    }
}

/// Resolves the default cache directory.
///
/// Order: `MUSIC_CATALOG_CACHE_DIR`, then the platform cache directory, then
/// the system temp directory, each joined with the library cache folder.
pub fn default_cache_dir() -> PathBuf {
    if let Some(dir) = std::env::var_os(CACHE_DIR_ENV).filter(|v| !v.is_empty()) {
        return PathBuf::from(dir);
    }

    dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(APP_DIR_NAME)
        .join("library-cache")
}

fn default_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
        .min(MAX_CONCURRENT_FOLDERS)
}

fn to_owned_list(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn normalize_extension(ext: impl Into<String>) -> String {
    ext.into()
        .trim()
        .trim_start_matches('.')
        .to_ascii_lowercase()
}

/// Builder for constructing [`CatalogConfig`] instances.
///
/// Every field has a default; call [`build()`](CatalogConfigBuilder::build)
/// to validate and produce the final config.
#[derive(Debug, Default)]
pub struct CatalogConfigBuilder {
    cache_dir: Option<PathBuf>,
    max_concurrent_folders: Option<usize>,
    use_cache: Option<bool>,
    audio_extensions: Option<Vec<String>>,
    package_extensions: Option<Vec<String>>,
    cover_file_names: Option<Vec<String>>,
    artist_heuristics: Option<ArtistHeuristicsConfig>,
}

impl CatalogConfigBuilder {
    /// Sets the cache directory.
    ///
    /// # Examples
    ///
    /// ```
    /// use core_runtime::config::CatalogConfig;
    ///
    /// let builder = CatalogConfig::builder()
    ///     .cache_dir("/path/to/cache");
    /// ```
    pub fn cache_dir<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.cache_dir = Some(path.into());
        self
    }

    /// Sets the size of the folder worker pool.
    ///
    /// Default: available parallelism
    pub fn max_concurrent_folders(mut self, workers: usize) -> Self {
        self.max_concurrent_folders = Some(workers);
        self
    }

    /// Enables or disables the on-disk cache.
    pub fn use_cache(mut self, enabled: bool) -> Self {
        self.use_cache = Some(enabled);
        self
    }

    /// Replaces the tracked audio extension set.
    ///
    /// Extensions are matched case-insensitively; a leading dot is ignored.
    pub fn audio_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audio_extensions = Some(extensions.into_iter().map(normalize_extension).collect());
        self
    }

    /// Replaces the package directory extension set.
    pub fn package_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.package_extensions =
            Some(extensions.into_iter().map(normalize_extension).collect());
        self
    }

    /// Replaces the sidecar cover file list.
    pub fn cover_file_names<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.cover_file_names = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Overrides the album artist heuristics.
    pub fn artist_heuristics(mut self, majority_share: f64, various_min_distinct: usize) -> Self {
        self.artist_heuristics = Some(ArtistHeuristicsConfig {
            majority_share,
            various_min_distinct,
        });
        self
    }

    /// Builds the final configuration.
    ///
    /// # Errors
    ///
    /// Returns `Error::Config` when any value fails [`CatalogConfig::validate`].
    pub fn build(self) -> Result<CatalogConfig> {
        let config = CatalogConfig {
            cache_dir: self.cache_dir.unwrap_or_else(default_cache_dir),
            max_concurrent_folders: self
                .max_concurrent_folders
                .unwrap_or_else(default_concurrency),
            use_cache: self.use_cache.unwrap_or(true),
            audio_extensions: self
                .audio_extensions
                .unwrap_or_else(|| to_owned_list(DEFAULT_AUDIO_EXTENSIONS)),
            package_extensions: self
                .package_extensions
                .unwrap_or_else(|| to_owned_list(DEFAULT_PACKAGE_EXTENSIONS)),
            cover_file_names: self
                .cover_file_names
                .unwrap_or_else(|| to_owned_list(DEFAULT_COVER_FILE_NAMES)),
            artist_heuristics: self.artist_heuristics.unwrap_or_default(),
        };

        config.validate()?;
        Ok(config)
    }
}
