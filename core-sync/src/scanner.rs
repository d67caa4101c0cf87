//! # Library Scanner
//!
//! Drives a full scan of one library root into a sorted album list.
//!
//! ## Overview
//!
//! A scan runs in phases:
//!
//! 1. **Discover**: walk the root for album folders and fingerprint their
//!    tracked files.
//! 2. **Cache check**: if the persisted catalog matches the fingerprint, it
//!    is the result.
//! 3. **Extract**: each album folder is handled on a blocking worker, at
//!    most `max_concurrent_folders` at a time. Files that fail to parse are
//!    skipped; folders without parseable files produce no album.
//! 4. **Assemble**: albums are sorted into catalog order.
//! 5. **Persist**: the catalog is saved under the fingerprint. A failed save
//!    is logged and the scan still succeeds.
//!
//! The whole scan is one cancellable unit. Cancelling it returns
//! [`ScanError::Cancelled`] and persists nothing.
//!
//! ## Usage
//!
//! ```ignore
//! use core_sync::LibraryScanner;
//! use tokio_util::sync::CancellationToken;
//!
//! let scanner = LibraryScanner::new(config, cache, reader).with_event_bus(bus);
//! let albums = scanner.scan(Path::new("/music"), CancellationToken::new()).await?;
//! ```

use core_library::artist::ArtistHeuristics;
use core_library::assembler::AlbumAssembler;
use core_library::cache::CacheStore;
use core_library::models::{sort_albums, Album};
use core_library::signature::{CacheSignature, SignatureBuilder};
use core_metadata::artwork::CoverArtLocator;
use core_metadata::extractor::MetadataExtractor;
use core_metadata::source::TagReader;
use core_runtime::config::CatalogConfig;
use core_runtime::events::{CoreEvent, EventBus, ScanEvent};
use core_runtime::logging::strip_path;
use futures::stream::{self, StreamExt};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn, Span};

use crate::error::{Result, ScanError};
use crate::walker::DirectoryWalker;

/// Shared, read-only state for folder workers.
struct FolderContext {
    signatures: SignatureBuilder,
    extractor: MetadataExtractor,
    covers: CoverArtLocator,
    assembler: AlbumAssembler,
    cancel: CancellationToken,
}

struct Discovery {
    root: PathBuf,
    folders: Vec<PathBuf>,
    signature: CacheSignature,
}

struct ScanOutcome {
    albums: Vec<Album>,
    from_cache: bool,
    discovery: Discovery,
}

/// Scans library roots into album catalogs.
pub struct LibraryScanner {
    config: CatalogConfig,
    cache: Arc<CacheStore>,
    reader: Arc<dyn TagReader>,
    event_bus: Option<EventBus>,
}

impl LibraryScanner {
    pub fn new(config: CatalogConfig, cache: Arc<CacheStore>, reader: Arc<dyn TagReader>) -> Self {
        Self {
            config,
            cache,
            reader,
            event_bus: None,
        }
    }

    /// Publish scan lifecycle events on `event_bus`.
    pub fn with_event_bus(mut self, event_bus: EventBus) -> Self {
        self.event_bus = Some(event_bus);
        self
    }

    pub fn config(&self) -> &CatalogConfig {
        &self.config
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    /// Scans `root` and returns its albums in catalog order.
    ///
    /// # Errors
    ///
    /// - [`ScanError::RootInaccessible`] when the root cannot be read
    /// - [`ScanError::Cancelled`] when `cancel` fires before the scan ends
    #[instrument(skip(self, root, cancel), fields(root = %root.display()))]
    pub async fn scan(&self, root: &Path, cancel: CancellationToken) -> Result<Vec<Album>> {
        let started = Instant::now();
        let root_label = root.display().to_string();
        self.emit(ScanEvent::Started {
            root: root_label.clone(),
        });

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => Err(ScanError::Cancelled),
            result = self.run(root, &cancel) => result,
        };

        // Checked again so a cancel that lands after the pipeline finished
        // still leaves the cache untouched.
        let outcome = match outcome {
            Ok(_) if cancel.is_cancelled() => Err(ScanError::Cancelled),
            other => other,
        };

        match outcome {
            Ok(outcome) => {
                if !outcome.from_cache {
                    self.persist(&outcome).await;
                }

                let duration_ms = started.elapsed().as_millis() as u64;
                info!(
                    albums = outcome.albums.len(),
                    from_cache = outcome.from_cache,
                    duration_ms,
                    "Scan completed"
                );
                self.emit(ScanEvent::Completed {
                    root: root_label,
                    album_count: outcome.albums.len(),
                    from_cache: outcome.from_cache,
                    duration_ms,
                });
                Ok(outcome.albums)
            }
            Err(ScanError::Cancelled) => {
                info!("Scan cancelled");
                self.emit(ScanEvent::Cancelled { root: root_label });
                Err(ScanError::Cancelled)
            }
            Err(e) => {
                warn!(error = %e, "Scan failed");
                self.emit(ScanEvent::Failed {
                    root: root_label,
                    message: e.to_string(),
                });
                Err(e)
            }
        }
    }

    async fn run(&self, root: &Path, cancel: &CancellationToken) -> Result<ScanOutcome> {
        let discovery = self.discover(root).await?;
        self.emit(ScanEvent::FoldersDiscovered {
            root: discovery.root.display().to_string(),
            folder_count: discovery.folders.len(),
            file_count: discovery.signature.len(),
        });

        if self.config.use_cache {
            if let Some(albums) = self.cache.load(&discovery.root, &discovery.signature).await {
                info!(albums = albums.len(), "Catalog restored from cache");
                self.emit(ScanEvent::CacheHit {
                    root: discovery.root.display().to_string(),
                    album_count: albums.len(),
                });
                return Ok(ScanOutcome {
                    albums,
                    from_cache: true,
                    discovery,
                });
            }
        }

        info!(folders = discovery.folders.len(), "Extracting album folders");
        let mut albums = self.extract_folders(&discovery, cancel).await?;

        if !discovery.root.is_dir() {
            return Err(ScanError::root_inaccessible(
                &discovery.root,
                "root disappeared during scan",
            ));
        }

        sort_albums(&mut albums);
        Ok(ScanOutcome {
            albums,
            from_cache: false,
            discovery,
        })
    }

    async fn persist(&self, outcome: &ScanOutcome) {
        if !self.config.use_cache {
            return;
        }

        let discovery = &outcome.discovery;
        if let Err(e) = self
            .cache
            .save(&outcome.albums, &discovery.root, &discovery.signature)
            .await
        {
            warn!(error = %e, "Failed to persist catalog cache");
        }
    }

    async fn discover(&self, root: &Path) -> Result<Discovery> {
        let root = tokio::fs::canonicalize(root)
            .await
            .map_err(|e| ScanError::root_inaccessible(root, e))?;

        let walker = DirectoryWalker::from_config(&self.config);
        let signatures = SignatureBuilder::new(self.config.audio_extensions.clone());
        let span = Span::current();

        tokio::task::spawn_blocking(move || {
            span.in_scope(|| -> Result<Discovery> {
                let folders = walker.album_folders(&root)?;
                let signature = signatures.build(&folders);
                Ok(Discovery {
                    root,
                    folders,
                    signature,
                })
            })
        })
        .await
        .map_err(|e| ScanError::Task(e.to_string()))?
    }

    async fn extract_folders(
        &self,
        discovery: &Discovery,
        cancel: &CancellationToken,
    ) -> Result<Vec<Album>> {
        let context = Arc::new(FolderContext {
            signatures: SignatureBuilder::new(self.config.audio_extensions.clone()),
            extractor: MetadataExtractor::new(Arc::clone(&self.reader)),
            covers: CoverArtLocator::new(self.config.cover_file_names.clone()),
            assembler: AlbumAssembler::new(
                discovery.root.clone(),
                ArtistHeuristics::from(self.config.artist_heuristics),
            ),
            cancel: cancel.clone(),
        });

        let results: Vec<_> = stream::iter(discovery.folders.clone())
            .map(|folder| {
                let context = Arc::clone(&context);
                let span = Span::current();
                tokio::task::spawn_blocking(move || {
                    span.in_scope(|| process_folder(&context, &folder))
                })
            })
            .buffer_unordered(self.config.max_concurrent_folders.max(1))
            .collect()
            .await;

        let mut albums = Vec::with_capacity(results.len());
        for result in results {
            if let Some(album) = result.map_err(|e| ScanError::Task(e.to_string()))?? {
                albums.push(album);
            }
        }
        Ok(albums)
    }

    fn emit(&self, event: ScanEvent) {
        if let Some(bus) = &self.event_bus {
            bus.emit(CoreEvent::Scan(event)).ok();
        }
    }
}

fn process_folder(context: &FolderContext, folder: &Path) -> Result<Option<Album>> {
    let files = match context.signatures.tracked_files(folder) {
        Ok(files) => files,
        Err(e) => {
            warn!(folder = %folder.display(), error = %e, "Album folder unreadable; skipping");
            return Ok(None);
        }
    };

    // Files are opened once; the first embedded cover in folder order wins
    let mut raw_tracks = Vec::with_capacity(files.len());
    let mut embedded = None;
    for file in &files {
        if context.cancel.is_cancelled() {
            return Err(ScanError::Cancelled);
        }

        match context.extractor.extract_track(file, embedded.is_none()) {
            Ok(extracted) => {
                if embedded.is_none() {
                    embedded = extracted.cover;
                }
                raw_tracks.push(extracted.raw);
            }
            Err(e) => {
                let name = file.to_string_lossy();
                warn!(file = %strip_path(&name), error = %e, "Skipping unparseable file");
            }
        }
    }

    if raw_tracks.is_empty() {
        debug!(folder = %folder.display(), "No parseable tracks in folder");
        return Ok(None);
    }

    let cover = context.covers.locate(folder, embedded);

    Ok(context.assembler.assemble(folder, raw_tracks, cover))
}
