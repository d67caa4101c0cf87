//! Catalog service façade.
//!
//! This crate wires the scanner, the persisted catalog cache and the event
//! bus into the single handle host applications talk to. The service owns
//! the current in-memory catalog: a successful scan replaces it as a whole,
//! while a failed or cancelled scan leaves it untouched. Readers take cheap
//! `Arc` snapshots and never observe a half-built catalog.
//!
//! ```ignore
//! use core_runtime::config::CatalogConfig;
//! use core_service::CatalogService;
//!
//! let service = CatalogService::new(CatalogConfig::builder().build()?)?;
//! let albums = service.scan(Path::new("/music")).await?;
//! println!("{} albums", albums.len());
//! ```

pub mod error;

pub use error::{CoreError, Result};

use std::path::Path;
use std::sync::Arc;

use core_library::cache::CacheStore;
use core_library::models::Album;
use core_metadata::source::{LoftyTagReader, TagReader};
use core_runtime::config::CatalogConfig;
use core_runtime::events::{CoreEvent, EventBus, LibraryEvent, Receiver};
use core_sync::LibraryScanner;
use tokio::sync::{Mutex, RwLock};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

/// Primary façade exposed to host applications.
pub struct CatalogService {
    scanner: LibraryScanner,
    cache: Arc<CacheStore>,
    event_bus: EventBus,
    catalog: RwLock<Arc<Vec<Album>>>,
    current_scan: Mutex<Option<CancellationToken>>,
}

impl CatalogService {
    /// Create a service that reads tags from real audio files.
    pub fn new(config: CatalogConfig) -> Result<Self> {
        Self::with_reader(config, Arc::new(LoftyTagReader::new()))
    }

    /// Create a service backed by a custom tag reader.
    pub fn with_reader(config: CatalogConfig, reader: Arc<dyn TagReader>) -> Result<Self> {
        config.validate()?;

        let event_bus = EventBus::default();
        let cache = Arc::new(CacheStore::new(config.cache_dir.clone()));
        let scanner = LibraryScanner::new(config, Arc::clone(&cache), reader)
            .with_event_bus(event_bus.clone());

        Ok(Self {
            scanner,
            cache,
            event_bus,
            catalog: RwLock::new(Arc::new(Vec::new())),
            current_scan: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &CatalogConfig {
        self.scanner.config()
    }

    /// Scans `root` and replaces the in-memory catalog with the result.
    ///
    /// A scan still in flight when another one starts is cancelled and
    /// returns [`ScanError::Cancelled`](core_sync::ScanError::Cancelled),
    /// so only the newest scan can replace the catalog.
    #[instrument(skip(self, root), fields(root = %root.display()))]
    pub async fn scan(&self, root: &Path) -> Result<Arc<Vec<Album>>> {
        let token = CancellationToken::new();
        if let Some(superseded) = self.current_scan.lock().await.replace(token.clone()) {
            if !superseded.is_cancelled() {
                debug!("Cancelling superseded scan");
            }
            superseded.cancel();
        }

        let albums = Arc::new(self.scanner.scan(root, token).await?);
        let track_count: usize = albums.iter().map(|a| a.tracks.len()).sum();

        *self.catalog.write().await = Arc::clone(&albums);
        info!(albums = albums.len(), tracks = track_count, "Catalog replaced");

        self.event_bus
            .emit(CoreEvent::Library(LibraryEvent::CatalogReplaced {
                root: root.display().to_string(),
                album_count: albums.len(),
                track_count,
            }))
            .ok();
        Ok(albums)
    }

    /// Snapshot of the current catalog.
    pub async fn albums(&self) -> Arc<Vec<Album>> {
        Arc::clone(&*self.catalog.read().await)
    }

    /// Cancels the scan in flight, if any.
    pub async fn cancel_scan(&self) {
        if let Some(token) = self.current_scan.lock().await.as_ref() {
            token.cancel();
        }
    }

    /// Discards every persisted scan. The in-memory catalog is kept.
    pub async fn clear_cache(&self) -> Result<()> {
        self.cache.clear().await?;
        info!(cache_dir = %self.cache.cache_dir().display(), "Catalog cache cleared");
        self.event_bus
            .emit(CoreEvent::Library(LibraryEvent::CacheCleared))
            .ok();
        Ok(())
    }

    /// Subscribe to scan and catalog lifecycle events.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.event_bus.subscribe()
    }
}
