//! Integration tests for library scanning
//!
//! These tests verify the complete scan workflow including:
//! - Album discovery, assembly and catalog ordering
//! - Cache hits without re-extraction
//! - Cache invalidation on file changes and schema changes
//! - Skipping unparseable files and folders
//! - Symlinked files and unwritable cache directories
//! - Cancellation and inaccessible roots

use core_library::cache::{CacheStore, CACHE_SCHEMA_VERSION};
use core_library::models::Album;
use core_metadata::source::{TagReader, TagSource};
use core_metadata::testing::{tag_fixture, TextTagReader};
use core_runtime::config::CatalogConfig;
use core_runtime::events::{CoreEvent, EventBus, ScanEvent};
use core_sync::{LibraryScanner, ScanError};
use std::fs::{self, File};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;

// ============================================================================
// Fixtures
// ============================================================================

struct TestLibrary {
    music: TempDir,
    cache: TempDir,
}

impl TestLibrary {
    fn new() -> Self {
        Self {
            music: TempDir::new().unwrap(),
            cache: TempDir::new().unwrap(),
        }
    }

    fn root(&self) -> PathBuf {
        fs::canonicalize(self.music.path()).unwrap()
    }

    fn write(&self, relative: &str, fields: &[(&str, &str)]) -> PathBuf {
        self.write_raw(relative, tag_fixture(fields).as_bytes())
    }

    fn write_raw(&self, relative: &str, bytes: &[u8]) -> PathBuf {
        let path = self.root().join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, bytes).unwrap();
        path
    }

    fn config(&self, use_cache: bool) -> CatalogConfig {
        CatalogConfig::builder()
            .cache_dir(self.cache.path())
            .max_concurrent_folders(4)
            .use_cache(use_cache)
            .build()
            .unwrap()
    }

    fn store(&self) -> CacheStore {
        CacheStore::new(self.cache.path())
    }

    fn scanner(&self, reader: Arc<dyn TagReader>) -> LibraryScanner {
        LibraryScanner::new(self.config(true), Arc::new(self.store()), reader)
    }

    fn cache_file(&self) -> PathBuf {
        self.store().cache_file_path(&self.root())
    }

    /// Two albums by different artists plus a loose cover image.
    fn populate(&self) {
        self.write(
            "Radiohead/OK Computer/02.mp3",
            &[
                ("title", "Paranoid Android"),
                ("artist", "Radiohead"),
                ("album", "OK Computer"),
                ("track_number", "2/12"),
                ("recording_date", "1997-05-21"),
            ],
        );
        self.write(
            "Radiohead/OK Computer/01.mp3",
            &[
                ("title", "Airbag"),
                ("artist", "Radiohead"),
                ("album", "OK Computer"),
                ("track_number", "1/12"),
            ],
        );
        self.write_raw("Radiohead/OK Computer/cover.jpg", b"JPEG");
        self.write(
            "Air/Moon Safari/01.flac",
            &[
                ("title", "La femme d'argent"),
                ("artist", "Air"),
                ("album", "Moon Safari"),
                ("track_number", "1"),
                ("basic.year", "1998"),
                ("front_cover", "EMBEDDED"),
            ],
        );
    }
}

/// Album contents without generated ids.
fn summary(albums: &[Album]) -> Vec<(String, String, Option<String>, Vec<String>)> {
    albums
        .iter()
        .map(|a| {
            (
                a.artist.clone(),
                a.title.clone(),
                a.year.clone(),
                a.tracks.iter().map(|t| t.title.clone()).collect(),
            )
        })
        .collect()
}

fn touch_later(path: &Path) {
    let file = File::options().write(true).open(path).unwrap();
    file.set_modified(SystemTime::now() + Duration::from_secs(3600))
        .unwrap();
}

/// Reader that cancels the scan on its first open.
struct CancellingReader {
    inner: TextTagReader,
    token: CancellationToken,
}

impl TagReader for CancellingReader {
    fn open(&self, path: &Path) -> core_metadata::Result<Box<dyn TagSource>> {
        self.token.cancel();
        self.inner.open(path)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[tokio::test]
async fn test_scan_builds_sorted_albums() {
    let library = TestLibrary::new();
    library.populate();
    let scanner = library.scanner(Arc::new(TextTagReader::new()));

    let albums = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(
        summary(&albums),
        vec![
            (
                "Air".to_string(),
                "Moon Safari".to_string(),
                Some("1998".to_string()),
                vec!["La femme d'argent".to_string()],
            ),
            (
                "Radiohead".to_string(),
                "OK Computer".to_string(),
                Some("1997".to_string()),
                vec!["Airbag".to_string(), "Paranoid Android".to_string()],
            ),
        ]
    );
    assert_eq!(albums[0].cover.as_deref(), Some(&b"EMBEDDED"[..]));
    assert_eq!(albums[1].cover.as_deref(), Some(&b"JPEG"[..]));
    assert!(library.cache_file().exists());
}

#[tokio::test]
async fn test_second_scan_is_cache_hit() {
    let library = TestLibrary::new();
    library.populate();
    let reader = Arc::new(TextTagReader::new());
    let scanner = library.scanner(reader.clone());

    let first = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    let opens = reader.open_count();
    assert_eq!(opens, 3, "one open per audio file");

    let second = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reader.open_count(), opens, "cache hit must not re-extract");
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_touching_a_track_invalidates_cache() {
    let library = TestLibrary::new();
    library.populate();
    let reader = Arc::new(TextTagReader::new());
    let scanner = library.scanner(reader.clone());

    let first = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    let opens = reader.open_count();

    touch_later(&library.root().join("Air/Moon Safari/01.flac"));
    let second = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert!(reader.open_count() > opens);
    assert_eq!(summary(&first), summary(&second));
}

#[tokio::test]
async fn test_untracked_files_do_not_invalidate_cache() {
    let library = TestLibrary::new();
    library.populate();
    let reader = Arc::new(TextTagReader::new());
    let scanner = library.scanner(reader.clone());

    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    let opens = reader.open_count();

    library.write_raw("Air/Moon Safari/notes.txt", b"liner notes");
    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reader.open_count(), opens);
}

#[tokio::test]
async fn test_stale_schema_version_is_not_reused() {
    let library = TestLibrary::new();
    library.populate();
    let reader = Arc::new(TextTagReader::new());
    let scanner = library.scanner(reader.clone());

    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    let opens = reader.open_count();

    let cache_file = library.cache_file();
    let mut json: serde_json::Value =
        serde_json::from_slice(&fs::read(&cache_file).unwrap()).unwrap();
    json["version"] = serde_json::json!(CACHE_SCHEMA_VERSION + 1);
    fs::write(&cache_file, serde_json::to_vec(&json).unwrap()).unwrap();

    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    assert!(reader.open_count() > opens);
}

#[tokio::test]
async fn test_unparseable_folder_yields_no_album() {
    let library = TestLibrary::new();
    library.populate();
    library.write_raw("Broken/Album/01.mp3", b"\x00\x01 not tags");
    library.write_raw("Broken/Album/02.mp3", b"garbage");
    // One bad file next to good ones is skipped, not fatal
    library.write_raw("Air/Moon Safari/99.flac", b"garbage");

    let scanner = library.scanner(Arc::new(TextTagReader::new()));
    let albums = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(albums.len(), 2);
    assert!(albums.iter().all(|a| a.title != "Album"));
    assert_eq!(albums[0].tracks.len(), 1);
}

#[tokio::test]
async fn test_cancelled_scan_writes_no_cache() {
    let library = TestLibrary::new();
    library.populate();
    let token = CancellationToken::new();
    let reader = Arc::new(CancellingReader {
        inner: TextTagReader::new(),
        token: token.clone(),
    });
    let bus = EventBus::new(16);
    let mut events = bus.subscribe();
    let scanner = library.scanner(reader).with_event_bus(bus);

    let result = scanner.scan(&library.root(), token).await;

    assert!(matches!(result, Err(ScanError::Cancelled)));
    assert!(!library.cache_file().exists());

    let mut last = None;
    while let Ok(event) = events.try_recv() {
        last = Some(event);
    }
    assert!(matches!(
        last,
        Some(CoreEvent::Scan(ScanEvent::Cancelled { .. }))
    ));
}

#[tokio::test]
async fn test_pre_cancelled_scan_fails() {
    let library = TestLibrary::new();
    library.populate();
    let scanner = library.scanner(Arc::new(TextTagReader::new()));
    let token = CancellationToken::new();
    token.cancel();

    let result = scanner.scan(&library.root(), token).await;
    assert!(matches!(result, Err(ScanError::Cancelled)));
    assert!(!library.cache_file().exists());
}

#[tokio::test]
async fn test_missing_root_fails() {
    let library = TestLibrary::new();
    let scanner = library.scanner(Arc::new(TextTagReader::new()));

    let result = scanner
        .scan(&library.root().join("missing"), CancellationToken::new())
        .await;
    assert!(matches!(result, Err(ScanError::RootInaccessible { .. })));
}

#[tokio::test]
async fn test_empty_root_yields_empty_catalog() {
    let library = TestLibrary::new();
    library.write_raw("docs/readme.txt", b"hello");
    let scanner = library.scanner(Arc::new(TextTagReader::new()));

    let albums = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    assert!(albums.is_empty());
}

#[tokio::test]
async fn test_cache_disabled_always_extracts() {
    let library = TestLibrary::new();
    library.populate();
    let reader = Arc::new(TextTagReader::new());
    let scanner = LibraryScanner::new(
        library.config(false),
        Arc::new(library.store()),
        reader.clone(),
    );

    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    let opens = reader.open_count();
    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(reader.open_count(), opens * 2);
    assert!(!library.cache_file().exists());
}

#[tokio::test]
async fn test_cold_scan_opens_each_file_once() {
    let library = TestLibrary::new();
    for n in 1..=10 {
        library.write(
            &format!("Bonobo/Black Sands/{:02}.flac", n),
            &[
                ("title", &format!("Track {}", n)),
                ("artist", "Bonobo"),
                ("album", "Black Sands"),
                ("track_number", &n.to_string()),
            ],
        );
    }
    let reader = Arc::new(TextTagReader::new());
    let scanner = library.scanner(reader.clone());

    let albums = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(albums.len(), 1);
    assert_eq!(albums[0].tracks.len(), 10);
    assert_eq!(albums[0].cover, None);
    assert_eq!(reader.open_count(), 10);
}

#[tokio::test]
async fn test_first_embedded_cover_in_folder_order_wins() {
    let library = TestLibrary::new();
    let album = [("artist", "Portishead"), ("album", "Dummy")];
    library.write("Portishead/Dummy/01.mp3", &[&album[..], &[("title", "Mysterons")]].concat());
    library.write(
        "Portishead/Dummy/02.mp3",
        &[&album[..], &[("title", "Sour Times"), ("attached_picture", "SECOND")]].concat(),
    );
    library.write(
        "Portishead/Dummy/03.mp3",
        &[&album[..], &[("title", "Strangers"), ("front_cover", "THIRD")]].concat(),
    );
    library.write_raw("Portishead/Dummy/cover.jpg", b"SIDECAR");
    let reader = Arc::new(TextTagReader::new());
    let scanner = library.scanner(reader.clone());

    let albums = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(albums[0].cover.as_deref(), Some(&b"SECOND"[..]));
    assert_eq!(reader.open_count(), 3);
}

#[tokio::test]
async fn test_unwritable_cache_dir_does_not_fail_scan() {
    let library = TestLibrary::new();
    library.populate();
    let blocker = library.cache.path().join("not-a-dir");
    fs::write(&blocker, b"occupied").unwrap();

    let config = CatalogConfig::builder()
        .cache_dir(&blocker)
        .max_concurrent_folders(4)
        .build()
        .unwrap();
    let reader = Arc::new(TextTagReader::new());
    let scanner = LibraryScanner::new(config, Arc::new(CacheStore::new(&blocker)), reader.clone());

    let first = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(first.len(), 2);
    let opens = reader.open_count();

    let second = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(summary(&first), summary(&second));
    assert_eq!(reader.open_count(), opens * 2, "nothing was persisted");
    assert!(blocker.is_file());
}

#[cfg(unix)]
#[tokio::test]
async fn test_symlinked_tracks_are_ignored() {
    use std::os::unix::fs::symlink;

    let library = TestLibrary::new();
    let outside = TempDir::new().unwrap();
    let target = outside.path().join("elsewhere.mp3");
    fs::write(
        &target,
        tag_fixture(&[("title", "Linked"), ("artist", "Nobody"), ("album", "Linked")]),
    )
    .unwrap();

    library.write(
        "Mixed/Album/01.mp3",
        &[("title", "Real"), ("artist", "Somebody"), ("album", "Album")],
    );
    symlink(&target, library.root().join("Mixed/Album/02.mp3")).unwrap();
    fs::create_dir_all(library.root().join("Linked")).unwrap();
    symlink(&target, library.root().join("Linked/01.mp3")).unwrap();

    let reader = Arc::new(TextTagReader::new());
    let scanner = library.scanner(reader.clone());

    let albums = scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        summary(&albums),
        vec![(
            "Somebody".to_string(),
            "Album".to_string(),
            None,
            vec!["Real".to_string()],
        )]
    );
    assert_eq!(reader.open_count(), 1);

    // The link target is outside the signature, so changing it keeps the cache
    touch_later(&target);
    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(reader.open_count(), 1);
}

#[tokio::test]
async fn test_cache_hit_events() {
    let library = TestLibrary::new();
    library.populate();
    let bus = EventBus::new(32);
    let scanner = library
        .scanner(Arc::new(TextTagReader::new()))
        .with_event_bus(bus.clone());

    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    let mut events = bus.subscribe();
    scanner
        .scan(&library.root(), CancellationToken::new())
        .await
        .unwrap();

    let mut received = Vec::new();
    while let Ok(event) = events.try_recv() {
        received.push(event);
    }

    assert!(matches!(
        received.first(),
        Some(CoreEvent::Scan(ScanEvent::Started { .. }))
    ));
    assert!(received
        .iter()
        .any(|e| matches!(e, CoreEvent::Scan(ScanEvent::CacheHit { album_count: 2, .. }))));
    assert!(matches!(
        received.last(),
        Some(CoreEvent::Scan(ScanEvent::Completed {
            from_cache: true,
            album_count: 2,
            ..
        }))
    ));
}
