//! Integration tests for metadata extraction
//!
//! Real audio parsing is exercised through error paths only (no audio
//! fixtures are checked in); tag resolution runs against text fixtures.

use core_metadata::artwork::CoverArtLocator;
use core_metadata::extractor::MetadataExtractor;
use core_metadata::testing::{tag_fixture, TextTagReader};
use core_metadata::MetadataError;
use std::fs;
use std::sync::Arc;
use tempfile::TempDir;

#[test]
fn test_extract_missing_file() {
    let dir = TempDir::new().unwrap();
    let extractor = MetadataExtractor::lofty();

    let result = extractor.extract(&dir.path().join("nonexistent.mp3"));
    assert!(matches!(result, Err(MetadataError::FileNotFound(_))));
}

#[test]
fn test_extract_corrupted_file() {
    let dir = TempDir::new().unwrap();
    let corrupt_path = dir.path().join("corrupt.mp3");
    fs::write(&corrupt_path, b"This is not a valid audio file").unwrap();

    let extractor = MetadataExtractor::lofty();
    assert!(extractor.extract(&corrupt_path).is_err(), "Should fail for corrupted file");
}

#[test]
fn test_failed_file_does_not_affect_siblings() {
    let dir = TempDir::new().unwrap();
    let good = dir.path().join("01.mp3");
    let bad = dir.path().join("02.mp3");
    fs::write(&good, tag_fixture(&[("title", "Good"), ("track_number", "1")])).unwrap();
    fs::write(&bad, b"\xff\xfb garbage").unwrap();

    let extractor = MetadataExtractor::new(Arc::new(TextTagReader::new()));
    let results: Vec<_> = [&good, &bad, &good]
        .iter()
        .map(|p| extractor.extract(p))
        .collect();

    assert!(results[0].is_ok());
    assert!(results[1].is_err());
    assert_eq!(results[2].as_ref().unwrap().title, "Good");
}

#[test]
fn test_tags_and_cover_come_from_one_open() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("01.flac");
    fs::write(
        &path,
        tag_fixture(&[
            ("title", "Song"),
            ("artist", "Band"),
            ("album", "Record"),
            ("front_cover", "IMG"),
        ]),
    )
    .unwrap();
    fs::write(dir.path().join("cover.jpg"), b"SIDECAR").unwrap();

    let reader = Arc::new(TextTagReader::new());
    let extractor = MetadataExtractor::new(reader.clone());
    let locator = CoverArtLocator::new(vec!["cover.jpg".to_string()]);

    let extracted = extractor.extract_track(&path, true).unwrap();
    assert_eq!(extracted.raw.album, "Record");
    assert_eq!(extracted.raw.locator, path);

    let cover = locator.locate(dir.path(), extracted.cover);
    assert_eq!(cover, Some(b"IMG".to_vec()));
    assert_eq!(reader.open_count(), 1);
}
