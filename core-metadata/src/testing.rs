//! Text-fixture [`TagReader`] for tests.
//!
//! Fixture files are plain text: a `#tags` header line followed by
//! `key=value` lines. Keys are [`TagField::name`]s for named properties,
//! `basic.<name>` for [`BasicField`]s, `front_cover` / `attached_picture`
//! for pictures (the value's bytes become the image) and `duration_ms`.
//! Anything without the header fails to open as a corrupted file.
//!
//! ```ignore
//! std::fs::write(&path, tag_fixture(&[("title", "Song"), ("track_number", "3/12")]))?;
//! let reader = TextTagReader::new();
//! let source = reader.open(&path)?;
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::error::{MetadataError, Result};
use crate::source::{BasicField, PictureKind, TagField, TagReader, TagSource};

pub const FIXTURE_HEADER: &str = "#tags";

/// Renders fixture file contents.
pub fn tag_fixture(fields: &[(&str, &str)]) -> String {
    let mut out = String::from(FIXTURE_HEADER);
    out.push('\n');
    for (key, value) in fields {
        out.push_str(key);
        out.push('=');
        out.push_str(value);
        out.push('\n');
    }
    out
}

/// Reads fixture files and counts how often it was asked to.
#[derive(Debug, Default)]
pub struct TextTagReader {
    opens: AtomicUsize,
}

impl TextTagReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `open` calls so far, failed ones included.
    pub fn open_count(&self) -> usize {
        self.opens.load(Ordering::SeqCst)
    }
}

impl TagReader for TextTagReader {
    fn open(&self, path: &Path) -> Result<Box<dyn TagSource>> {
        self.opens.fetch_add(1, Ordering::SeqCst);

        let bytes = match fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(MetadataError::FileNotFound(path.display().to_string()))
            }
            Err(e) => return Err(e.into()),
        };
        let text = String::from_utf8(bytes)
            .map_err(|_| MetadataError::CorruptedFile(path.display().to_string()))?;

        let mut lines = text.lines();
        if lines.next().map(str::trim) != Some(FIXTURE_HEADER) {
            return Err(MetadataError::CorruptedFile(path.display().to_string()));
        }

        let values = lines
            .filter_map(|line| line.split_once('='))
            .map(|(k, v)| (k.trim().to_string(), v.to_string()))
            .collect();

        Ok(Box::new(TextTagSource { values }))
    }
}

struct TextTagSource {
    values: HashMap<String, String>,
}

impl TagSource for TextTagSource {
    fn basic(&self, field: BasicField) -> Option<String> {
        self.values.get(&format!("basic.{}", field.name())).cloned()
    }

    fn property(&self, field: TagField) -> Option<String> {
        self.values.get(field.name()).cloned()
    }

    fn picture(&self, kind: PictureKind) -> Option<Vec<u8>> {
        let key = match kind {
            PictureKind::FrontCover => "front_cover",
            PictureKind::AnyAttached => "attached_picture",
        };
        self.values.get(key).map(|v| v.as_bytes().to_vec())
    }

    fn duration(&self) -> Option<Duration> {
        self.values
            .get("duration_ms")
            .and_then(|v| v.trim().parse().ok())
            .map(Duration::from_millis)
    }
}
