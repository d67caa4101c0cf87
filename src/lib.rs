//! Workspace facade crate.
//!
//! Re-exports the catalog service together with the configuration, event and
//! model types a host application needs, so hosts can depend on
//! `music-catalog` alone instead of wiring each workspace crate.

pub use core_library::models::{Album, AlbumId, ExternalIds, Track, TrackId};
pub use core_runtime::config::{CatalogConfig, CatalogConfigBuilder};
pub use core_runtime::events::{CoreEvent, LibraryEvent, ScanEvent};
pub use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
pub use core_service::{CatalogService, CoreError, Result};
