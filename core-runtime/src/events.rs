//! # Event Bus System
//!
//! Provides lifecycle notifications for the catalog core using
//! `tokio::sync::broadcast`.
//!
//! ## Overview
//!
//! The event bus system consists of:
//! - **Event Types**: `ScanEvent` for the scan lifecycle and `LibraryEvent`
//!   for changes to the consumer-visible catalog
//! - **EventBus**: Central broadcast channel for publishing events
//!
//! A scan never streams partial albums through the bus. Subscribers learn that
//! a scan started, whether the cache answered it, and how it ended; the album
//! list itself is only ever handed over as a whole.
//!
//! ## Usage
//!
//! ```ignore
//! use core_runtime::events::{CoreEvent, EventBus, ScanEvent};
//!
//! # #[tokio::main]
//! # async fn main() {
//! let event_bus = EventBus::new(16);
//! let mut subscriber = event_bus.subscribe();
//!
//! event_bus
//!     .emit(CoreEvent::Scan(ScanEvent::Started {
//!         root: "/music".to_string(),
//!     }))
//!     .ok();
//!
//! let event = subscriber.recv().await.unwrap();
//! assert_eq!(event.description(), "Scan started");
//! # }
//! ```
//!
//! ## Error Handling
//!
//! `emit` fails only when nobody is subscribed; callers ignore that with
//! `.ok()`. Slow subscribers receive `RecvError::Lagged(n)` and continue from
//! the oldest retained event.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;

pub use tokio::sync::broadcast::error::{RecvError, SendError};
pub use tokio::sync::broadcast::Receiver;

/// Default buffer size for the event bus channel.
pub const DEFAULT_EVENT_BUFFER_SIZE: usize = 64;

/// Top-level event enum encompassing all event categories.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", content = "payload")]
pub enum CoreEvent {
    /// Scan lifecycle events
    Scan(ScanEvent),
    /// Catalog-level events
    Library(LibraryEvent),
}

impl CoreEvent {
    /// Returns a human-readable description of the event.
    pub fn description(&self) -> &str {
        match self {
            CoreEvent::Scan(e) => e.description(),
            CoreEvent::Library(e) => e.description(),
        }
    }

    /// Returns the severity level of the event.
    pub fn severity(&self) -> EventSeverity {
        match self {
            CoreEvent::Scan(ScanEvent::Failed { .. }) => EventSeverity::Error,
            CoreEvent::Scan(ScanEvent::Cancelled { .. }) => EventSeverity::Warning,
            CoreEvent::Scan(ScanEvent::Completed { .. }) => EventSeverity::Info,
            CoreEvent::Library(_) => EventSeverity::Info,
            _ => EventSeverity::Debug,
        }
    }
}

/// Event severity levels for filtering and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EventSeverity {
    Debug,
    Info,
    Warning,
    Error,
}

/// Events emitted over the life of one scan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum ScanEvent {
    /// A scan of `root` began.
    Started { root: String },
    /// Album folders were enumerated and the signature was built.
    FoldersDiscovered {
        root: String,
        folder_count: usize,
        file_count: usize,
    },
    /// The persisted catalog matched the current signature.
    CacheHit { root: String, album_count: usize },
    /// The scan produced a complete album list.
    Completed {
        root: String,
        album_count: usize,
        from_cache: bool,
        duration_ms: u64,
    },
    /// The scan failed; nothing was persisted.
    Failed { root: String, message: String },
    /// The scan was cancelled; nothing was persisted.
    Cancelled { root: String },
}

impl ScanEvent {
    fn description(&self) -> &str {
        match self {
            ScanEvent::Started { .. } => "Scan started",
            ScanEvent::FoldersDiscovered { .. } => "Album folders discovered",
            ScanEvent::CacheHit { .. } => "Catalog restored from cache",
            ScanEvent::Completed { .. } => "Scan completed",
            ScanEvent::Failed { .. } => "Scan failed",
            ScanEvent::Cancelled { .. } => "Scan cancelled",
        }
    }
}

/// Events describing the consumer-visible catalog.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "event")]
pub enum LibraryEvent {
    /// The in-memory catalog was replaced as a whole.
    CatalogReplaced {
        root: String,
        album_count: usize,
        track_count: usize,
    },
    /// Every persisted scan was discarded.
    CacheCleared,
}

impl LibraryEvent {
    fn description(&self) -> &str {
        match self {
            LibraryEvent::CatalogReplaced { .. } => "Catalog replaced",
            LibraryEvent::CacheCleared => "Catalog cache cleared",
        }
    }
}

/// Central event bus for publishing and subscribing to events.
///
/// Uses `tokio::sync::broadcast` internally, which provides:
/// - Multiple producers (clone the `EventBus`)
/// - Multiple consumers (each `subscribe()` creates a new receiver)
/// - Non-blocking sends
/// - Lagging detection (slow subscribers get `RecvError::Lagged`)
#[derive(Clone)]
pub struct EventBus {
    sender: broadcast::Sender<CoreEvent>,
}

impl EventBus {
    /// Creates a new event bus with the specified buffer size.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Publishes an event to all subscribers.
    ///
    /// Returns the number of subscribers that received the event, or an
    /// error if there are no active subscribers.
    pub fn emit(&self, event: CoreEvent) -> Result<usize, SendError<CoreEvent>> {
        self.sender.send(event)
    }

    /// Creates a new subscriber. Past events are not replayed.
    pub fn subscribe(&self) -> Receiver<CoreEvent> {
        self.sender.subscribe()
    }

    /// Returns the number of active subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(DEFAULT_EVENT_BUFFER_SIZE)
    }
}

impl fmt::Debug for EventBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriber_count", &self.subscriber_count())
            .finish()
    }
}
