//! # Library Module
//!
//! Owns the catalog domain: albums, tracks, and the rules that turn per-file
//! tag records into them.
//!
//! ## Overview
//!
//! This crate manages:
//! - Domain models (`Album`, `Track`, `RawTrack`) and their cache encoding
//! - Album artist resolution with delimiter normalization and heuristics
//! - Album assembly and track/album ordering
//! - Folder signatures and the signature-keyed on-disk catalog cache

pub mod artist;
pub mod assembler;
pub mod cache;
pub mod error;
pub mod models;
pub mod signature;

pub use artist::{choose_album_artist, normalize_artist_delimiters, ArtistHeuristics};
pub use assembler::AlbumAssembler;
pub use cache::{CacheContainer, CacheStore, CACHE_SCHEMA_VERSION};
pub use error::{LibraryError, Result};
pub use models::{sort_albums, Album, AlbumId, ExternalIds, RawTrack, Track, TrackId};
pub use signature::{CacheSignature, SignatureBuilder, SignatureEntry};
