//! # Scan Module
//!
//! Orchestrates scanning of a local library root into an album catalog.
//!
//! ## Overview
//!
//! This module manages the lifecycle of a scan:
//! - Discovering album folders under a root (`walker`)
//! - Fingerprinting tracked files and consulting the catalog cache
//! - Extracting tags and covers on a bounded pool of blocking workers
//! - Assembling, sorting and persisting the resulting albums
//!
//! ## Components
//!
//! - **Directory Walker** (`walker`): Finds album folders, skipping hidden
//!   entries and package directories
//! - **Library Scanner** (`scanner`): Runs one cancellable scan end to end

pub mod error;
pub mod scanner;
pub mod walker;

pub use error::{Result, ScanError};
pub use scanner::LibraryScanner;
pub use walker::DirectoryWalker;
