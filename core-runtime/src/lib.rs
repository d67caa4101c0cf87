//! # Core Runtime Module
//!
//! Provides foundational runtime infrastructure for the music catalog core:
//! - Logging and tracing infrastructure
//! - Configuration management
//! - Scan lifecycle event bus
//!
//! ## Overview
//!
//! This crate contains the runtime utilities that the library, metadata and
//! scanning crates depend on. It establishes the logging conventions, the
//! validated configuration value handed to the scanner, and the broadcast
//! mechanism used to announce scan and catalog lifecycle changes.

pub mod config;
pub mod error;
pub mod events;
pub mod logging;

pub use config::{CatalogConfig, CatalogConfigBuilder};
pub use error::{Error, Result};
