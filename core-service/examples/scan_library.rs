//! Library scan demonstration
//!
//! Scans a music folder, prints the resulting catalog and the lifecycle
//! events published along the way. Press Ctrl-C to cancel a running scan.
//!
//! Run with:
//! ```bash
//! cargo run -p core-service --example scan_library -- ~/Music
//!
//! # Drop the persisted catalog first
//! cargo run -p core-service --example scan_library -- ~/Music --clear
//!
//! # JSON logs
//! cargo run -p core-service --example scan_library -- ~/Music --json
//! ```

use anyhow::Context;
use core_runtime::config::CatalogConfig;
use core_runtime::logging::{init_logging, LogFormat, LoggingConfig};
use core_service::CatalogService;
use std::env;
use std::path::PathBuf;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args: Vec<String> = env::args().skip(1).collect();
    let root = args
        .iter()
        .find(|a| !a.starts_with("--"))
        .map(PathBuf::from)
        .context("usage: scan_library <music-folder> [--clear] [--json]")?;

    let format = if args.iter().any(|a| a == "--json") {
        LogFormat::Json
    } else {
        LogFormat::Pretty
    };
    init_logging(LoggingConfig::default().with_format(format))?;

    let config = CatalogConfig::builder().build()?;
    info!(cache_dir = %config.cache_dir.display(), "Using catalog cache");
    let service = CatalogService::new(config)?;

    if args.iter().any(|a| a == "--clear") {
        service.clear_cache().await?;
    }

    let mut events = service.subscribe();
    let printer = tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            println!("[{:?}] {}", event.severity(), event.description());
        }
    });

    let albums = tokio::select! {
        result = service.scan(&root) => result.context("scan failed")?,
        _ = tokio::signal::ctrl_c() => {
            service.cancel_scan().await;
            anyhow::bail!("scan cancelled");
        }
    };

    for album in albums.iter() {
        let year = album.year.as_deref().unwrap_or("----");
        let cover = if album.cover.is_some() { "cover" } else { "no cover" };
        println!("{} - {} ({}) [{}]", album.artist, album.title, year, cover);
        for track in &album.tracks {
            println!(
                "  {}.{:02} {} ({}s)",
                track.disc_number,
                track.track_number,
                track.title,
                track.duration / 1000
            );
        }
    }
    println!("{} albums", albums.len());

    drop(service);
    printer.await.ok();
    Ok(())
}
