//! DriftKV - An Embedded Key-Value Store with Expiration and Snapshots
//!
//! Standalone host for the store: reads configuration from flags or the
//! environment, restores the latest snapshot, keeps the background tasks
//! running until Ctrl+C, then shuts down with a final snapshot.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use driftkv::{Store, StoreConfig};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

/// Durable backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Backend {
    /// JSON document replaced atomically on every snapshot
    File,
    /// Versioned rows in an SQLite database
    Sqlite,
}

/// DriftKV Store
#[derive(Parser, Debug)]
#[command(name = "driftkv")]
#[command(about = "Embedded key-value store with expiration and snapshots")]
#[command(version)]
struct Args {
    /// Seconds between periodic snapshots
    #[arg(long, env = "SAVE_DURATION", default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    save_duration: u64,

    /// Seconds between expiry sweeps
    #[arg(long, env = "CLEAR_DURATION", default_value = "60", value_parser = clap::value_parser!(u64).range(1..))]
    clear_duration: u64,

    /// Snapshot file (or SQLite database) path
    #[arg(long, env = "STORAGE_FILENAME", default_value = driftkv::config::DEFAULT_FILENAME)]
    storage_filename: PathBuf,

    /// Durable backend
    #[arg(long, env = "STORAGE_BACKEND", value_enum, default_value = "file")]
    backend: Backend,
}

impl Args {
    fn store_config(&self) -> StoreConfig {
        let builder = StoreConfig::builder()
            .snapshot_interval(Duration::from_secs(self.save_duration))
            .sweep_interval(Duration::from_secs(self.clear_duration));

        match self.backend {
            Backend::File => builder.file(&self.storage_filename),
            Backend::Sqlite => builder.sqlite(&self.storage_filename),
        }
        .build()
    }
}

fn print_banner(args: &Args) {
    println!(
        r#"
DriftKV v{} - Embedded Key-Value Store
──────────────────────────────────────────────────────────────
Backend:   {:?} ({})
Snapshots: every {}s
Sweeps:    every {}s

Use Ctrl+C to shutdown gracefully.
"#,
        driftkv::VERSION,
        args.backend,
        args.storage_filename.display(),
        args.save_duration,
        args.clear_duration,
    );
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Set up logging
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .init();

    print_banner(&args);

    let store = match Store::open(args.store_config()).await {
        Ok(store) => store,
        Err(e) => {
            error!(error = %e, "Failed to open store");
            return Err(e.into());
        }
    };

    let stats = store.engine().stats();
    info!(scalars = stats.scalars, lists = stats.lists, "Store ready");

    signal::ctrl_c().await?;
    info!("Shutdown signal received, stopping store...");

    store.stop().await?;
    info!("Shutdown complete");
    Ok(())
}
