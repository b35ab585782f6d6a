//! Durable snapshots of the key space.
//!
//! A snapshot is the whole key space encoded as one JSON document. It is
//! written to a [`SnapshotSink`] on a timer and once more during
//! shutdown, and read back once at startup.
//!
//! Two sinks are provided:
//! - [`FileSink`]: write to a temp file next to the destination, then
//!   atomically rename it over the destination.
//! - [`SqliteSink`]: insert a new versioned row and keep only the most
//!   recent [`sqlite::RETAINED_VERSIONS`] rows.
//!
//! Sinks are synchronous; callers on the async runtime go through
//! [`save`] / [`load`], which run the sink on Tokio's blocking pool.

pub mod file;
pub mod sqlite;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::error::SinkError;
use crate::storage::StorageEngine;

pub use file::FileSink;
pub use sqlite::SqliteSink;

/// A durable target for snapshots.
pub trait SnapshotSink: Send + Sync + 'static {
    /// Durably stores `payload` as the latest snapshot.
    fn save(&self, payload: &[u8]) -> Result<(), SinkError>;

    /// Returns the latest snapshot, or `None` if nothing was saved yet.
    fn load(&self) -> Result<Option<Bytes>, SinkError>;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Which durable backend to use.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkConfig {
    /// A JSON file at `path`.
    File { path: PathBuf },
    /// An SQLite database at `path`.
    Sqlite { path: PathBuf },
}

impl SinkConfig {
    /// Opens the configured backend. Fails if it cannot be reached.
    pub fn open(&self) -> Result<Arc<dyn SnapshotSink>, SinkError> {
        Ok(match self {
            SinkConfig::File { path } => Arc::new(FileSink::open(path)?),
            SinkConfig::Sqlite { path } => Arc::new(SqliteSink::open(path)?),
        })
    }
}

/// Loads the latest snapshot on the blocking pool.
pub async fn load(sink: Arc<dyn SnapshotSink>) -> Result<Option<Bytes>, SinkError> {
    tokio::task::spawn_blocking(move || sink.load()).await?
}

/// Encodes the engine under its lock, then writes the payload on the
/// blocking pool with the lock released.
///
/// Concurrent saves of one engine are queued, so a payload encoded later
/// is never overwritten by one encoded earlier.
pub async fn save(engine: &StorageEngine, sink: Arc<dyn SnapshotSink>) -> Result<usize, SinkError> {
    let _gate = engine.snapshot_gate().lock().await;
    let payload = engine.encode_snapshot()?;
    let size = payload.len();
    tokio::task::spawn_blocking(move || sink.save(&payload)).await??;
    Ok(size)
}

/// Spawns the periodic snapshot loop on the current Tokio runtime.
///
/// A failed snapshot is logged and the loop keeps its schedule.
pub(crate) fn spawn_snapshotter(
    engine: Arc<StorageEngine>,
    sink: Arc<dyn SnapshotSink>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(snapshot_loop(engine, sink, interval, shutdown_rx))
}

async fn snapshot_loop(
    engine: Arc<StorageEngine>,
    sink: Arc<dyn SnapshotSink>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Snapshot task received shutdown signal");
                    return;
                }
            }
        }

        match save(&engine, Arc::clone(&sink)).await {
            Ok(bytes) => info!(bytes, backend = sink.name(), "Snapshot saved"),
            Err(e) => warn!(error = %e, backend = sink.name(), "Snapshot failed"),
        }
    }
}
