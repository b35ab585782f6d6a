//! Lifecycle Controller
//!
//! [`Store`] ties the storage engine to its durable sink and owns the two
//! background tasks: the expiry sweeper and the periodic snapshotter.
//!
//! ```text
//!   open()                 stop()                     final sweep +
//!     │                      │                        final snapshot
//!     ▼                      ▼                              │
//! ┌─────────┐  signal  ┌──────────┐  tasks joined  ┌──────────────┐
//! │ Running │ ───────> │ Stopping │ ─────────────> │   Stopped    │
//! └─────────┘          └──────────┘                └──────────────┘
//! ```
//!
//! The state machine is linear: a store never re-enters `Running`.
//! Shutdown is cooperative; a sweep or snapshot already in flight is
//! allowed to finish before its task exits.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::config::StoreConfig;
use crate::error::{Result, SinkError};
use crate::persistence::{self, SnapshotSink};
use crate::storage::expiry;
use crate::storage::StorageEngine;

/// Where a [`Store`] is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Running,
    Stopping,
    Stopped,
}

/// A running store: engine, durable sink and background tasks.
///
/// Dropping a store without calling [`Store::stop`] still tells the
/// background tasks to exit, but skips the final snapshot.
pub struct Store {
    engine: Arc<StorageEngine>,
    sink: Arc<dyn SnapshotSink>,

    /// Broadcasts `true` to both background tasks on shutdown
    shutdown_tx: watch::Sender<bool>,

    /// Current lifecycle state, observable by `wait()`; shared with the
    /// shutdown driver
    state_tx: Arc<watch::Sender<LifecycleState>>,

    /// Background task handles, taken by the first `stop()`
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for Store {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Store")
            .field("engine", &self.engine)
            .field("sink", &self.sink.name())
            .field("state", &self.state())
            .finish()
    }
}

impl Store {
    /// Opens the configured sink, restores the latest snapshot and starts
    /// the background tasks.
    ///
    /// Must be called from within a Tokio runtime. Failing to reach the
    /// sink or to decode its snapshot is fatal and returned to the caller.
    pub async fn open(config: StoreConfig) -> Result<Self> {
        let sink = config.sink.open()?;
        Self::with_sink(config, sink).await
    }

    /// Like [`Store::open`], with an already constructed sink.
    pub async fn with_sink(config: StoreConfig, sink: Arc<dyn SnapshotSink>) -> Result<Self> {
        let engine = Arc::new(StorageEngine::new());

        match persistence::load(Arc::clone(&sink)).await? {
            Some(payload) => {
                engine.restore_snapshot(&payload)?;
                let stats = engine.stats();
                info!(
                    scalars = stats.scalars,
                    lists = stats.lists,
                    backend = sink.name(),
                    "Snapshot restored"
                );
            }
            None => info!(backend = sink.name(), "No snapshot found, starting empty"),
        }

        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let sweeper = expiry::spawn_sweeper(
            Arc::clone(&engine),
            config.sweep_interval,
            shutdown_rx.clone(),
        );
        let snapshotter = persistence::spawn_snapshotter(
            Arc::clone(&engine),
            Arc::clone(&sink),
            config.snapshot_interval,
            shutdown_rx,
        );

        info!(
            sweep_interval_ms = config.sweep_interval.as_millis() as u64,
            snapshot_interval_ms = config.snapshot_interval.as_millis() as u64,
            "Store started"
        );

        let (state_tx, _) = watch::channel(LifecycleState::Running);
        Ok(Self {
            engine,
            sink,
            shutdown_tx,
            state_tx: Arc::new(state_tx),
            tasks: Mutex::new(vec![sweeper, snapshotter]),
        })
    }

    /// The engine serving caller operations.
    pub fn engine(&self) -> &Arc<StorageEngine> {
        &self.engine
    }

    pub fn state(&self) -> LifecycleState {
        *self.state_tx.borrow()
    }

    /// Writes one snapshot now. Returns the encoded size in bytes.
    pub async fn snapshot(&self) -> Result<usize> {
        Ok(persistence::save(&self.engine, Arc::clone(&self.sink)).await?)
    }

    /// Shuts the store down.
    ///
    /// Signals both background tasks, waits for them to exit (including
    /// any snapshot in flight), then runs one final sweep and one final
    /// snapshot. The first call starts the shutdown and reports the final
    /// snapshot's result; any later or concurrent call waits until the
    /// store is `Stopped` and returns `Ok(())`.
    ///
    /// The shutdown runs on its own task, so dropping a `stop()` future
    /// (e.g. under a timeout) does not leave the store stuck in
    /// `Stopping`.
    pub async fn stop(&self) -> Result<()> {
        let initiated = self.state_tx.send_if_modified(|state| {
            if *state == LifecycleState::Running {
                *state = LifecycleState::Stopping;
                true
            } else {
                false
            }
        });
        if !initiated {
            self.wait().await;
            return Ok(());
        }

        info!("Store stopping");
        self.shutdown_tx.send_replace(true);

        let tasks = std::mem::take(&mut *self.tasks.lock());
        let driver = tokio::spawn(drive_shutdown(
            Arc::clone(&self.engine),
            Arc::clone(&self.sink),
            tasks,
            Arc::clone(&self.state_tx),
        ));

        match driver.await {
            Ok(result) => result,
            Err(e) => {
                error!(error = %e, "Shutdown task failed");
                self.state_tx.send_replace(LifecycleState::Stopped);
                Err(SinkError::from(e).into())
            }
        }
    }

    /// Blocks until the store reaches `Stopped`.
    pub async fn wait(&self) {
        let mut state_rx = self.state_tx.subscribe();
        // The sender lives in `self`, so the channel cannot close here.
        let _ = state_rx
            .wait_for(|state| *state == LifecycleState::Stopped)
            .await;
    }
}

/// Joins the background tasks, then runs the final sweep and snapshot and
/// marks the store `Stopped`.
async fn drive_shutdown(
    engine: Arc<StorageEngine>,
    sink: Arc<dyn SnapshotSink>,
    tasks: Vec<JoinHandle<()>>,
    state_tx: Arc<watch::Sender<LifecycleState>>,
) -> Result<()> {
    for task in tasks {
        if let Err(e) = task.await {
            warn!(error = %e, "Background task ended abnormally");
        }
    }

    engine.sweep();
    let result = persistence::save(&engine, Arc::clone(&sink)).await;
    match &result {
        Ok(bytes) => info!(bytes, backend = sink.name(), "Final snapshot saved"),
        Err(e) => error!(error = %e, backend = sink.name(), "Final snapshot failed"),
    }

    state_tx.send_replace(LifecycleState::Stopped);
    info!("Store stopped");
    result.map(|_| ()).map_err(Into::into)
}

impl Drop for Store {
    fn drop(&mut self) {
        self.shutdown_tx.send_replace(true);
    }
}
