//! Configuration for DriftKV
//!
//! Engine-level settings with the reference defaults: a snapshot and a
//! sweep every 60 seconds, snapshots written to `my-storage.json`.

use std::path::PathBuf;
use std::time::Duration;

use crate::persistence::SinkConfig;

/// Default interval between snapshots and between sweeps.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(60);

/// Default snapshot file.
pub const DEFAULT_FILENAME: &str = "my-storage.json";

/// Settings for a [`Store`](crate::Store).
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Time between periodic snapshots
    pub snapshot_interval: Duration,

    /// Time between active expiry sweeps
    pub sweep_interval: Duration,

    /// Where snapshots are written and restored from
    pub sink: SinkConfig,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            snapshot_interval: DEFAULT_INTERVAL,
            sweep_interval: DEFAULT_INTERVAL,
            sink: SinkConfig::File {
                path: PathBuf::from(DEFAULT_FILENAME),
            },
        }
    }
}

impl StoreConfig {
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Debug, Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    pub fn snapshot_interval(mut self, interval: Duration) -> Self {
        self.config.snapshot_interval = interval;
        self
    }

    pub fn sweep_interval(mut self, interval: Duration) -> Self {
        self.config.sweep_interval = interval;
        self
    }

    /// Snapshot to a JSON file at `path`.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.sink = SinkConfig::File { path: path.into() };
        self
    }

    /// Snapshot to an SQLite database at `path`.
    pub fn sqlite(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.sink = SinkConfig::Sqlite { path: path.into() };
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
