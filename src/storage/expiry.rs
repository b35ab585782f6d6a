//! Background Expiry Sweeper
//!
//! This module implements "active expiry" as opposed to the "lazy
//! expiry" every operation performs on the keys it touches.
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry is cheap but a key that expires and is never read again
//! would stay in memory forever. The sweeper reclaims those keys.
//!
//! ## Design
//!
//! Each tick samples up to `min(10, |index| / 5)` distinct keys at random
//! from the expiration index and evicts the ones whose deadline has
//! passed. The cost of a tick is bounded no matter how large the key
//! space grows; lazy expiry remains the correctness backstop for keys
//! the sampler has not reached yet.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, trace};

use crate::storage::keyspace::Keyspace;
use crate::storage::StorageEngine;
use crate::time::{self, now_ms};

/// Upper bound on keys sampled per sweep.
pub const MAX_SAMPLE: usize = 10;

/// One sampled key out of this many index entries.
const SAMPLE_DIVISOR: usize = 5;

/// Number of keys a sweep samples for an index of `index_len` entries.
pub fn sample_size(index_len: usize) -> usize {
    MAX_SAMPLE.min(index_len / SAMPLE_DIVISOR)
}

/// Runs one sampled sweep over the key space. Returns the number of
/// keys evicted.
pub fn run_sweep(ks: &mut Keyspace, now: i64) -> usize {
    let sample = ks.sample_keys(sample_size(ks.len()));

    let mut removed = 0;
    for key in &sample {
        let expired = ks
            .expirations
            .get(key)
            .map(|&at| time::is_expired_at(at, now))
            .unwrap_or(false);
        if expired && ks.remove(key) {
            trace!(key = %key, "swept expired key");
            removed += 1;
        }
    }
    removed
}

impl StorageEngine {
    /// Runs one active expiry pass. Returns the number of keys evicted.
    pub fn sweep(&self) -> usize {
        let now = now_ms();
        let (removed, remaining) = {
            let mut ks = self.lock_keyspace();
            let removed = run_sweep(&mut ks, now);
            (removed, ks.len())
        };

        if removed > 0 {
            self.record_expired(removed);
            debug!(
                expired = removed,
                keys_remaining = remaining,
                "Expired keys cleaned up"
            );
        }
        removed
    }
}

/// Spawns the sweep loop on the current Tokio runtime.
///
/// The loop exits once `shutdown_rx` observes `true` (or its sender is
/// dropped). A sweep already in progress always runs to completion.
pub(crate) fn spawn_sweeper(
    engine: Arc<StorageEngine>,
    interval: Duration,
    shutdown_rx: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(sweeper_loop(engine, interval, shutdown_rx))
}

async fn sweeper_loop(
    engine: Arc<StorageEngine>,
    interval: Duration,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry sweeper received shutdown signal");
                    return;
                }
            }
        }

        engine.sweep();
    }
}
