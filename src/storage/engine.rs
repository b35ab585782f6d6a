//! Thread-Safe Storage Engine with Expiry Support
//!
//! This module implements the shared handle over the key space. Every
//! operation takes the single engine lock, runs the lazy expiry check on
//! the keys it touches, applies its effect and releases the lock, so
//! operations are linearizable with respect to each other.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌───────────────────────────────────────────────────────┐  │
//! │  │                 Mutex<Keyspace>                       │  │
//! │  │   scalars  │  lists  │  expiration index              │  │
//! │  └───────────────────────────────────────────────────────┘  │
//! └─────────────────────────────────────────────────────────────┘
//!        ▲               ▲                     ▲
//!   callers (any)   sweep task          snapshot task
//! ```
//!
//! One coarse lock guards all three maps as a unit, which keeps the
//! cross-map invariants trivially true. Nothing blocks on I/O while
//! holding it: snapshots are encoded under the lock and written after
//! it is released.
//!
//! All data crossing this boundary is copied out of the key space.

use bytes::Bytes;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use crate::error::{Result, SinkError};
use crate::storage::keyspace::{KeyType, Keyspace};
use crate::storage::list::PopMode;
use crate::storage::value::Kind;
use crate::time::now_ms;

/// The main storage engine for DriftKV.
///
/// Designed to be wrapped in an `Arc` and shared between callers and the
/// background tasks. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use driftkv::storage::{Kind, StorageEngine};
///
/// let engine = StorageEngine::new();
///
/// engine.set("answer", "42", None).unwrap();
/// assert_eq!(engine.get("answer").unwrap(), "42");
/// assert_eq!(engine.get_kind("answer").unwrap(), Kind::Integer);
///
/// engine.rpush("queue", &[1, 2, 3]).unwrap();
/// assert_eq!(engine.lget("queue", 1).unwrap(), 2);
/// ```
pub struct StorageEngine {
    keyspace: Mutex<Keyspace>,

    /// Statistics: keys removed by the sweeper
    expired_count: AtomicU64,

    /// Statistics: snapshots encoded
    snapshot_count: AtomicU64,

    /// Held across encode and sink write so snapshots land in encode order
    snapshot_gate: tokio::sync::Mutex<()>,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("keys", &self.len())
            .field("expired_count", &self.expired_count.load(Ordering::Relaxed))
            .field("snapshot_count", &self.snapshot_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self {
            keyspace: Mutex::new(Keyspace::new()),
            expired_count: AtomicU64::new(0),
            snapshot_count: AtomicU64::new(0),
            snapshot_gate: tokio::sync::Mutex::new(()),
        }
    }

    /// Runs `op` against the key space under the engine lock.
    fn with_keyspace<T>(&self, op: impl FnOnce(&mut Keyspace, i64) -> T) -> T {
        let now = now_ms();
        let mut ks = self.keyspace.lock();
        op(&mut ks, now)
    }

    // ========================================================================
    // SCALAR OPERATIONS
    // ========================================================================

    /// Sets a scalar, optionally expiring after `ttl_secs` seconds.
    pub fn set(&self, key: &str, text: &str, ttl_secs: Option<i64>) -> Result<()> {
        self.with_keyspace(|ks, now| ks.set(key, text, ttl_secs, now))
    }

    /// Gets the canonical text of a scalar.
    pub fn get(&self, key: &str) -> Result<String> {
        self.with_keyspace(|ks, now| ks.get(key, now))
    }

    pub fn get_kind(&self, key: &str) -> Result<Kind> {
        self.with_keyspace(|ks, now| ks.get_kind(key, now))
    }

    /// Sets several scalars from alternating key/value arguments, all or
    /// nothing.
    pub fn hset<S: AsRef<str>>(&self, pairs: &[S]) -> Result<()> {
        self.with_keyspace(|ks, now| ks.hset(pairs, now))
    }

    // ========================================================================
    // LIST OPERATIONS
    // ========================================================================

    pub fn rpush(&self, key: &str, values: &[i64]) -> Result<usize> {
        self.with_keyspace(|ks, now| ks.rpush(key, values, now))
    }

    pub fn lpush(&self, key: &str, values: &[i64]) -> Result<usize> {
        self.with_keyspace(|ks, now| ks.lpush(key, values, now))
    }

    pub fn raddtoset(&self, key: &str, values: &[i64]) -> Result<usize> {
        self.with_keyspace(|ks, now| ks.raddtoset(key, values, now))
    }

    pub fn delete_segment(&self, key: &str, left: i64, right: i64) -> Result<Vec<i64>> {
        self.with_keyspace(|ks, now| ks.delete_segment(key, left, right, now))
    }

    pub fn lpop(&self, key: &str, mode: PopMode) -> Result<Vec<i64>> {
        self.with_keyspace(|ks, now| ks.lpop(key, mode, now))
    }

    pub fn rpop(&self, key: &str, mode: PopMode) -> Result<Vec<i64>> {
        self.with_keyspace(|ks, now| ks.rpop(key, mode, now))
    }

    pub fn lset(&self, key: &str, index: usize, value: i64) -> Result<()> {
        self.with_keyspace(|ks, now| ks.lset(key, index, value, now))
    }

    pub fn lget(&self, key: &str, index: usize) -> Result<i64> {
        self.with_keyspace(|ks, now| ks.lget(key, index, now))
    }

    pub fn llen(&self, key: &str) -> Result<usize> {
        self.with_keyspace(|ks, now| ks.llen(key, now))
    }

    pub fn lrange(&self, key: &str) -> Result<Vec<i64>> {
        self.with_keyspace(|ks, now| ks.lrange(key, now))
    }

    // ========================================================================
    // KEY OPERATIONS
    // ========================================================================

    /// Re-arms expiration on a live key; zero clears it.
    ///
    /// Returns `true` if a scalar or list key was updated.
    pub fn expire(&self, key: &str, ttl_secs: i64) -> Result<bool> {
        self.with_keyspace(|ks, now| ks.expire(key, ttl_secs, now))
    }

    /// Remaining lifetime of a key, `None` if it never expires.
    pub fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        self.with_keyspace(|ks, now| ks.ttl(key, now))
    }

    pub fn delete(&self, key: &str) -> bool {
        self.with_keyspace(|ks, now| ks.delete(key, now))
    }

    pub fn exists(&self, key: &str) -> bool {
        self.with_keyspace(|ks, now| ks.exists(key, now))
    }

    pub fn key_type(&self, key: &str) -> Option<KeyType> {
        self.with_keyspace(|ks, now| ks.key_type(key, now))
    }

    /// Number of keys physically present, expired-but-unswept included.
    pub fn len(&self) -> usize {
        self.keyspace.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn stats(&self) -> StorageStats {
        let ks = self.keyspace.lock();
        StorageStats {
            scalars: ks.scalar_count(),
            lists: ks.list_count(),
            expired: self.expired_count.load(Ordering::Relaxed),
            snapshots: self.snapshot_count.load(Ordering::Relaxed),
        }
    }

    // ========================================================================
    // BACKGROUND SUPPORT
    // ========================================================================

    pub(crate) fn lock_keyspace(&self) -> parking_lot::MutexGuard<'_, Keyspace> {
        self.keyspace.lock()
    }

    pub(crate) fn snapshot_gate(&self) -> &tokio::sync::Mutex<()> {
        &self.snapshot_gate
    }

    pub(crate) fn record_expired(&self, count: usize) {
        self.expired_count.fetch_add(count as u64, Ordering::Relaxed);
    }

    /// Encodes a consistent copy of the whole key space.
    ///
    /// The lock is held only while encoding; the returned buffer can be
    /// written to a sink without blocking callers.
    pub fn encode_snapshot(&self) -> std::result::Result<Bytes, SinkError> {
        let payload = {
            let ks = self.keyspace.lock();
            serde_json::to_vec(&*ks)?
        };
        self.snapshot_count.fetch_add(1, Ordering::Relaxed);
        Ok(Bytes::from(payload))
    }

    /// Replaces the key space with a decoded snapshot.
    pub fn restore_snapshot(&self, payload: &[u8]) -> std::result::Result<(), SinkError> {
        let restored: Keyspace = serde_json::from_slice(payload)?;
        *self.keyspace.lock() = restored.restore();
        Ok(())
    }
}

/// Engine statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StorageStats {
    /// Scalar keys currently stored
    pub scalars: usize,
    /// List keys currently stored
    pub lists: usize,
    /// Keys removed by the sweeper
    pub expired: u64,
    /// Snapshots encoded since start
    pub snapshots: u64,
}
