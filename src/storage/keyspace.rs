//! The key space: scalar map, list map and expiration index.
//!
//! `Keyspace` is plain data guarded by the engine's single lock. All
//! methods take `&mut self` and an explicit `now` in epoch milliseconds,
//! which keeps the expiry logic deterministic under test.
//!
//! Invariants maintained by every method:
//! - a key lives in at most one of `scalars` / `lists`;
//! - `key ∈ expirations ⟺ key ∈ scalars ∪ lists`;
//! - a key whose expiry is non-zero and `<= now` is logically dead and is
//!   evicted by whichever read or sweep observes it first.

use std::collections::HashMap;

use rand::seq::IteratorRandom;
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::error::{Result, StoreError};
use crate::storage::value::{Kind, ScalarValue};
use crate::time::{self, NO_EXPIRY};

/// What a live key currently holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyType {
    Scalar(Kind),
    List,
}

/// The whole data set of the store.
///
/// This is also the snapshot document: field names are the stable wire
/// names used by every durable sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Keyspace {
    #[serde(rename = "inner", default)]
    pub(crate) scalars: HashMap<String, ScalarValue>,

    #[serde(rename = "arrays", default)]
    pub(crate) lists: HashMap<String, Vec<i64>>,

    /// Absolute expiry per key in epoch milliseconds; `0` = never.
    #[serde(rename = "ExpirationTime", default)]
    pub(crate) expirations: HashMap<String, i64>,
}

impl Keyspace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys physically present, including expired keys that
    /// have not been evicted yet.
    pub fn len(&self) -> usize {
        self.expirations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.expirations.is_empty()
    }

    pub fn scalar_count(&self) -> usize {
        self.scalars.len()
    }

    pub fn list_count(&self) -> usize {
        self.lists.len()
    }

    /// Removes `key` from every map. Returns `true` if it was present.
    pub(crate) fn remove(&mut self, key: &str) -> bool {
        let scalar = self.scalars.remove(key).is_some();
        let list = self.lists.remove(key).is_some();
        self.expirations.remove(key);
        scalar || list
    }

    /// Lazy expiration: evicts `key` if its deadline has passed.
    ///
    /// Returns `true` if the key was evicted. Must be called before any
    /// operation inspects the key.
    pub(crate) fn evict_if_expired(&mut self, key: &str, now: i64) -> bool {
        let expired = self
            .expirations
            .get(key)
            .map(|&at| time::is_expired_at(at, now))
            .unwrap_or(false);

        if expired {
            self.remove(key);
            trace!(key = key, "lazily evicted expired key");
        }
        expired
    }

    /// Deletes a scalar or list key. Returns `true` if a live key was removed.
    pub fn delete(&mut self, key: &str, now: i64) -> bool {
        if self.evict_if_expired(key, now) {
            return false;
        }
        self.remove(key)
    }

    pub fn exists(&mut self, key: &str, now: i64) -> bool {
        self.key_type(key, now).is_some()
    }

    /// Returns what `key` holds, or `None` if it is absent or expired.
    pub fn key_type(&mut self, key: &str, now: i64) -> Option<KeyType> {
        self.evict_if_expired(key, now);
        if let Some(value) = self.scalars.get(key) {
            return Some(KeyType::Scalar(value.kind()));
        }
        if self.lists.contains_key(key) {
            return Some(KeyType::List);
        }
        None
    }

    /// Re-arms expiration on a live scalar or list key.
    ///
    /// A TTL of zero clears expiration. Returns `false` if the key is
    /// absent or already expired; the value itself is never touched.
    pub fn expire(&mut self, key: &str, ttl_secs: i64, now: i64) -> Result<bool> {
        if ttl_secs < 0 {
            return Err(StoreError::InvalidArgument("ttl must not be negative"));
        }
        if self.evict_if_expired(key, now) {
            return Ok(false);
        }
        match self.expirations.get_mut(key) {
            Some(at) => {
                *at = time::expiry_from_secs(ttl_secs as u64, now);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Remaining lifetime of a live key; `Ok(None)` if it never expires.
    pub fn ttl(&mut self, key: &str, now: i64) -> Result<Option<std::time::Duration>> {
        self.evict_if_expired(key, now);
        match self.expirations.get(key) {
            Some(&at) => Ok(time::remaining(at, now)),
            None => Err(StoreError::NotFound),
        }
    }

    /// Picks up to `count` distinct keys at random from the expiration
    /// index (keys without a deadline included).
    pub(crate) fn sample_keys(&self, count: usize) -> Vec<String> {
        let mut rng = rand::thread_rng();
        self.expirations
            .keys()
            .choose_multiple(&mut rng, count)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Repairs a freshly deserialized key space so the cross-map
    /// invariants hold again.
    pub(crate) fn restore(mut self) -> Self {
        let mut conflicts = 0usize;
        let scalars = &self.scalars;
        self.lists.retain(|key, _| {
            let clash = scalars.contains_key(key);
            if clash {
                conflicts += 1;
            }
            !clash
        });
        if conflicts > 0 {
            warn!(conflicts, "snapshot held keys in both maps, kept scalar values");
        }

        let mut missing = 0usize;
        for key in self.scalars.keys().chain(self.lists.keys()) {
            if !self.expirations.contains_key(key) {
                self.expirations.insert(key.clone(), NO_EXPIRY);
                missing += 1;
            }
        }

        let before = self.expirations.len();
        let (scalars, lists) = (&self.scalars, &self.lists);
        self.expirations
            .retain(|key, _| scalars.contains_key(key) || lists.contains_key(key));
        let orphaned = before - self.expirations.len();

        if missing > 0 || orphaned > 0 {
            warn!(missing, orphaned, "repaired expiration index from snapshot");
        }
        self
    }
}
