//! Value Store: scalar operations on the key space.

use tracing::trace;

use crate::error::{Result, StoreError};
use crate::storage::keyspace::Keyspace;
use crate::storage::value::{Kind, ScalarValue};
use crate::time;

impl Keyspace {
    /// Sets `key` to `text`, inferring integer vs. string kind.
    ///
    /// `ttl_secs` of `None` or `Some(0)` stores the key without expiry.
    /// Fails with `TypeConflict` if `key` holds a live list.
    pub fn set(&mut self, key: &str, text: &str, ttl_secs: Option<i64>, now: i64) -> Result<()> {
        let ttl = match ttl_secs {
            Some(ttl) if ttl < 0 => {
                return Err(StoreError::InvalidArgument("ttl must not be negative"));
            }
            Some(ttl) => ttl as u64,
            None => 0,
        };

        self.evict_if_expired(key, now);
        if self.lists.contains_key(key) {
            return Err(StoreError::TypeConflict);
        }

        self.put_scalar(key, ScalarValue::parse(text), time::expiry_from_secs(ttl, now));
        Ok(())
    }

    fn put_scalar(&mut self, key: &str, value: ScalarValue, expires_at: i64) {
        trace!(key = key, kind = %value.kind(), "scalar stored");
        self.scalars.insert(key.to_string(), value);
        self.expirations.insert(key.to_string(), expires_at);
    }

    /// Sets several keys at once from alternating key/value pairs.
    ///
    /// All pairs are validated before any is applied: an odd argument
    /// count or any key holding a list leaves the key space untouched.
    /// Later pairs overwrite earlier ones sharing a key.
    pub fn hset<S: AsRef<str>>(&mut self, pairs: &[S], now: i64) -> Result<()> {
        if pairs.len() % 2 != 0 {
            return Err(StoreError::InvalidArgument(
                "expected an even number of key/value arguments",
            ));
        }

        for pair in pairs.chunks_exact(2) {
            let key = pair[0].as_ref();
            self.evict_if_expired(key, now);
            if self.lists.contains_key(key) {
                return Err(StoreError::TypeConflict);
            }
        }

        for pair in pairs.chunks_exact(2) {
            self.put_scalar(
                pair[0].as_ref(),
                ScalarValue::parse(pair[1].as_ref()),
                time::NO_EXPIRY,
            );
        }
        Ok(())
    }

    fn scalar(&mut self, key: &str, now: i64) -> Result<&ScalarValue> {
        self.evict_if_expired(key, now);
        self.scalars.get(key).ok_or(StoreError::NotFound)
    }

    /// Returns the canonical text of a scalar key.
    pub fn get(&mut self, key: &str, now: i64) -> Result<String> {
        self.scalar(key, now).map(ScalarValue::render)
    }

    /// Returns the kind tag of a scalar key.
    pub fn get_kind(&mut self, key: &str, now: i64) -> Result<Kind> {
        self.scalar(key, now).map(ScalarValue::kind)
    }
}
