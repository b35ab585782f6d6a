//! Wall-clock millisecond helpers for the expiration index.
//!
//! Expiry timestamps are absolute milliseconds since the Unix epoch so
//! they survive a snapshot/restore cycle across process restarts.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

/// Sentinel value meaning "no expiry".
pub const NO_EXPIRY: i64 = 0;

/// Returns the current time in milliseconds since the Unix epoch.
#[inline]
pub fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Returns true if the given expiry timestamp has passed.
#[inline]
pub fn is_expired_at(expires_at_ms: i64, now: i64) -> bool {
    expires_at_ms != NO_EXPIRY && expires_at_ms <= now
}

/// Converts a TTL in seconds into an absolute expiry timestamp.
///
/// A TTL of zero means the key never expires.
#[inline]
pub fn expiry_from_secs(ttl_secs: u64, now: i64) -> i64 {
    if ttl_secs == 0 {
        NO_EXPIRY
    } else {
        now.saturating_add((ttl_secs as i64).saturating_mul(1000))
    }
}

/// Returns the remaining lifetime, or None if the key never expires.
#[inline]
pub fn remaining(expires_at_ms: i64, now: i64) -> Option<Duration> {
    if expires_at_ms == NO_EXPIRY {
        None
    } else {
        Some(Duration::from_millis(expires_at_ms.saturating_sub(now).max(0) as u64))
    }
}
