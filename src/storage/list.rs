//! List Store: ordered integer sequences on the key space.
//!
//! Lists are 0-indexed, allow duplicates and keep insertion order. An
//! emptied list stays in place as an empty list until it is deleted or
//! expires.

use tracing::trace;

use crate::error::{Result, StoreError};
use crate::storage::keyspace::Keyspace;
use crate::time::NO_EXPIRY;

/// Which end of a list a pop works from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum End {
    Left,
    Right,
}

/// How many elements a pop removes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PopMode {
    /// Exactly one element from the chosen end.
    Default,
    /// `n` elements from the chosen end.
    Count(usize),
    /// The inclusive segment `[left, right]`, regardless of end.
    /// `right` may be negative, counting from the end of the list.
    Range(i64, i64),
}

impl PopMode {
    /// Maps a positional argument list onto a pop mode.
    ///
    /// Zero arguments pop one element, one argument is a count and two
    /// arguments are a range. More than two is `IndexOutOfRange`.
    pub fn from_args(args: &[i64]) -> Result<Self> {
        match *args {
            [] => Ok(PopMode::Default),
            [count] => usize::try_from(count)
                .map(PopMode::Count)
                .map_err(|_| StoreError::InvalidArgument("pop count must not be negative")),
            [left, right] => Ok(PopMode::Range(left, right)),
            _ => Err(StoreError::IndexOutOfRange { len: 0 }),
        }
    }
}

impl Keyspace {
    /// Returns the list under `key` for writing, creating it with no
    /// expiry if absent. Fails if the key holds a scalar.
    fn list_for_push(&mut self, key: &str, now: i64) -> Result<&mut Vec<i64>> {
        self.evict_if_expired(key, now);
        if self.scalars.contains_key(key) {
            return Err(StoreError::TypeConflict);
        }
        if !self.lists.contains_key(key) {
            self.expirations.insert(key.to_string(), NO_EXPIRY);
        }
        Ok(self.lists.entry(key.to_string()).or_default())
    }

    /// Returns an existing live list, or `NotFound`.
    fn list_mut(&mut self, key: &str, now: i64) -> Result<&mut Vec<i64>> {
        self.evict_if_expired(key, now);
        self.lists.get_mut(key).ok_or(StoreError::NotFound)
    }

    /// Appends `values` to the right end. Returns the new length.
    pub fn rpush(&mut self, key: &str, values: &[i64], now: i64) -> Result<usize> {
        let list = self.list_for_push(key, now)?;
        list.extend_from_slice(values);
        trace!(key = key, count = values.len(), "pushed right");
        Ok(list.len())
    }

    /// Prepends `values` to the left end, keeping their order:
    /// `lpush(k, [1, 2])` on `[3]` gives `[1, 2, 3]`.
    pub fn lpush(&mut self, key: &str, values: &[i64], now: i64) -> Result<usize> {
        let list = self.list_for_push(key, now)?;
        list.splice(0..0, values.iter().copied());
        trace!(key = key, count = values.len(), "pushed left");
        Ok(list.len())
    }

    /// Appends each value that is not already in the list, including
    /// values repeated earlier in the same call. Returns the new length.
    pub fn raddtoset(&mut self, key: &str, values: &[i64], now: i64) -> Result<usize> {
        let list = self.list_for_push(key, now)?;
        for &value in values {
            if !list.contains(&value) {
                list.push(value);
            }
        }
        Ok(list.len())
    }

    /// Overwrites the element at `index`.
    pub fn lset(&mut self, key: &str, index: usize, value: i64, now: i64) -> Result<()> {
        let list = self.list_mut(key, now)?;
        let len = list.len();
        let slot = list
            .get_mut(index)
            .ok_or(StoreError::IndexOutOfRange { len })?;
        *slot = value;
        Ok(())
    }

    /// Reads the element at `index`.
    pub fn lget(&mut self, key: &str, index: usize, now: i64) -> Result<i64> {
        let list = self.list_mut(key, now)?;
        list.get(index)
            .copied()
            .ok_or(StoreError::IndexOutOfRange { len: list.len() })
    }

    pub fn llen(&mut self, key: &str, now: i64) -> Result<usize> {
        self.list_mut(key, now).map(|list| list.len())
    }

    /// Returns a copy of the whole list.
    pub fn lrange(&mut self, key: &str, now: i64) -> Result<Vec<i64>> {
        self.list_mut(key, now).map(|list| list.clone())
    }

    /// Removes and returns the inclusive segment `[left, right]`.
    ///
    /// A negative `right` is resolved as `len + right`. After resolution
    /// the bounds must satisfy `0 <= left <= right < len`.
    pub fn delete_segment(&mut self, key: &str, left: i64, right: i64, now: i64) -> Result<Vec<i64>> {
        let list = self.list_mut(key, now)?;
        let len = list.len();
        let out_of_range = StoreError::IndexOutOfRange { len };

        let right = if right < 0 { len as i64 + right } else { right };
        if left < 0 || right < 0 || left > right || right >= len as i64 {
            return Err(out_of_range);
        }

        let removed: Vec<i64> = list.drain(left as usize..=right as usize).collect();
        trace!(key = key, left, right, "deleted list segment");
        Ok(removed)
    }

    /// Pops from one end of the list according to `mode`.
    ///
    /// Popping more elements than the list holds fails with
    /// `IndexOutOfRange` carrying the current length.
    pub fn pop(&mut self, key: &str, end: End, mode: PopMode, now: i64) -> Result<Vec<i64>> {
        let count = match mode {
            PopMode::Default => 1,
            PopMode::Count(n) => n,
            PopMode::Range(left, right) => return self.delete_segment(key, left, right, now),
        };

        let list = self.list_mut(key, now)?;
        let len = list.len();
        if count > len {
            return Err(StoreError::IndexOutOfRange { len });
        }

        let popped: Vec<i64> = match end {
            End::Left => list.drain(..count).collect(),
            End::Right => list.drain(len - count..).collect(),
        };
        trace!(key = key, ?end, count, "popped");
        Ok(popped)
    }

    pub fn lpop(&mut self, key: &str, mode: PopMode, now: i64) -> Result<Vec<i64>> {
        self.pop(key, End::Left, mode, now)
    }

    pub fn rpop(&mut self, key: &str, mode: PopMode, now: i64) -> Result<Vec<i64>> {
        self.pop(key, End::Right, mode, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_700_000_000_000;

    fn digits() -> Keyspace {
        let mut ks = Keyspace::new();
        ks.rpush("l", &[0, 1, 2, 3, 4, 5, 6, 7, 8, 9], NOW).unwrap();
        ks
    }

    #[test]
    fn test_lpush_rpush() {
        let mut ks = Keyspace::new();
        assert_eq!(ks.rpush("l", &[3, 4], NOW).unwrap(), 2);
        assert_eq!(ks.lpush("l", &[1, 2], NOW).unwrap(), 4);
        assert_eq!(ks.lrange("l", NOW).unwrap(), vec![1, 2, 3, 4]);
        assert_eq!(ks.ttl("l", NOW).unwrap(), None);
    }

    #[test]
    fn test_push_on_scalar_conflicts() {
        let mut ks = Keyspace::new();
        ks.set("s", "v", None, NOW).unwrap();
        assert!(matches!(ks.rpush("s", &[1], NOW), Err(StoreError::TypeConflict)));
        assert!(matches!(ks.lpush("s", &[1], NOW), Err(StoreError::TypeConflict)));
        assert!(matches!(
            ks.raddtoset("s", &[1], NOW),
            Err(StoreError::TypeConflict)
        ));
    }

    #[test]
    fn test_push_keeps_existing_expiry() {
        let mut ks = Keyspace::new();
        ks.rpush("l", &[1], NOW).unwrap();
        ks.expire("l", 10, NOW).unwrap();
        ks.rpush("l", &[2], NOW).unwrap();
        assert!(ks.ttl("l", NOW).unwrap().is_some());
    }

    #[test]
    fn test_push_recreates_expired_list() {
        let mut ks = Keyspace::new();
        ks.rpush("l", &[1, 2], NOW).unwrap();
        ks.expire("l", 1, NOW).unwrap();
        assert_eq!(ks.rpush("l", &[7], NOW + 1_500).unwrap(), 1);
        assert_eq!(ks.ttl("l", NOW + 1_500).unwrap(), None);
    }

    #[test]
    fn test_raddtoset() {
        let mut ks = Keyspace::new();
        ks.raddtoset("l", &[3, 5, 8, 4, 8], NOW).unwrap();
        assert_eq!(ks.lrange("l", NOW).unwrap(), vec![3, 5, 8, 4]);

        ks.raddtoset("l", &[4, 1, 3, 1], NOW).unwrap();
        assert_eq!(ks.lrange("l", NOW).unwrap(), vec![3, 5, 8, 4, 1]);
    }

    #[test]
    fn test_lset_lget() {
        let mut ks = digits();
        ks.lset("l", 3, 42, NOW).unwrap();
        assert_eq!(ks.lget("l", 3, NOW).unwrap(), 42);

        let err = ks.lget("l", 10, NOW).unwrap_err();
        assert_eq!(err.list_len(), Some(10));
        assert!(matches!(
            ks.lset("l", 10, 0, NOW),
            Err(StoreError::IndexOutOfRange { len: 10 })
        ));
    }

    #[test]
    fn test_lset_lget_missing_or_scalar() {
        let mut ks = Keyspace::new();
        ks.set("s", "1", None, NOW).unwrap();
        assert!(matches!(ks.lget("none", 0, NOW), Err(StoreError::NotFound)));
        assert!(matches!(ks.lset("none", 0, 1, NOW), Err(StoreError::NotFound)));
        assert!(matches!(ks.lset("s", 0, 1, NOW), Err(StoreError::NotFound)));
        assert!(matches!(ks.lget("s", 0, NOW), Err(StoreError::NotFound)));
    }

    #[test]
    fn test_delete_segment_whole_list() {
        let mut ks = Keyspace::new();
        ks.rpush("l", &[1, 2, 3], NOW).unwrap();
        assert_eq!(ks.delete_segment("l", 0, -1, NOW).unwrap(), vec![1, 2, 3]);
        assert_eq!(ks.lrange("l", NOW).unwrap(), Vec::<i64>::new());
        assert_eq!(ks.llen("l", NOW).unwrap(), 0);
    }

    #[test]
    fn test_delete_segment_closes_gap() {
        let mut ks = digits();
        assert_eq!(ks.delete_segment("l", 2, 4, NOW).unwrap(), vec![2, 3, 4]);
        assert_eq!(ks.lrange("l", NOW).unwrap(), vec![0, 1, 5, 6, 7, 8, 9]);
    }

    #[test]
    fn test_delete_segment_bounds() {
        let mut ks = digits();
        for (left, right) in [(5, 4), (0, 10), (10, 10), (0, -11), (-1, 3), (3, -8)] {
            assert!(
                matches!(
                    ks.delete_segment("l", left, right, NOW),
                    Err(StoreError::IndexOutOfRange { len: 10 })
                ),
                "({left}, {right}) should be rejected"
            );
        }
        assert_eq!(ks.llen("l", NOW).unwrap(), 10);
        assert!(matches!(
            ks.delete_segment("none", 0, 0, NOW),
            Err(StoreError::NotFound)
        ));
    }

    #[test]
    fn test_lpop_range_with_negative_right() {
        let mut ks = digits();
        let removed = ks.lpop("l", PopMode::Range(2, -3), NOW).unwrap();
        assert_eq!(removed, vec![2, 3, 4, 5, 6, 7]);
        assert_eq!(ks.lrange("l", NOW).unwrap(), vec![0, 1, 8, 9]);

        let mut ks = digits();
        let removed = ks.rpop("l", PopMode::Range(2, -2), NOW).unwrap();
        assert_eq!(removed, vec![2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(ks.lrange("l", NOW).unwrap(), vec![0, 1, 9]);
    }

    #[test]
    fn test_lpop_rpop_default() {
        let mut ks = digits();
        assert_eq!(ks.lpop("l", PopMode::Default, NOW).unwrap(), vec![0]);
        assert_eq!(ks.rpop("l", PopMode::Default, NOW).unwrap(), vec![9]);
        assert_eq!(ks.llen("l", NOW).unwrap(), 8);
    }

    #[test]
    fn test_pop_count() {
        let mut ks = digits();
        assert_eq!(ks.lpop("l", PopMode::Count(3), NOW).unwrap(), vec![0, 1, 2]);
        assert_eq!(ks.rpop("l", PopMode::Count(2), NOW).unwrap(), vec![8, 9]);
        assert_eq!(ks.lpop("l", PopMode::Count(0), NOW).unwrap(), Vec::<i64>::new());
        assert_eq!(ks.lrange("l", NOW).unwrap(), vec![3, 4, 5, 6, 7]);
    }

    #[test]
    fn test_pop_count_exceeding_length() {
        let mut ks = Keyspace::new();
        ks.rpush("l", &[1, 2], NOW).unwrap();
        let err = ks.rpop("l", PopMode::Count(3), NOW).unwrap_err();
        assert_eq!(err.list_len(), Some(2));
        assert_eq!(ks.llen("l", NOW).unwrap(), 2);

        ks.lpop("l", PopMode::Count(2), NOW).unwrap();
        assert!(matches!(
            ks.lpop("l", PopMode::Default, NOW),
            Err(StoreError::IndexOutOfRange { len: 0 })
        ));
    }

    #[test]
    fn test_pop_mode_from_args() {
        assert_eq!(PopMode::from_args(&[]).unwrap(), PopMode::Default);
        assert_eq!(PopMode::from_args(&[4]).unwrap(), PopMode::Count(4));
        assert_eq!(PopMode::from_args(&[2, -2]).unwrap(), PopMode::Range(2, -2));
        assert!(matches!(
            PopMode::from_args(&[1, 2, 3]),
            Err(StoreError::IndexOutOfRange { .. })
        ));
        assert!(matches!(
            PopMode::from_args(&[-1]),
            Err(StoreError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_list_lazy_expiry() {
        let mut ks = digits();
        ks.expire("l", 1, NOW).unwrap();
        assert!(matches!(ks.lget("l", 0, NOW + 1_000), Err(StoreError::NotFound)));
        assert!(ks.is_empty());
    }
}
