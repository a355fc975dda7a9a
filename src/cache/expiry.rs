//! Time Index Module
//!
//! Reverse index from an expiration second to the keys expiring then.
//! Invalidated keys are blanked in place instead of spliced out.

use std::collections::BTreeMap;

// == Time Index ==
#[derive(Debug, Default)]
pub struct TimeIndex {
    buckets: BTreeMap<i64, Vec<Option<String>>>,
}

impl TimeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `key` as expiring at `expire_at`.
    pub fn schedule(&mut self, expire_at: i64, key: &str) {
        self.buckets
            .entry(expire_at)
            .or_default()
            .push(Some(key.to_owned()));
    }

    /// Blanks the slot of `key` in the `expire_at` bucket, if present.
    pub fn forget(&mut self, expire_at: i64, key: &str) {
        if let Some(slots) = self.buckets.get_mut(&expire_at) {
            if let Some(slot) = slots.iter_mut().find(|s| s.as_deref() == Some(key)) {
                *slot = None;
            }
        }
    }

    /// Copies the live keys of the bucket for `second`.
    pub fn keys_at(&self, second: i64) -> Option<Vec<String>> {
        self.buckets
            .get(&second)
            .map(|slots| slots.iter().flatten().cloned().collect())
    }

    /// Drops a whole bucket.
    pub fn drop_bucket(&mut self, second: i64) {
        self.buckets.remove(&second);
    }

    /// Number of live keys whose expiry second is at or before `now`.
    pub fn due(&self, now: i64) -> usize {
        self.buckets
            .range(..=now)
            .map(|(_, slots)| slots.iter().flatten().count())
            .sum()
    }

    /// Number of buckets currently indexed.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }
}
