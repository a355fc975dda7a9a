//! Cache Statistics Module
//!
//! Lookup and removal counters kept under the store lock, plus the usage
//! gauges filled in when a snapshot of the stats is taken.

use serde::{Deserialize, Serialize};

/// Why an entry left the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Chosen as the policy's victim
    Evicted,
    /// Its TTL elapsed
    Expired,
}

// == Cache Stats ==
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Lookups that found a live entry
    pub hits: u64,
    /// Lookups that found nothing, or only an expired entry
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    /// Live entries at snapshot time
    pub total_entries: usize,
    /// Bytes charged against capacity (keys plus values)
    pub bytes: u64,
    /// Byte capacity, 0 = unbounded
    pub capacity: u64,
}

impl CacheStats {
    pub fn new() -> Self {
        Self::default()
    }

    // == Counters ==
    pub fn record_lookup(&mut self, hit: bool) {
        if hit {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
    }

    pub fn record_removal(&mut self, cause: Removal) {
        match cause {
            Removal::Evicted => self.evictions += 1,
            Removal::Expired => self.expirations += 1,
        }
    }

    // == Gauges ==
    /// Copies the counters and stamps the current usage onto them.
    pub fn with_usage(&self, live: usize, bytes: u64, capacity: u64) -> Self {
        Self {
            total_entries: live,
            bytes,
            capacity,
            ..self.clone()
        }
    }

    // == Ratios ==
    /// hits / (hits + misses), or 0.0 before the first lookup.
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }

    /// Share of the byte capacity in use; always 0.0 when unbounded.
    pub fn fill_ratio(&self) -> f64 {
        match self.capacity {
            0 => 0.0,
            capacity => self.bytes as f64 / capacity as f64,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_stats_are_zero() {
        let stats = CacheStats::new();
        assert_eq!(stats, CacheStats::default());
        assert_eq!(stats.hit_rate(), 0.0);
        assert_eq!(stats.fill_ratio(), 0.0);
    }

    #[test]
    fn test_lookup_counters() {
        let mut stats = CacheStats::new();
        for hit in [true, true, true, false] {
            stats.record_lookup(hit);
        }
        assert_eq!((stats.hits, stats.misses), (3, 1));
        assert_eq!(stats.hit_rate(), 0.75);
    }

    #[test]
    fn test_removal_counters() {
        let mut stats = CacheStats::new();
        stats.record_removal(Removal::Evicted);
        stats.record_removal(Removal::Evicted);
        stats.record_removal(Removal::Expired);
        assert_eq!(stats.evictions, 2);
        assert_eq!(stats.expirations, 1);
    }

    #[test]
    fn test_with_usage_keeps_counters() {
        let mut stats = CacheStats::new();
        stats.record_lookup(true);
        let snapshot = stats.with_usage(42, 512, 2048);

        assert_eq!(snapshot.hits, 1);
        assert_eq!(snapshot.total_entries, 42);
        assert_eq!(snapshot.fill_ratio(), 0.25);
        assert_eq!(stats.total_entries, 0);
    }

    #[test]
    fn test_unbounded_fill_ratio() {
        let stats = CacheStats::new().with_usage(3, 900, 0);
        assert_eq!(stats.fill_ratio(), 0.0);
    }
}
