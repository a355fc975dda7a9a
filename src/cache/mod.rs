//! Cache Module
//!
//! Byte-bounded in-memory stores with FIFO, LRU or LFU eviction, per-key
//! TTL expiration and eviction callbacks.

mod engine;
mod entry;
mod expiry;
mod fifo;
mod lfu;
mod list;
mod lru;
mod policy;
mod stats;


use std::fmt;
use std::str::FromStr;

use tokio_util::sync::CancellationToken;

// Re-export public types
pub use engine::{Engine, OnEvicted};
pub use entry::{now_unix, ByteView, Entry, Value, NO_EXPIRY, TTL_MISSING};
pub use expiry::TimeIndex;
pub use fifo::Fifo;
pub use lfu::Lfu;
pub use list::{Handle, OrderList};
pub use lru::Lru;
pub use policy::EvictionPolicy;
pub use stats::{CacheStats, Removal};

// == Store Flavours ==
pub type FifoCache<V> = Engine<Fifo<Entry<V>>, V>;
pub type LruCache<V> = Engine<Lru<Entry<V>>, V>;
pub type LfuCache<V> = Engine<Lfu<Entry<V>>, V>;

// == Cache Memory ==
/// Contract shared by every store.
///
/// All operations are serialized by the store's own lock; none of them
/// blocks beyond that.
pub trait CacheMemory<V: Value>: Send + Sync {
    /// Returns the value for `key`, or `None` if absent or expired.
    fn get(&self, key: &str) -> Option<V>;

    /// Snapshot of every non-expired entry.
    fn get_all(&self) -> Vec<Entry<V>>;

    /// Inserts or updates `key` with no expiry.
    fn set_without_ttl(&self, key: &str, value: V);

    /// Inserts or updates `key`, expiring `ttl` seconds from now.
    fn set_with_ttl(&self, key: &str, value: V, ttl: i64);

    /// Evicts the policy's next victim.
    fn remove(&self) -> Option<Entry<V>>;

    /// Removes `key` regardless of its position in the eviction order.
    fn remove_expired_key(&self, key: &str) -> Option<Entry<V>>;

    /// Drops the time bucket `bucket`, then removes each listed key that
    /// is still due by `bucket`. Blank and missing keys are skipped.
    fn multi_delete_key(&self, keys: &[String], bucket: i64);

    /// `-1` = no expiry, `-2` = absent or expired, otherwise seconds left.
    fn ttl(&self, key: &str) -> i64;

    /// Number of live, non-expired entries.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Bytes charged against capacity.
    fn bytes(&self) -> u64;

    /// Byte capacity, `0` = unbounded.
    fn capacity(&self) -> u64;

    fn stats(&self) -> CacheStats;

    /// Live keys in the time bucket for `second`, if that bucket exists.
    fn expiring_at(&self, second: i64) -> Option<Vec<String>>;

    /// Token cancelled by `stop`; the expiry sweeper watches it.
    fn shutdown_token(&self) -> CancellationToken;

    /// Terminates the expiry sweeper. Safe to call more than once.
    fn stop(&self);
}

// == Strategy ==
/// Eviction strategy selected at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Strategy {
    Fifo,
    Lru,
    #[default]
    Lfu,
}

impl FromStr for Strategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "fifo" => Ok(Strategy::Fifo),
            "lru" => Ok(Strategy::Lru),
            "lfu" => Ok(Strategy::Lfu),
            other => Err(format!("unknown cache strategy '{}'", other)),
        }
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Fifo => write!(f, "fifo"),
            Strategy::Lru => write!(f, "lru"),
            Strategy::Lfu => write!(f, "lfu"),
        }
    }
}

// == Store ==
/// A store of one of the three flavours.
pub enum Store<V: Value> {
    Fifo(FifoCache<V>),
    Lru(LruCache<V>),
    Lfu(LfuCache<V>),
}

impl<V: Value> Store<V> {
    /// Creates a store bounded to `capacity` bytes (`0` = unbounded).
    pub fn new(strategy: Strategy, capacity: u64, on_evicted: Option<OnEvicted<V>>) -> Self {
        match strategy {
            Strategy::Fifo => Store::Fifo(Engine::new(capacity, on_evicted)),
            Strategy::Lru => Store::Lru(Engine::new(capacity, on_evicted)),
            Strategy::Lfu => Store::Lfu(Engine::new(capacity, on_evicted)),
        }
    }

    pub fn strategy(&self) -> Strategy {
        match self {
            Store::Fifo(_) => Strategy::Fifo,
            Store::Lru(_) => Strategy::Lru,
            Store::Lfu(_) => Strategy::Lfu,
        }
    }

    fn inner(&self) -> &dyn CacheMemory<V> {
        match self {
            Store::Fifo(cache) => cache,
            Store::Lru(cache) => cache,
            Store::Lfu(cache) => cache,
        }
    }
}

impl<V: Value> CacheMemory<V> for Store<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.inner().get(key)
    }

    fn get_all(&self) -> Vec<Entry<V>> {
        self.inner().get_all()
    }

    fn set_without_ttl(&self, key: &str, value: V) {
        self.inner().set_without_ttl(key, value)
    }

    fn set_with_ttl(&self, key: &str, value: V, ttl: i64) {
        self.inner().set_with_ttl(key, value, ttl)
    }

    fn remove(&self) -> Option<Entry<V>> {
        self.inner().remove()
    }

    fn remove_expired_key(&self, key: &str) -> Option<Entry<V>> {
        self.inner().remove_expired_key(key)
    }

    fn multi_delete_key(&self, keys: &[String], bucket: i64) {
        self.inner().multi_delete_key(keys, bucket)
    }

    fn ttl(&self, key: &str) -> i64 {
        self.inner().ttl(key)
    }

    fn len(&self) -> usize {
        self.inner().len()
    }

    fn bytes(&self) -> u64 {
        self.inner().bytes()
    }

    fn capacity(&self) -> u64 {
        self.inner().capacity()
    }

    fn stats(&self) -> CacheStats {
        self.inner().stats()
    }

    fn expiring_at(&self, second: i64) -> Option<Vec<String>> {
        self.inner().expiring_at(second)
    }

    fn shutdown_token(&self) -> CancellationToken {
        self.inner().shutdown_token()
    }

    fn stop(&self) {
        self.inner().stop()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::sync::Arc;

    const ALL: [Strategy; 3] = [Strategy::Fifo, Strategy::Lru, Strategy::Lfu];

    fn recording_store(strategy: Strategy, capacity: u64) -> (Store<String>, Arc<Mutex<Vec<String>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let callback: OnEvicted<String> = Arc::new(move |key: &str, _: &String| {
            sink.lock().push(key.to_string());
        });
        (Store::new(strategy, capacity, Some(callback)), seen)
    }

    #[test]
    fn test_strategy_parse() {
        assert_eq!("fifo".parse::<Strategy>(), Ok(Strategy::Fifo));
        assert_eq!("LRU".parse::<Strategy>(), Ok(Strategy::Lru));
        assert_eq!(" lfu ".parse::<Strategy>(), Ok(Strategy::Lfu));
        assert!("arc".parse::<Strategy>().is_err());
        assert_eq!(Strategy::default(), Strategy::Lfu);
        assert_eq!(Strategy::Lru.to_string(), "lru");
    }

    #[test]
    fn test_store_reports_strategy() {
        for strategy in ALL {
            let store: Store<String> = Store::new(strategy, 0, None);
            assert_eq!(store.strategy(), strategy);
        }
    }

    #[test]
    fn test_fifo_eviction_ignores_reads() {
        // capacity 10: k1="123456" (8 bytes), then two 4-byte entries
        let (store, seen) = recording_store(Strategy::Fifo, 10);
        store.set_without_ttl("k1", "123456".to_string());
        store.set_without_ttl("k2", "12".to_string());
        store.get("k1");
        store.set_without_ttl("k3", "12".to_string());

        assert_eq!(*seen.lock(), vec!["k1"]);
        assert!(store.bytes() <= 10);
    }

    #[test]
    fn test_eviction_order_per_strategy() {
        // Insert a, b, c, read a, then insert d and e: two victims each
        let expected = [
            (Strategy::Fifo, vec!["a", "b"]),
            (Strategy::Lru, vec!["b", "c"]),
            (Strategy::Lfu, vec!["b", "c"]),
        ];
        for (strategy, victims) in expected {
            let (store, seen) = recording_store(strategy, 6);
            store.set_without_ttl("a", "1".to_string());
            store.set_without_ttl("b", "1".to_string());
            store.set_without_ttl("c", "1".to_string());
            assert!(store.get("a").is_some());
            store.set_without_ttl("d", "1".to_string());
            store.set_without_ttl("e", "1".to_string());

            assert_eq!(*seen.lock(), victims, "strategy {}", strategy);
            assert_eq!(store.len(), 3);
        }
    }

    #[test]
    fn test_lfu_prefers_frequency_over_recency() {
        let (store, seen) = recording_store(Strategy::Lfu, 6);
        store.set_without_ttl("a", "1".to_string());
        store.set_without_ttl("b", "1".to_string());
        store.set_without_ttl("c", "1".to_string());
        store.get("a");
        store.get("a");
        store.get("b");
        // c is the most recently written but the least used
        store.set_without_ttl("d", "1".to_string());

        assert_eq!(*seen.lock(), vec!["c"]);
    }

    #[test]
    fn test_lru_write_counts_as_use() {
        let (store, seen) = recording_store(Strategy::Lru, 6);
        store.set_without_ttl("a", "1".to_string());
        store.set_without_ttl("b", "1".to_string());
        store.set_without_ttl("c", "1".to_string());
        store.set_without_ttl("a", "2".to_string());
        store.set_without_ttl("d", "1".to_string());

        assert_eq!(*seen.lock(), vec!["b"]);
    }

    #[test]
    fn test_contract_basics_for_every_strategy() {
        for strategy in ALL {
            let store: Store<String> = Store::new(strategy, 1024, None);
            store.set_with_ttl("key1", "1234".to_string(), 5);
            assert_eq!(store.ttl("key1"), 5);
            assert_eq!(store.get("key1"), Some("1234".to_string()));

            store.set_without_ttl("key1", "5678".to_string());
            assert_eq!(store.ttl("key1"), NO_EXPIRY);
            assert_eq!(store.get_all().len(), 1);

            assert!(store.remove_expired_key("key1").is_some());
            assert!(store.is_empty());
            assert_eq!(store.bytes(), 0);
            assert_eq!(store.ttl("key1"), TTL_MISSING);
        }
    }
}
