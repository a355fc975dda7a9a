//! Cache Engine Module
//!
//! Byte-bounded store combining a hash index, an eviction policy and a
//! time index for TTL expiration. One `Engine` exists per policy flavour
//! (see `FifoCache`, `LruCache`, `LfuCache`).
//!
//! # Invariants
//! - `length` equals the sum of `key.len() + value.len()` over held entries
//! - `length <= capacity` whenever `capacity != 0`
//! - a key with an expiry has exactly one live slot in the time index

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use super::entry::{now_unix, Entry, Value, NO_EXPIRY, TTL_MISSING};
use super::expiry::TimeIndex;
use super::list::Handle;
use super::policy::EvictionPolicy;
use super::stats::{CacheStats, Removal};
use super::CacheMemory;

/// Callback invoked with every entry leaving the store.
///
/// It runs while the store lock is held and must not call back into the
/// same store.
pub type OnEvicted<V> = Arc<dyn Fn(&str, &V) + Send + Sync>;

struct State<P> {
    policy: P,
    index: HashMap<String, Handle>,
    timeline: TimeIndex,
    length: u64,
    stats: CacheStats,
}

// == Engine ==
pub struct Engine<P, V> {
    state: RwLock<State<P>>,
    capacity: u64,
    on_evicted: Option<OnEvicted<V>>,
    shutdown: CancellationToken,
}

impl<P, V> Engine<P, V>
where
    P: EvictionPolicy<Entry<V>>,
    V: Value,
{
    // == Constructor ==
    /// Creates an engine bounded to `capacity` bytes (`0` = unbounded).
    pub fn new(capacity: u64, on_evicted: Option<OnEvicted<V>>) -> Self {
        Self {
            state: RwLock::new(State {
                policy: P::new(),
                index: HashMap::new(),
                timeline: TimeIndex::new(),
                length: 0,
                stats: CacheStats::new(),
            }),
            capacity,
            on_evicted,
            shutdown: CancellationToken::new(),
        }
    }

    // == Set ==
    /// Inserts or updates `key`, evicting per policy until it fits.
    ///
    /// Writes larger than the whole capacity are dropped silently.
    fn set(&self, key: &str, value: V, expire_at: i64) {
        let kv_size = (key.len() + value.len()) as u64;
        if self.capacity != 0 && kv_size > self.capacity {
            debug!(
                "Rejected oversized write for key '{}': {} bytes > capacity {}",
                key, kv_size, self.capacity
            );
            return;
        }

        let mut state = self.state.write();
        match state.index.get(key).copied() {
            Some(handle) => {
                state.policy.on_write(handle);
                let (old_size, old_expire) = match state.policy.order().get(handle) {
                    Some(entry) => (entry.size(), entry.expire_at),
                    None => return,
                };
                if old_expire != NO_EXPIRY {
                    state.timeline.forget(old_expire, key);
                }
                while self.capacity != 0 && state.length - old_size + kv_size > self.capacity {
                    if !self.evict_one(&mut state, Some(handle)) {
                        break;
                    }
                }
                state.length = state.length - old_size + kv_size;
                if let Some(entry) = state.policy.order_mut().get_mut(handle) {
                    entry.value = value;
                    entry.expire_at = expire_at;
                }
            }
            None => {
                while self.capacity != 0 && state.length + kv_size > self.capacity {
                    if !self.evict_one(&mut state, None) {
                        break;
                    }
                }
                let handle = state.policy.insert(Entry::new(key, value, expire_at));
                state.index.insert(key.to_owned(), handle);
                state.length += kv_size;
            }
        }

        if expire_at != NO_EXPIRY {
            state.timeline.schedule(expire_at, key);
        }
        trace!("Set key '{}' (expire_at={})", key, expire_at);
    }

    // == Eviction ==
    /// Evicts the policy's victim, sparing `spare`. Returns false if
    /// nothing could be evicted.
    fn evict_one(&self, state: &mut State<P>, spare: Option<Handle>) -> bool {
        let Some(victim) = state.policy.victim(spare) else {
            return false;
        };
        match self.detach(state, victim) {
            Some(entry) => {
                state.stats.record_removal(Removal::Evicted);
                debug!("Evicted key '{}' ({})", entry.key, state.policy.name());
                true
            }
            None => false,
        }
    }

    /// Removes one entry from every structure and fires the callback.
    fn detach(&self, state: &mut State<P>, handle: Handle) -> Option<Entry<V>> {
        let entry = state.policy.remove(handle)?;
        state.index.remove(&entry.key);
        if entry.expire_at != NO_EXPIRY {
            state.timeline.forget(entry.expire_at, &entry.key);
        }
        state.length -= entry.size();
        if let Some(callback) = &self.on_evicted {
            callback(&entry.key, &entry.value);
        }
        Some(entry)
    }

    fn remove_key_locked(&self, state: &mut State<P>, key: &str) -> Option<Entry<V>> {
        let handle = state.index.get(key).copied()?;
        let entry = self.detach(state, handle)?;
        state.stats.record_removal(Removal::Expired);
        Some(entry)
    }
}

impl<P, V> CacheMemory<V> for Engine<P, V>
where
    P: EvictionPolicy<Entry<V>>,
    V: Value,
{
    // == Get ==
    /// Looks up `key`; an expired entry is removed on the spot and
    /// reported as a miss.
    fn get(&self, key: &str) -> Option<V> {
        let mut state = self.state.write();
        let Some(handle) = state.index.get(key).copied() else {
            state.stats.record_lookup(false);
            return None;
        };

        let expired = state
            .policy
            .order()
            .get(handle)
            .map_or(true, |entry| entry.is_expired(now_unix()));
        if expired {
            self.remove_key_locked(&mut state, key);
            state.stats.record_lookup(false);
            return None;
        }

        state.policy.on_read(handle);
        state.stats.record_lookup(true);
        state.policy.order().get(handle).map(|entry| entry.value.clone())
    }

    fn get_all(&self) -> Vec<Entry<V>> {
        let now = now_unix();
        let state = self.state.read();
        state
            .policy
            .order()
            .iter()
            .filter(|entry| !entry.is_expired(now))
            .cloned()
            .collect()
    }

    fn set_without_ttl(&self, key: &str, value: V) {
        self.set(key, value, NO_EXPIRY);
    }

    fn set_with_ttl(&self, key: &str, value: V, ttl: i64) {
        self.set(key, value, now_unix().saturating_add(ttl));
    }

    // == Remove ==
    fn remove(&self) -> Option<Entry<V>> {
        let mut state = self.state.write();
        let victim = state.policy.victim(None)?;
        let entry = self.detach(&mut state, victim)?;
        state.stats.record_removal(Removal::Evicted);
        Some(entry)
    }

    fn remove_expired_key(&self, key: &str) -> Option<Entry<V>> {
        let mut state = self.state.write();
        self.remove_key_locked(&mut state, key)
    }

    fn multi_delete_key(&self, keys: &[String], bucket: i64) {
        let mut state = self.state.write();
        state.timeline.drop_bucket(bucket);
        let mut removed = 0usize;
        for key in keys {
            // The bucket was copied before this lock was taken; a key re-set
            // since then carries a different expiry and stays.
            let due = state
                .index
                .get(key.as_str())
                .and_then(|handle| state.policy.order().get(*handle))
                .is_some_and(|entry| entry.is_expired(bucket));
            if due && self.remove_key_locked(&mut state, key).is_some() {
                removed += 1;
            }
        }
        if removed > 0 {
            debug!("Expired {} keys from bucket {}", removed, bucket);
        }
    }

    fn ttl(&self, key: &str) -> i64 {
        let state = self.state.read();
        state
            .index
            .get(key)
            .and_then(|handle| state.policy.order().get(*handle))
            .map_or(TTL_MISSING, |entry| entry.ttl(now_unix()))
    }

    fn len(&self) -> usize {
        let state = self.state.read();
        state.index.len().saturating_sub(state.timeline.due(now_unix()))
    }

    fn bytes(&self) -> u64 {
        self.state.read().length
    }

    fn capacity(&self) -> u64 {
        self.capacity
    }

    fn stats(&self) -> CacheStats {
        let state = self.state.read();
        let live = state.index.len().saturating_sub(state.timeline.due(now_unix()));
        state.stats.with_usage(live, state.length, self.capacity)
    }

    fn expiring_at(&self, second: i64) -> Option<Vec<String>> {
        self.state.read().timeline.keys_at(second)
    }

    fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    fn stop(&self) {
        if !self.shutdown.is_cancelled() {
            debug!("Stopping expiry sweeper");
        }
        self.shutdown.cancel();
    }
}
