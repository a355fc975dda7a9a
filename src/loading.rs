//! Loading Cache Module
//!
//! Puts a store in front of an origin data source. Misses are loaded once
//! per key through [`Flight`] and written back with a TTL chosen by the
//! configured [`TtlStrategy`].

use std::sync::Arc;

use async_trait::async_trait;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::cache::{ByteView, CacheMemory, CacheStats, Entry, OnEvicted, Store, Strategy, NO_EXPIRY};
use crate::error::{CacheError, Result};
use crate::flight::Flight;

/// Longest TTL accepted by [`LoadingCache::set`]: ten years.
pub const MAX_TTL_SECS: i64 = 10 * 365 * 24 * 60 * 60;

// == Retriever ==
/// Origin data source consulted on a cache miss.
#[async_trait]
pub trait Retriever: Send + Sync {
    async fn retrieve(&self, key: &str) -> anyhow::Result<Vec<u8>>;
}

/// Adapts a plain function into a [`Retriever`].
pub struct RetrieverFn<F>(pub F);

#[async_trait]
impl<F> Retriever for RetrieverFn<F>
where
    F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync,
{
    async fn retrieve(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        (self.0)(key)
    }
}

// == TTL Strategy ==
/// TTL assigned to entries loaded from the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TtlStrategy {
    /// Always the same number of seconds
    Fixed(i64),
    /// Uniformly drawn from `min..=max` seconds
    Randomized { min: i64, max: i64 },
}

impl TtlStrategy {
    /// Draws the next TTL in seconds, never below one.
    pub fn next_ttl(&self) -> i64 {
        let ttl = match *self {
            TtlStrategy::Fixed(secs) => secs,
            TtlStrategy::Randomized { min, max } => {
                let (lo, hi) = if min <= max { (min, max) } else { (max, min) };
                rand::thread_rng().gen_range(lo..=hi)
            }
        };
        ttl.max(1)
    }
}

impl Default for TtlStrategy {
    fn default() -> Self {
        TtlStrategy::Randomized { min: 1, max: 60 }
    }
}

// == Builder ==
#[derive(Default)]
pub struct LoadingCacheBuilder {
    strategy: Strategy,
    capacity: u64,
    on_evicted: Option<OnEvicted<ByteView>>,
    retriever: Option<Arc<dyn Retriever>>,
    ttl_strategy: TtlStrategy,
}

impl LoadingCacheBuilder {
    pub fn strategy(mut self, strategy: Strategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Byte capacity, `0` = unbounded.
    pub fn capacity(mut self, capacity: u64) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn on_evicted(mut self, callback: OnEvicted<ByteView>) -> Self {
        self.on_evicted = Some(callback);
        self
    }

    pub fn retriever<R: Retriever + 'static>(mut self, retriever: R) -> Self {
        self.retriever = Some(Arc::new(retriever));
        self
    }

    /// Shorthand for `retriever(RetrieverFn(f))`.
    pub fn retriever_fn<F>(self, f: F) -> Self
    where
        F: Fn(&str) -> anyhow::Result<Vec<u8>> + Send + Sync + 'static,
    {
        self.retriever(RetrieverFn(f))
    }

    pub fn ttl_strategy(mut self, ttl_strategy: TtlStrategy) -> Self {
        self.ttl_strategy = ttl_strategy;
        self
    }

    /// Builds the cache. Fails if no retriever was given.
    pub fn build(self) -> Result<LoadingCache> {
        let retriever = self
            .retriever
            .ok_or_else(|| CacheError::Config("a retriever is required".to_string()))?;

        info!(
            "Loading cache ready: strategy={}, capacity={} bytes, populate_ttl={:?}",
            self.strategy, self.capacity, self.ttl_strategy
        );

        Ok(LoadingCache {
            store: Arc::new(Store::new(self.strategy, self.capacity, self.on_evicted)),
            retriever,
            flight: Flight::new(),
            ttl_strategy: self.ttl_strategy,
        })
    }
}

// == Loading Cache ==
pub struct LoadingCache {
    store: Arc<Store<ByteView>>,
    retriever: Arc<dyn Retriever>,
    flight: Flight<Result<ByteView>>,
    ttl_strategy: TtlStrategy,
}

impl LoadingCache {
    pub fn builder() -> LoadingCacheBuilder {
        LoadingCacheBuilder::default()
    }

    // == Get ==
    /// Returns the cached value for `key`, loading it from the origin on a
    /// miss. Origin failures are returned as [`CacheError::Retrieve`] and
    /// are not cached.
    pub async fn get(&self, key: &str) -> Result<ByteView> {
        require_key(key)?;

        if let Some(value) = self.store.get(key) {
            debug!("Cache hit for key '{}'", key);
            return Ok(value);
        }

        debug!("Cache miss for key '{}'", key);
        self.flight.fly(key, || self.load(key)).await
    }

    /// Fetches `key` from the origin and populates the store.
    async fn load(&self, key: &str) -> Result<ByteView> {
        let bytes = self.retriever.retrieve(key).await.map_err(|err| {
            warn!("Origin lookup for key '{}' failed: {}", key, err);
            CacheError::Retrieve(err.to_string())
        })?;

        let value = ByteView::from(bytes);
        let ttl = self.ttl_strategy.next_ttl();
        self.store.set_with_ttl(key, value.clone(), ttl);
        info!("Loaded key '{}' from origin (ttl={}s)", key, ttl);
        Ok(value)
    }

    // == Set ==
    /// Stores `value` under `key`. `ttl == -1` means no expiry; otherwise it
    /// must be at least one second.
    pub fn set(&self, key: &str, value: ByteView, ttl: i64) -> Result<()> {
        require_key(key)?;
        match ttl {
            NO_EXPIRY => self.store.set_without_ttl(key, value),
            secs if (1..=MAX_TTL_SECS).contains(&secs) => {
                self.store.set_with_ttl(key, value, secs)
            }
            other => {
                return Err(CacheError::InvalidRequest(format!(
                    "ttl must be -1 or between 1 and {} seconds, got {}",
                    MAX_TTL_SECS, other
                )))
            }
        }
        debug!("Set key '{}' (ttl={})", key, ttl);
        Ok(())
    }

    pub fn get_all(&self) -> Vec<Entry<ByteView>> {
        self.store.get_all()
    }

    /// `-1` = no expiry, `-2` = absent or expired, otherwise seconds left.
    pub fn ttl(&self, key: &str) -> Result<i64> {
        require_key(key)?;
        Ok(self.store.ttl(key))
    }

    pub fn stats(&self) -> CacheStats {
        self.store.stats()
    }

    /// The underlying store, for the sweeper and snapshot tasks.
    pub fn store(&self) -> &Arc<Store<ByteView>> {
        &self.store
    }

    /// Stops the expiry sweeper.
    pub fn close(&self) {
        self.store.stop();
    }
}

fn require_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(CacheError::InvalidRequest("key is required".to_string()));
    }
    Ok(())
}
