//! Response DTOs for the cache server API
//!
//! Defines the structure of outgoing HTTP response bodies. Every type also
//! deserializes so the peer client can read them back.

use serde::{Deserialize, Serialize};

use crate::cache::{now_unix, ByteView, CacheStats, Entry, Strategy};

/// Response body for the GET operation (GET /get/:key)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetResponse {
    /// The requested key
    pub key: String,
    /// The stored value
    pub value: String,
}

impl GetResponse {
    /// Creates a new GetResponse
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Response body for the SET operation (PUT /set)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetResponse {
    /// Success message
    pub message: String,
    /// The key that was set
    pub key: String,
}

impl SetResponse {
    /// Creates a new SetResponse
    pub fn new(key: impl Into<String>) -> Self {
        let key = key.into();
        Self {
            message: format!("Key '{}' set successfully", key),
            key,
        }
    }
}

/// One live entry as listed by GET /getall.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntryResponse {
    pub key: String,
    pub value: String,
    /// Seconds left, `-1` for no expiry
    pub ttl: i64,
}

impl EntryResponse {
    pub fn from_entry(entry: &Entry<ByteView>, now: i64) -> Self {
        Self {
            key: entry.key.clone(),
            value: entry.value.to_string(),
            ttl: entry.ttl(now),
        }
    }
}

/// Response body for GET /getall
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetAllResponse {
    pub entries: Vec<EntryResponse>,
}

impl GetAllResponse {
    pub fn from_entries(entries: &[Entry<ByteView>]) -> Self {
        let now = now_unix();
        Self {
            entries: entries
                .iter()
                .map(|entry| EntryResponse::from_entry(entry, now))
                .collect(),
        }
    }
}

/// Response body for GET /ttl/:key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtlResponse {
    pub key: String,
    /// `-1` = no expiry, `-2` = absent or expired
    pub ttl: i64,
}

impl TtlResponse {
    pub fn new(key: impl Into<String>, ttl: i64) -> Self {
        Self {
            key: key.into(),
            ttl,
        }
    }
}

/// Response body for POST /save
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveResponse {
    /// Number of records written
    pub saved: usize,
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsResponse {
    /// Active eviction strategy
    pub strategy: String,
    /// Number of cache hits
    pub hits: u64,
    /// Number of cache misses
    pub misses: u64,
    /// Number of evictions
    pub evictions: u64,
    /// Number of entries removed on expiry
    pub expirations: u64,
    /// Current number of entries in cache
    pub total_entries: usize,
    /// Bytes in use
    pub bytes: u64,
    /// Byte capacity, 0 = unbounded
    pub capacity: u64,
    /// Hit rate (hits / (hits + misses))
    pub hit_rate: f64,
    /// bytes / capacity, 0 when unbounded
    pub fill_ratio: f64,
}

impl StatsResponse {
    /// Creates a new StatsResponse from cache statistics
    pub fn new(strategy: Strategy, stats: &CacheStats) -> Self {
        Self {
            strategy: strategy.to_string(),
            hits: stats.hits,
            misses: stats.misses,
            evictions: stats.evictions,
            expirations: stats.expirations,
            total_entries: stats.total_entries,
            bytes: stats.bytes,
            capacity: stats.capacity,
            hit_rate: stats.hit_rate(),
            fill_ratio: stats.fill_ratio(),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}
