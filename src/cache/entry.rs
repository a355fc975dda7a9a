//! Cache Entry Module
//!
//! Defines stored entries, the byte-length contract for values, and the
//! clock helpers used for expiration.

use bytes::Bytes;

// == Constants ==
/// `expire_at` marker for entries that never expire
pub const NO_EXPIRY: i64 = -1;

/// TTL reported for absent keys or keys at (or past) their expiry second
pub const TTL_MISSING: i64 = -2;

// == Value ==
/// A cached value with a reported byte length.
///
/// The length is what the store charges against its byte capacity,
/// together with the length of the key.
pub trait Value: Clone + Send + Sync + 'static {
    /// Number of bytes the value occupies.
    fn len(&self) -> usize;

    /// Returns true if the value holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Value for String {
    fn len(&self) -> usize {
        String::len(self)
    }
}

impl Value for Vec<u8> {
    fn len(&self) -> usize {
        Vec::len(self)
    }
}

// == Byte View ==
/// Immutable view over cached bytes.
///
/// Cloning is cheap (reference counted), so handing a value out of the
/// store never copies the payload and callers can never mutate it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteView {
    bytes: Bytes,
}

impl ByteView {
    /// Creates a view by copying the given bytes.
    pub fn copy_from(bytes: &[u8]) -> Self {
        Self {
            bytes: Bytes::copy_from_slice(bytes),
        }
    }

    /// Borrows the underlying bytes.
    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns an owned copy of the bytes.
    pub fn to_vec(&self) -> Vec<u8> {
        self.bytes.to_vec()
    }

    /// Returns the value as UTF-8 text, if it is valid UTF-8.
    pub fn as_str(&self) -> Option<&str> {
        std::str::from_utf8(&self.bytes).ok()
    }
}

impl Value for ByteView {
    fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl From<Vec<u8>> for ByteView {
    fn from(bytes: Vec<u8>) -> Self {
        Self {
            bytes: Bytes::from(bytes),
        }
    }
}

impl From<String> for ByteView {
    fn from(value: String) -> Self {
        Self::from(value.into_bytes())
    }
}

impl From<&str> for ByteView {
    fn from(value: &str) -> Self {
        Self::copy_from(value.as_bytes())
    }
}

impl std::fmt::Display for ByteView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&String::from_utf8_lossy(&self.bytes))
    }
}

// == Entry ==
/// A single key/value pair as held by a store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry<V> {
    /// The cache key
    pub key: String,
    /// The stored value
    pub value: V,
    /// Expiration timestamp (Unix seconds), `NO_EXPIRY` = never
    pub expire_at: i64,
}

impl<V: Value> Entry<V> {
    /// Creates a new entry.
    pub fn new(key: impl Into<String>, value: V, expire_at: i64) -> Self {
        Self {
            key: key.into(),
            value,
            expire_at,
        }
    }

    // == Is Expired ==
    /// Checks if the entry has expired at the given second.
    ///
    /// An entry is expired once `now` reaches its expiration second.
    pub fn is_expired(&self, now: i64) -> bool {
        self.expire_at != NO_EXPIRY && self.expire_at <= now
    }

    /// Bytes charged against capacity: key length plus value length.
    pub fn size(&self) -> u64 {
        (self.key.len() + self.value.len()) as u64
    }

    /// Remaining TTL in seconds as reported by the `TTL` operation.
    pub fn ttl(&self, now: i64) -> i64 {
        if self.expire_at == NO_EXPIRY {
            return NO_EXPIRY;
        }
        let remaining = self.expire_at - now;
        if remaining <= 0 {
            TTL_MISSING
        } else {
            remaining
        }
    }
}

// == Utility Functions ==
/// Returns the current Unix timestamp in seconds.
pub fn now_unix() -> i64 {
    chrono::Utc::now().timestamp()
}
