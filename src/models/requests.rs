//! Request DTOs for the cache server API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::{Deserialize, Serialize};

use crate::cache::NO_EXPIRY;

/// Longest key accepted over the API.
pub const MAX_KEY_LEN: usize = 256;

fn default_ttl() -> i64 {
    NO_EXPIRY
}

/// Request body for the SET operation (PUT /set)
///
/// # Fields
/// - `key`: The cache key to store the value under
/// - `value`: The value to store
/// - `ttl`: TTL in seconds, `-1` (the default) for no expiry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetRequest {
    /// The cache key
    pub key: String,
    /// The value to store
    pub value: String,
    /// TTL in seconds
    #[serde(default = "default_ttl")]
    pub ttl: i64,
}

impl SetRequest {
    pub fn new(key: impl Into<String>, value: impl Into<String>, ttl: i64) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            ttl,
        }
    }

    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid. TTL
    /// bounds are checked by the cache itself.
    pub fn validate(&self) -> Option<String> {
        if self.key.is_empty() {
            return Some("Key cannot be empty".to_string());
        }
        if self.key.len() > MAX_KEY_LEN {
            return Some(format!(
                "Key exceeds maximum length of {} characters",
                MAX_KEY_LEN
            ));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_set_request_deserialize() {
        let json = r#"{"key": "test", "value": "hello"}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.key, "test");
        assert_eq!(req.value, "hello");
        assert_eq!(req.ttl, NO_EXPIRY);
    }

    #[test]
    fn test_set_request_with_ttl() {
        let json = r#"{"key": "test", "value": "hello", "ttl": 60}"#;
        let req: SetRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.ttl, 60);
    }

    #[test]
    fn test_validate_empty_key() {
        let req = SetRequest::new("", "test", NO_EXPIRY);
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_long_key() {
        let req = SetRequest::new("k".repeat(MAX_KEY_LEN + 1), "test", NO_EXPIRY);
        assert!(req.validate().is_some());
    }

    #[test]
    fn test_validate_valid_request() {
        let req = SetRequest::new("valid_key", "test", 60);
        assert!(req.validate().is_none());
    }
}
