//! Configuration Module
//!
//! Handles loading and managing server configuration from environment variables.

use std::env;
use std::path::PathBuf;
use std::str::FromStr;

use tracing::warn;

use crate::cache::Strategy;
use crate::loading::TtlStrategy;

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Byte capacity of the store (keys plus values), 0 = unbounded
    pub capacity: u64,
    /// Eviction strategy
    pub strategy: Strategy,
    /// TTL given to entries loaded from the origin on a miss
    pub populate_ttl: TtlStrategy,
    /// Snapshot file, `None` disables persistence
    pub snapshot_path: Option<PathBuf>,
    /// Seconds between background snapshots, 0 disables the task
    pub snapshot_interval: u64,
    /// Seed records for the demo origin, as `key=value,key=value`
    pub origin_seed: String,
    /// Peer base URLs for routing clients
    pub peers: Vec<String>,
    /// Virtual nodes per peer on the hash ring
    pub hash_replicas: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `CACHE_CAPACITY` - Store capacity in bytes (default: 2048)
    /// - `CACHE_STRATEGY` - `fifo`, `lru` or `lfu` (default: lfu)
    /// - `POPULATE_TTL_MODE` - `fixed` or `random` (default: random)
    /// - `POPULATE_TTL` - Fixed TTL in seconds (default: 60)
    /// - `POPULATE_TTL_MIN` / `POPULATE_TTL_MAX` - Random TTL bounds (default: 1..=60)
    /// - `SNAPSHOT_PATH` - Snapshot file, empty disables (default: ./backup/backup.txt)
    /// - `SNAPSHOT_INTERVAL` - Snapshot period in seconds, 0 disables (default: 60)
    /// - `ORIGIN_SEED` - Demo origin records (default: Tom=630,Jack=589,Sam=567)
    /// - `CACHE_PEERS` - Comma separated peer URLs (default: none)
    /// - `HASH_REPLICAS` - Virtual nodes per peer (default: 50)
    pub fn from_env() -> Self {
        let defaults = Self::default();

        let strategy = match env::var("CACHE_STRATEGY") {
            Ok(raw) => raw.parse().unwrap_or_else(|err| {
                warn!("{}, falling back to {}", err, defaults.strategy);
                defaults.strategy
            }),
            Err(_) => defaults.strategy,
        };

        let populate_ttl = match env::var("POPULATE_TTL_MODE").as_deref() {
            Ok("fixed") => TtlStrategy::Fixed(parse_var("POPULATE_TTL", 60)),
            _ => TtlStrategy::Randomized {
                min: parse_var("POPULATE_TTL_MIN", 1),
                max: parse_var("POPULATE_TTL_MAX", 60),
            },
        };

        let snapshot_path = match env::var("SNAPSHOT_PATH") {
            Ok(raw) if raw.trim().is_empty() => None,
            Ok(raw) => Some(PathBuf::from(raw)),
            Err(_) => defaults.snapshot_path,
        };

        Self {
            server_port: parse_var("SERVER_PORT", defaults.server_port),
            capacity: parse_var("CACHE_CAPACITY", defaults.capacity),
            strategy,
            populate_ttl,
            snapshot_path,
            snapshot_interval: parse_var("SNAPSHOT_INTERVAL", defaults.snapshot_interval),
            origin_seed: env::var("ORIGIN_SEED").unwrap_or(defaults.origin_seed),
            peers: env::var("CACHE_PEERS")
                .map(|raw| split_list(&raw))
                .unwrap_or_default(),
            hash_replicas: parse_var("HASH_REPLICAS", defaults.hash_replicas),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            capacity: 2048,
            strategy: Strategy::Lfu,
            populate_ttl: TtlStrategy::Randomized { min: 1, max: 60 },
            snapshot_path: Some(PathBuf::from("./backup/backup.txt")),
            snapshot_interval: 60,
            origin_seed: "Tom=630,Jack=589,Sam=567".to_string(),
            peers: Vec::new(),
            hash_replicas: 50,
        }
    }
}

fn parse_var<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.capacity, 2048);
        assert_eq!(config.strategy, Strategy::Lfu);
        assert_eq!(config.populate_ttl, TtlStrategy::Randomized { min: 1, max: 60 });
        assert_eq!(config.hash_replicas, 50);
        assert!(config.peers.is_empty());
    }

    #[test]
    fn test_config_from_env_defaults() {
        // Clear any existing env vars to test defaults
        for name in [
            "SERVER_PORT",
            "CACHE_CAPACITY",
            "CACHE_STRATEGY",
            "POPULATE_TTL_MODE",
            "SNAPSHOT_PATH",
            "CACHE_PEERS",
        ] {
            env::remove_var(name);
        }

        let config = Config::from_env();
        assert_eq!(config.server_port, 3000);
        assert_eq!(config.capacity, 2048);
        assert_eq!(config.strategy, Strategy::Lfu);
        assert_eq!(
            config.snapshot_path,
            Some(PathBuf::from("./backup/backup.txt"))
        );
    }

    #[test]
    fn test_split_list() {
        assert_eq!(
            split_list(" http://a:1, ,http://b:2 "),
            vec!["http://a:1".to_string(), "http://b:2".to_string()]
        );
        assert!(split_list("").is_empty());
    }
}
