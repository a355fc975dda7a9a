//! Demo origin data source, seeded from configuration.

use std::collections::HashMap;

use anyhow::anyhow;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::loading::Retriever;

/// In-memory origin backed by a fixed map.
#[derive(Debug, Clone, Default)]
pub struct MapRetriever {
    records: HashMap<String, Vec<u8>>,
}

impl MapRetriever {
    pub fn new(records: HashMap<String, Vec<u8>>) -> Self {
        Self { records }
    }

    /// Parses `key=value` pairs separated by commas. Pairs without `=` or
    /// with an empty key are skipped.
    pub fn from_seed(seed: &str) -> Self {
        let mut records = HashMap::new();
        for pair in seed.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            match pair.split_once('=') {
                Some((key, value)) if !key.trim().is_empty() => {
                    records.insert(key.trim().to_string(), value.trim().as_bytes().to_vec());
                }
                _ => warn!("Ignoring malformed origin seed entry '{}'", pair),
            }
        }
        Self { records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[async_trait]
impl Retriever for MapRetriever {
    async fn retrieve(&self, key: &str) -> anyhow::Result<Vec<u8>> {
        debug!("Origin lookup for key '{}'", key);
        self.records
            .get(key)
            .cloned()
            .ok_or_else(|| anyhow!("{} not exist", key))
    }
}
