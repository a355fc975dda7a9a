//! Peer Client Module
//!
//! Routes each key to the peer that owns it on the consistent hash ring and
//! talks to that peer's HTTP API.

use parking_lot::RwLock;
use reqwest::{Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::error::{CacheError, Result};
use crate::hashring::HashRing;
use crate::models::{
    EntryResponse, ErrorResponse, GetAllResponse, GetResponse, SetRequest, SetResponse,
    TtlResponse,
};

// == Peer Client ==
pub struct PeerClient {
    ring: RwLock<HashRing>,
    http: reqwest::Client,
}

impl PeerClient {
    /// Creates a client over `peers` (base URLs such as `http://host:port`).
    pub fn new<I, S>(peers: I, replicas: usize) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ring = HashRing::new(replicas, None);
        ring.register(peers.into_iter().map(|peer| normalize(peer.into())));
        Self {
            ring: RwLock::new(ring),
            http: reqwest::Client::new(),
        }
    }

    /// Replaces the peer set wholesale.
    pub fn set_peers<I, S>(&self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ring = self.ring.write();
        ring.register(peers.into_iter().map(|peer| normalize(peer.into())));
        debug!("Peer set replaced: {:?}", ring.peers());
    }

    pub fn peers(&self) -> Vec<String> {
        self.ring.read().peers().to_vec()
    }

    /// Base URL of the peer owning `key`.
    pub fn peer_for(&self, key: &str) -> Result<String> {
        self.ring
            .read()
            .get_peer(key)
            .map(str::to_owned)
            .ok_or_else(|| CacheError::Peer("no peers registered".to_string()))
    }

    // == Operations ==
    pub async fn get(&self, key: &str) -> Result<String> {
        let peer = self.peer_for(key)?;
        let response = self
            .http
            .get(endpoint(&peer, &["get", key])?)
            .send()
            .await?;
        let body: GetResponse = decode(response).await?;
        Ok(body.value)
    }

    /// Stores `value` on the owning peer; `ttl == -1` means no expiry.
    pub async fn set(&self, key: &str, value: &str, ttl: i64) -> Result<()> {
        let peer = self.peer_for(key)?;
        let response = self
            .http
            .put(endpoint(&peer, &["set"])?)
            .json(&SetRequest::new(key, value, ttl))
            .send()
            .await?;
        let _: SetResponse = decode(response).await?;
        Ok(())
    }

    pub async fn ttl(&self, key: &str) -> Result<i64> {
        let peer = self.peer_for(key)?;
        let response = self
            .http
            .get(endpoint(&peer, &["ttl", key])?)
            .send()
            .await?;
        let body: TtlResponse = decode(response).await?;
        Ok(body.ttl)
    }

    /// Collects the live entries of every peer.
    pub async fn get_all(&self) -> Result<Vec<EntryResponse>> {
        let mut entries = Vec::new();
        for peer in self.peers() {
            let response = self.http.get(endpoint(&peer, &["getall"])?).send().await?;
            let body: GetAllResponse = decode(response).await?;
            entries.extend(body.entries);
        }
        Ok(entries)
    }
}

fn normalize(peer: String) -> String {
    peer.trim_end_matches('/').to_string()
}

/// Joins `segments` onto `peer`, percent-encoding each one so keys with
/// reserved characters stay a single path segment.
fn endpoint(peer: &str, segments: &[&str]) -> Result<Url> {
    let invalid = || CacheError::Peer(format!("invalid peer url '{}'", peer));
    let mut url = Url::parse(peer).map_err(|_| invalid())?;
    url.path_segments_mut()
        .map_err(|_| invalid())?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Decodes a success body, or turns an error body back into a
/// [`CacheError`].
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json::<T>().await?);
    }

    let message = match response.json::<ErrorResponse>().await {
        Ok(body) => body.error,
        Err(_) => status.to_string(),
    };
    warn!("Peer answered {}: {}", status, message);
    Err(match status {
        StatusCode::NOT_FOUND => CacheError::NotFound(message),
        StatusCode::BAD_REQUEST => CacheError::InvalidRequest(message),
        StatusCode::BAD_GATEWAY => CacheError::Retrieve(message),
        _ => CacheError::Peer(message),
    })
}
