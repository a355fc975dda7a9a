//! Consistent Hash Ring
//!
//! Maps keys to peers through virtual nodes so that each peer owns many
//! small arcs of the hash space.

use std::collections::HashMap;
use std::fmt;

use xxhash_rust::xxh64::xxh64;

/// Hash function used to place virtual nodes and keys on the ring.
pub type HashFn = fn(&[u8]) -> u64;

fn default_hash(data: &[u8]) -> u64 {
    xxh64(data, 0)
}

// == Hash Ring ==
#[derive(Clone)]
pub struct HashRing {
    hash: HashFn,
    replicas: usize,
    ring: Vec<u64>,
    owners: HashMap<u64, String>,
    peers: Vec<String>,
}

impl HashRing {
    /// Creates an empty ring with `replicas` virtual nodes per peer.
    /// `hash` defaults to xxh64.
    pub fn new(replicas: usize, hash: Option<HashFn>) -> Self {
        Self {
            hash: hash.unwrap_or(default_hash),
            replicas: replicas.max(1),
            ring: Vec::new(),
            owners: HashMap::new(),
            peers: Vec::new(),
        }
    }

    /// Replaces the ring with one built from `peers`.
    pub fn register<I, S>(&mut self, peers: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ring.clear();
        self.owners.clear();
        self.peers.clear();

        for peer in peers {
            let peer = peer.into();
            if self.peers.contains(&peer) {
                continue;
            }
            for i in 0..self.replicas {
                let point = (self.hash)(format!("{}{}", i, peer).as_bytes());
                self.ring.push(point);
                self.owners.insert(point, peer.clone());
            }
            self.peers.push(peer);
        }

        self.ring.sort_unstable();
        self.ring.dedup();
    }

    /// Returns the peer owning `key`, or `None` for an empty ring.
    pub fn get_peer(&self, key: &str) -> Option<&str> {
        if self.ring.is_empty() {
            return None;
        }
        let point = (self.hash)(key.as_bytes());
        let idx = self.ring.partition_point(|&node| node < point);
        let node = self.ring[idx % self.ring.len()];
        self.owners.get(&node).map(String::as_str)
    }

    /// Registered peers, in registration order.
    pub fn peers(&self) -> &[String] {
        &self.peers
    }

    pub fn is_empty(&self) -> bool {
        self.ring.is_empty()
    }
}

impl fmt::Debug for HashRing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HashRing")
            .field("replicas", &self.replicas)
            .field("nodes", &self.ring.len())
            .field("peers", &self.peers)
            .finish()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    /// Parses the input as a decimal number, so ring positions are obvious.
    fn numeric(data: &[u8]) -> u64 {
        std::str::from_utf8(data)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(0)
    }

    #[test]
    fn test_lookup_with_known_positions() {
        // Peers "2", "4", "6" with 3 replicas give nodes 2,4,6,12,14,16,22,24,26
        let mut ring = HashRing::new(3, Some(numeric));
        ring.register(["6", "4", "2"]);

        let cases = [("2", "2"), ("11", "2"), ("23", "4"), ("27", "2")];
        for (key, peer) in cases {
            assert_eq!(ring.get_peer(key), Some(peer), "key {}", key);
        }

        // Adding peer "8" takes over key 27 (node 28)
        ring.register(["6", "4", "2", "8"]);
        assert_eq!(ring.get_peer("27"), Some("8"));
    }

    #[test]
    fn test_empty_ring() {
        let ring = HashRing::new(50, None);
        assert!(ring.is_empty());
        assert_eq!(ring.get_peer("Tom"), None);
    }

    #[test]
    fn test_deterministic_and_member() {
        let peers = ["http://a:8001", "http://b:8002", "http://c:8003"];
        let mut ring = HashRing::new(50, None);
        ring.register(peers);

        for i in 0..200 {
            let key = format!("key{}", i);
            let owner = ring.get_peer(&key).unwrap();
            assert!(peers.contains(&owner));
            assert_eq!(ring.get_peer(&key), Some(owner));
        }
    }

    #[test]
    fn test_reregister_keeps_mapping() {
        let peers = ["alpha", "beta", "gamma"];
        let mut first = HashRing::new(20, None);
        first.register(peers);
        let mut second = first.clone();
        second.register(peers);

        for i in 0..200 {
            let key = format!("k{}", i);
            assert_eq!(first.get_peer(&key), second.get_peer(&key));
        }
        assert_eq!(second.peers(), &["alpha", "beta", "gamma"]);
    }

    #[test]
    fn test_every_peer_gets_keys() {
        let mut ring = HashRing::new(50, None);
        ring.register(["a", "b", "c"]);

        let mut counts: HashMap<&str, usize> = HashMap::new();
        for i in 0..3000 {
            let key = format!("user:{}", i);
            *counts.entry(ring.get_peer(&key).unwrap()).or_default() += 1;
        }
        assert_eq!(counts.len(), 3);
        assert!(counts.values().all(|&n| n > 300), "{:?}", counts);
    }
}
