//! Peercache - a byte-bounded cache node with pluggable eviction
//!
//! Provides FIFO, LRU and LFU stores with TTL expiration, a loading cache
//! that coalesces concurrent origin fetches, and consistent-hash routing
//! between peers.

pub mod api;
pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod flight;
pub mod hashring;
pub mod loading;
pub mod models;
pub mod origin;
pub mod snapshot;
pub mod tasks;

pub use api::{create_router, AppState};
pub use client::PeerClient;
pub use config::Config;
pub use error::{CacheError, Result};
pub use loading::{LoadingCache, Retriever, RetrieverFn, TtlStrategy, MAX_TTL_SECS};
pub use tasks::{spawn_expiry_sweeper, spawn_snapshot_task};
