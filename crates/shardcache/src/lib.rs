//! # shardcache
//!
//! Sharded node-local cache built from a consistent hash ring and one LRU
//! cache per node.
//!
//! ## Architecture
//! - **Routing**: [`consistenthash::HashRing`] picks the node that owns a key
//! - **Storage**: one [`lrucache::LruCache`] per node, each behind its own mutex
//! - **Stats**: lock-free hit/miss/insert/eviction counters
//!
//! Keys whose owner changes when a node joins are not migrated; their old
//! copies age out of the previous shard.

#![warn(missing_docs)]

mod cache;
mod config;
mod error;
mod stats;

pub use cache::ShardedCache;
pub use config::ShardConfig;
pub use error::{Error, Result};
pub use stats::{CacheStats, StatsSnapshot};
