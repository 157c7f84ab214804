//! # shardlru
//!
//! An in-process, thread-safe LRU cache that spreads its keys across
//! independently locked shards.
//!
//! ## Features
//!
//! - **Sharded locking**: each shard has its own `parking_lot::Mutex`; no
//!   operation ever holds two shard locks, and there is no cache-wide lock
//! - **O(1) recency tracking**: per-shard doubly linked recency list with a
//!   key index, so hits, inserts and evictions are constant time
//! - **Capacity bound**: inserting past `max_entries` evicts one least
//!   recently used entry on the calling thread
//! - **Age-window sweep**: drop everything idle for longer than a duration
//! - **Sampling trim**: bounded-cost bulk eviction over randomly sampled shards
//! - **Statistics**: hit/miss and eviction counters (with the `stats` feature)
//!
//! Recency is exact inside a shard but only approximate across the cache:
//! capacity eviction picks the oldest entry of one shard, not of the whole
//! cache.
//!
//! ## Quick Start
//!
//! ```rust
//! use shardlru::ShardedLruCache;
//! use std::sync::Arc;
//! use std::thread;
//!
//! // 0 shards = one per logical CPU; at most 1000 entries.
//! let cache = Arc::new(ShardedLruCache::new(0, 1000));
//!
//! let handles: Vec<_> = (0..4)
//!     .map(|t| {
//!         let cache = Arc::clone(&cache);
//!         thread::spawn(move || {
//!             for i in 0..100 {
//!                 cache.add(format!("{}:{}", t, i), i);
//!             }
//!         })
//!     })
//!     .collect();
//! for handle in handles {
//!     handle.join().unwrap();
//! }
//!
//! assert_eq!(cache.len(), 400);
//! assert_eq!(cache.get("3:99"), Some(99));
//! ```
//!
//! ## Module Organization
//!
//! - [`cache_entry`] - Entry with key, value and last access time
//! - [`router`] - Key to shard routing
//! - [`eviction`] - Eviction mode selection, age filter and trim tuning
//! - [`config`] - Construction parameters
//! - [`sharded_cache`] - The cache itself
//! - [`stats`] - Hit, miss and eviction counters (`stats` feature, on by default)
//!
//! ## Logging
//!
//! The crate emits [`tracing`] events (construction and bulk removals at
//! `debug`, individual capacity evictions at `trace`, normalized
//! configuration at `warn`) and never installs a subscriber.
pub mod cache_entry;
pub mod config;
pub mod eviction;
mod recency;
pub mod router;
mod shard;
pub mod sharded_cache;

#[cfg(feature = "stats")]
pub mod stats;

pub use cache_entry::CacheEntry;
pub use config::LruConfig;
pub use eviction::{AgeFilter, EvictionMode, TrimTuning, DEFAULT_TRIM_BUDGET_FACTOR};
pub use router::ShardRouter;
pub use sharded_cache::ShardedLruCache;

#[cfg(feature = "stats")]
pub use stats::CacheStats;
