//! Cache Module
//!
//! Provides a batched read-through cache with TTL expiration and LRU eviction.

use std::collections::HashMap;

mod entry;
mod lru;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::CacheEntry;
pub use lru::LruTracker;
pub use stats::CacheStats;
pub use store::CacheStore;

/// Identifier of a cached value.
pub type Key = i64;

/// Values keyed by id, as passed to and returned from the cache.
pub type Mapping<V> = HashMap<Key, V>;
