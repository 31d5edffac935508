//! Cache Store Module
//!
//! Main cache engine combining HashMap storage with LRU tracking, TTL
//! expiration and single-flight resolution of misses.

use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet, VecDeque};
use std::fmt;
use std::hash::Hash;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheEntry, CacheStats, Key, LruTracker, Mapping};
use crate::error::GetError;
use crate::queue::Queue;

// == Cache Store ==
/// Batched read-through cache with LRU eviction and TTL support.
///
/// A single lock guards entries, recency order and statistics, since even a
/// read hit reorders the LRU list. Misses are resolved through the store's
/// [`Queue`] with the lock released.
pub struct CacheStore<V, G = String> {
    inner: Mutex<StoreInner<V>>,
    queue: Queue<G, V>,
    /// Maximum number of entries allowed, 0 = unbounded
    max_entries: usize,
    /// Entry lifetime, zero = never expires
    ttl: Duration,
}

struct StoreInner<V> {
    /// Key-value storage
    entries: HashMap<Key, CacheEntry<V>>,
    /// LRU access tracker
    lru: LruTracker,
    /// Write order for expiry; records superseded by a later write are skipped
    expiry: VecDeque<(Instant, Key)>,
    /// Performance statistics
    stats: CacheStats,
}

impl<V, G> fmt::Debug for CacheStore<V, G> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheStore")
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .field("entries", &self.inner.lock().entries.len())
            .field("queue", &self.queue)
            .finish()
    }
}

impl<V, G> CacheStore<V, G> {
    // == Constructor ==
    /// Creates a new CacheStore with specified capacity and entry lifetime.
    ///
    /// # Arguments
    /// * `max_entries` - Maximum number of entries, 0 for no limit
    /// * `ttl` - Lifetime of an entry after its last write, zero for no expiry
    pub fn new(max_entries: usize, ttl: Duration) -> Self {
        Self {
            inner: Mutex::new(StoreInner {
                entries: HashMap::new(),
                lru: LruTracker::new(),
                expiry: VecDeque::new(),
                stats: CacheStats::new(),
            }),
            queue: Queue::new(),
            max_entries,
            ttl,
        }
    }

    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// The queue resolving this store's misses.
    pub fn queue(&self) -> &Queue<G, V> {
        &self.queue
    }

    // == Remove ==
    /// Removes the given keys. Absent keys are ignored.
    ///
    /// Returns the number of entries removed.
    pub fn remove(&self, keys: &[Key]) -> usize {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let mut removed = 0;
        for key in keys {
            if inner.entries.remove(key).is_some() {
                inner.lru.remove(*key);
                removed += 1;
            }
        }
        inner.compact_expiry();
        inner.stats.set_total_entries(inner.entries.len());
        removed
    }

    // == Cleanup Expired ==
    /// Removes all expired entries from the cache.
    ///
    /// Returns the number of entries removed.
    pub fn purge_expired(&self) -> usize {
        self.inner.lock().purge_expired(Instant::now())
    }

    // == Length ==
    /// Returns the number of live (non-expired) entries.
    pub fn len(&self) -> usize {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        inner.entries.len()
    }

    // == Is Empty ==
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub fn stats(&self) -> CacheStats {
        let mut inner = self.inner.lock();
        inner.purge_expired(Instant::now());
        let mut stats = inner.stats.clone();
        stats.set_total_entries(inner.entries.len());
        stats.fetches = self.queue.executed();
        stats.coalesced = self.queue.coalesced();
        stats
    }
}

impl<V: Clone, G> CacheStore<V, G> {
    // == Set ==
    /// Stores every pair of `mapping`, then trims the store to capacity.
    ///
    /// Existing keys get their value replaced and their lifetime restarted.
    /// Every written key becomes most recently used.
    pub fn set(&self, mapping: Mapping<V>) {
        let mut guard = self.inner.lock();
        // Taken under the lock so expiry records stay in deadline order
        let now = Instant::now();
        let inner = &mut *guard;
        inner.purge_expired(now);

        for (key, value) in mapping {
            let expires_at = match inner.entries.entry(key) {
                Entry::Occupied(mut slot) => {
                    slot.get_mut().replace(value, self.ttl, now);
                    slot.get().expires_at
                }
                Entry::Vacant(slot) => {
                    slot.insert(CacheEntry::new(value, self.ttl, now))
                        .expires_at
                }
            };
            inner.lru.touch(key);
            if let Some(expires_at) = expires_at {
                inner.expiry.push_back((expires_at, key));
            }
        }

        if self.max_entries > 0 && inner.entries.len() > self.max_entries {
            let mut evicted = 0;
            while inner.entries.len() > self.max_entries {
                let Some(key) = inner.lru.evict_oldest() else {
                    break;
                };
                inner.entries.remove(&key);
                evicted += 1;
            }
            inner.stats.record_evictions(evicted);
            debug!(evicted, "Evicted least recently used entries");
        }

        inner.compact_expiry();
        inner.stats.set_total_entries(inner.entries.len());
    }
}

impl<V, G> CacheStore<V, G>
where
    V: Clone,
    G: Eq + Hash + Clone + fmt::Debug,
{
    // == Get ==
    /// Resolves `keys` from the cache, fetching the misses.
    ///
    /// Hits refresh their recency. Absent or expired keys are passed, in
    /// request order and without duplicates, to `fetch` through the store's
    /// queue under `group`. A successful fetch is stored and merged into
    /// the returned mapping. A failed fetch is not stored: the error comes
    /// back together with the hits.
    ///
    /// # Arguments
    /// * `keys` - The keys to resolve
    /// * `fetch` - Loads missing keys from the backend
    /// * `group` - Concurrent callers with the same group share one fetch
    pub fn get<F>(&self, keys: &[Key], fetch: F, group: G) -> Result<Mapping<V>, GetError<V>>
    where
        F: FnOnce(&[Key]) -> anyhow::Result<Mapping<V>>,
    {
        let mut hits = Mapping::with_capacity(keys.len());
        let mut misses = Vec::new();
        {
            let now = Instant::now();
            let mut inner = self.inner.lock();
            let mut seen = HashSet::with_capacity(keys.len());

            for &key in keys {
                if !seen.insert(key) {
                    continue;
                }
                match inner.lookup(key, now) {
                    Some(value) => {
                        hits.insert(key, value);
                        inner.stats.record_hit();
                    }
                    None => {
                        misses.push(key);
                        inner.stats.record_miss();
                    }
                }
            }
        }

        if misses.is_empty() {
            return Ok(hits);
        }

        match self.queue.run(&misses, fetch, group) {
            Ok(fetched) => {
                self.set(fetched.clone());
                hits.extend(fetched);
                Ok(hits)
            }
            Err(source) => {
                self.inner.lock().stats.record_fetch_error();
                Err(GetError { hits, source })
            }
        }
    }
}

impl<V: Clone> StoreInner<V> {
    /// Returns a live entry's value and marks it most recently used.
    /// An expired entry is dropped and reported as absent.
    fn lookup(&mut self, key: Key, now: Instant) -> Option<V> {
        let expired = self.entries.get(&key)?.is_expired(now);
        if expired {
            self.entries.remove(&key);
            self.lru.remove(key);
            self.stats.record_expirations(1);
            return None;
        }
        self.lru.touch(key);
        self.entries.get(&key).map(|entry| entry.value.clone())
    }
}

impl<V> StoreInner<V> {
    fn purge_expired(&mut self, now: Instant) -> usize {
        let mut removed = 0;
        while let Some(&(expires_at, key)) = self.expiry.front() {
            if expires_at > now {
                break;
            }
            self.expiry.pop_front();
            let current = self
                .entries
                .get(&key)
                .is_some_and(|entry| entry.expires_at == Some(expires_at));
            if current {
                self.entries.remove(&key);
                self.lru.remove(key);
                removed += 1;
            }
        }

        if removed > 0 {
            self.stats.record_expirations(removed);
            let len = self.entries.len();
            self.stats.set_total_entries(len);
            debug!(removed, "Purged expired entries");
        }
        removed
    }

    /// Drops expiry records superseded by a rewrite, eviction or removal
    /// once they outnumber live entries two to one.
    fn compact_expiry(&mut self) {
        if self.expiry.len() <= 2 * self.entries.len().max(1) {
            return;
        }
        let entries = &self.entries;
        self.expiry.retain(|(expires_at, key)| {
            entries
                .get(key)
                .is_some_and(|entry| entry.expires_at == Some(*expires_at))
        });
    }
}
