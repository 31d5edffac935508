//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check the store against a reference LRU model.

use proptest::prelude::*;
use std::cell::RefCell;
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

use crate::cache::{CacheStore, Key, Mapping};

// == Test Configuration ==
const KEY_SPACE: Key = 12;

// == Strategies ==
fn key_strategy() -> impl Strategy<Value = Key> + Clone {
    0..KEY_SPACE
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { keys: Vec<Key>, value: i64 },
    Get { keys: Vec<Key> },
    Remove { keys: Vec<Key> },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    let keys = prop::collection::vec(key_strategy(), 1..5);
    prop_oneof![
        (keys.clone(), any::<i64>()).prop_map(|(keys, value)| CacheOp::Set { keys, value }),
        keys.clone().prop_map(|keys| CacheOp::Get { keys }),
        keys.prop_map(|keys| CacheOp::Remove { keys }),
    ]
}

// == Reference Model ==
/// Recency list with the most recently used key at the front.
#[derive(Debug, Default)]
struct LruModel {
    order: VecDeque<Key>,
    capacity: usize,
}

impl LruModel {
    fn touch(&mut self, key: Key) {
        self.order.retain(|&k| k != key);
        self.order.push_front(key);
    }

    fn trim(&mut self) {
        if self.capacity > 0 {
            self.order.truncate(self.capacity);
        }
    }

    fn remove(&mut self, key: Key) {
        self.order.retain(|&k| k != key);
    }

    fn resident(&self) -> BTreeSet<Key> {
        self.order.iter().copied().collect()
    }
}

fn identity(keys: &[Key]) -> anyhow::Result<Mapping<i64>> {
    Ok(keys.iter().map(|&k| (k, k)).collect())
}

/// Keys absent from the store, found by a failing fetch over the key space.
fn missing_keys(store: &CacheStore<i64, u8>) -> BTreeSet<Key> {
    let universe: Vec<Key> = (0..KEY_SPACE).collect();
    let seen = RefCell::new(BTreeSet::new());
    let _ = store.get(
        &universe,
        |keys| {
            seen.borrow_mut().extend(keys.iter().copied());
            Err(anyhow::anyhow!("probe"))
        },
        0,
    );
    seen.into_inner()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    // The store evicts exactly what a strict LRU list of the same capacity
    // would, whether keys are touched by writes or by reads.
    #[test]
    fn prop_matches_lru_model(
        capacity in 1usize..6,
        ops in prop::collection::vec(cache_op_strategy(), 1..40)
    ) {
        let store: CacheStore<i64, u8> = CacheStore::new(capacity, Duration::ZERO);
        let mut model = LruModel { capacity, ..Default::default() };

        for op in ops {
            match op {
                CacheOp::Set { keys, value } => {
                    let mapping: Mapping<i64> = keys.iter().map(|&k| (k, value)).collect();
                    // HashMap iteration decides the write order inside one batch
                    let order: Vec<Key> = mapping.keys().copied().collect();
                    store.set(mapping);
                    for key in order {
                        model.touch(key);
                    }
                    model.trim();
                }
                CacheOp::Get { keys } => {
                    let fetched = RefCell::new(Vec::new());
                    let result = store.get(
                        &keys,
                        |missing| {
                            let mapping = identity(missing)?;
                            fetched.borrow_mut().extend(mapping.keys().copied());
                            Ok(mapping)
                        },
                        1,
                    );
                    prop_assert!(result.is_ok());

                    let fetched = fetched.into_inner();
                    let mut seen = BTreeSet::new();
                    for &key in &keys {
                        if seen.insert(key) && model.order.contains(&key) {
                            model.touch(key);
                        }
                    }
                    // Fetched keys are written in map order after the scan
                    for key in fetched {
                        model.touch(key);
                    }
                    model.trim();
                }
                CacheOp::Remove { keys } => {
                    store.remove(&keys);
                    for key in keys {
                        model.remove(key);
                    }
                }
            }
            prop_assert_eq!(store.len(), model.order.len());
        }

        let all: BTreeSet<Key> = (0..KEY_SPACE).collect();
        let expected_missing: BTreeSet<Key> =
            all.difference(&model.resident()).copied().collect();
        prop_assert_eq!(missing_keys(&store), expected_missing);
    }

    #[test]
    fn prop_capacity_enforcement(
        capacity in 1usize..20,
        batches in prop::collection::vec(prop::collection::vec(key_strategy(), 0..10), 1..30)
    ) {
        let store: CacheStore<i64, u8> = CacheStore::new(capacity, Duration::ZERO);

        for batch in batches {
            store.set(batch.iter().map(|&k| (k, k)).collect());
            prop_assert!(
                store.len() <= capacity,
                "Cache size {} exceeds max {}",
                store.len(),
                capacity
            );
        }
    }

    #[test]
    fn prop_set_then_get_hits_without_fetch(
        entries in prop::collection::hash_map(key_strategy(), any::<i64>(), 1..8),
        repeats in 1usize..4
    ) {
        let store: CacheStore<i64, u8> = CacheStore::new(0, Duration::ZERO);
        store.set(entries.clone());

        let keys: Vec<Key> = entries.keys().copied().collect();
        for _ in 0..repeats {
            let result = store.get(&keys, |_| Err(anyhow::anyhow!("unexpected fetch")), 7);
            prop_assert_eq!(result.ok(), Some(entries.clone()));
        }
    }

    #[test]
    fn prop_overwrite_semantics(key in key_strategy(), first in any::<i64>(), second in any::<i64>()) {
        let store: CacheStore<i64, u8> = CacheStore::new(0, Duration::ZERO);

        store.set(Mapping::from([(key, first)]));
        store.set(Mapping::from([(key, second)]));

        let result = store.get(&[key], |_| Err(anyhow::anyhow!("unexpected fetch")), 0);
        prop_assert_eq!(result.ok(), Some(Mapping::from([(key, second)])));
        prop_assert_eq!(store.len(), 1);
    }

    #[test]
    fn prop_failed_fetch_is_not_cached(
        cached in prop::collection::hash_map(key_strategy(), any::<i64>(), 0..6),
        requested in prop::collection::vec(key_strategy(), 1..8)
    ) {
        let store: CacheStore<i64, u8> = CacheStore::new(0, Duration::ZERO);
        store.set(cached.clone());
        let before = store.len();

        let result = store.get(&requested, |_| Err(anyhow::anyhow!("backend down")), 3);

        let expected_hits: Mapping<i64> = requested
            .iter()
            .filter_map(|k| cached.get(k).map(|v| (*k, *v)))
            .collect();
        let all_cached = requested.iter().all(|k| cached.contains_key(k));
        match result {
            Ok(values) => {
                prop_assert!(all_cached);
                prop_assert_eq!(values, expected_hits);
            }
            Err(err) => {
                prop_assert!(!all_cached);
                prop_assert_eq!(err.hits, expected_hits);
            }
        }
        prop_assert_eq!(store.len(), before);
    }

    #[test]
    fn prop_remove_deletes_entries(
        entries in prop::collection::hash_map(key_strategy(), any::<i64>(), 1..8),
        removed in prop::collection::vec(key_strategy(), 0..6)
    ) {
        let store: CacheStore<i64, u8> = CacheStore::new(0, Duration::ZERO);
        store.set(entries.clone());
        store.remove(&removed);

        let expected: BTreeSet<Key> = entries
            .keys()
            .copied()
            .filter(|k| !removed.contains(k))
            .collect();
        prop_assert_eq!(store.len(), expected.len());

        let all: BTreeSet<Key> = (0..KEY_SPACE).collect();
        let expected_missing: BTreeSet<Key> = all.difference(&expected).copied().collect();
        prop_assert_eq!(missing_keys(&store), expected_missing);
    }
}

// Separate proptest block with fewer cases for time-sensitive TTL tests
proptest! {
    #![proptest_config(ProptestConfig::with_cases(5))]

    #[test]
    fn prop_ttl_expiration_refetches(
        entries in prop::collection::hash_map(key_strategy(), 1000i64..2000, 1..6)
    ) {
        let ttl = Duration::from_millis(20);
        let store: CacheStore<i64, u8> = CacheStore::new(0, ttl);
        store.set(entries.clone());

        let keys: Vec<Key> = entries.keys().copied().collect();
        std::thread::sleep(ttl);

        let result = store.get(&keys, identity, 0);
        let expected: Mapping<i64> = keys.iter().map(|&k| (k, k)).collect();
        prop_assert_eq!(result.ok(), Some(expected));
        prop_assert_eq!(store.len(), keys.len());
    }
}
