//! Coalescing Queue Module
//!
//! Single-flight execution of fetch functions keyed by a request-group id.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use crate::cache::{Key, Mapping};
use crate::error::{CacheError, Result};
use crate::queue::call::Call;

// == Queue ==
/// Collapses concurrent fetches that share a request-group id into one.
///
/// The first caller for a group (the leader) runs its fetch function; every
/// caller arriving while that fetch is in flight blocks and receives the
/// leader's result verbatim. Followers' own keys and fetch functions are
/// discarded: only the group id decides what gets merged, never the key set.
///
/// The registry lock is only held for map operations, never across a fetch,
/// so different groups fetch in parallel. Nothing is cached here; a group's
/// record disappears as soon as its fetch finishes.
pub struct Queue<G, V> {
    calls: Mutex<HashMap<G, Arc<Call<V>>>>,
    executed: AtomicU64,
    coalesced: AtomicU64,
}

impl<G, V> Default for Queue<G, V> {
    fn default() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
            executed: AtomicU64::new(0),
            coalesced: AtomicU64::new(0),
        }
    }
}

impl<G, V> fmt::Debug for Queue<G, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Queue")
            .field("in_flight", &self.calls.lock().len())
            .field("executed", &self.executed())
            .field("coalesced", &self.coalesced())
            .finish()
    }
}

impl<G, V> Queue<G, V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of fetch functions this queue has executed.
    pub fn executed(&self) -> u64 {
        self.executed.load(Ordering::Relaxed)
    }

    /// Number of callers that were handed another caller's result.
    pub fn coalesced(&self) -> u64 {
        self.coalesced.load(Ordering::Relaxed)
    }

    /// Number of groups with a fetch currently running.
    pub fn in_flight(&self) -> usize {
        self.calls.lock().len()
    }
}

impl<G, V> Queue<G, V>
where
    G: Eq + Hash + Clone + fmt::Debug,
    V: Clone,
{
    // == Run ==
    /// Runs `fetch(keys)` unless a fetch for `group` is already in flight,
    /// in which case this blocks and returns that fetch's result instead.
    ///
    /// Every caller coalesced onto one fetch observes the same mapping and
    /// the same error value.
    pub fn run<F>(&self, keys: &[Key], fetch: F, group: G) -> Result<Mapping<V>>
    where
        F: FnOnce(&[Key]) -> anyhow::Result<Mapping<V>>,
    {
        let mut calls = self.calls.lock();
        if let Some(call) = calls.get(&group) {
            let call = Arc::clone(call);
            call.add_waiter();
            drop(calls);

            self.coalesced.fetch_add(1, Ordering::Relaxed);
            debug!(group = ?group, "Waiting on in-flight fetch");
            return call.wait();
        }

        let call = Arc::new(Call::new());
        calls.insert(group.clone(), Arc::clone(&call));
        drop(calls);

        self.executed.fetch_add(1, Ordering::Relaxed);
        debug!(group = ?group, keys = keys.len(), "Executing fetch");

        let mut flight = Flight {
            queue: self,
            group,
            call,
            landed: false,
        };

        let result = fetch(keys).map_err(CacheError::fetch_failed);
        if let Err(err) = &result {
            warn!(group = ?flight.group, error = %err, "Fetch failed");
        }
        flight.land(result.clone());
        result
    }

    /// Number of callers currently blocked on `group`'s fetch.
    pub fn waiters(&self, group: &G) -> usize {
        self.calls
            .lock()
            .get(group)
            .map(|call| call.waiters())
            .unwrap_or(0)
    }
}

// == Flight ==
/// Leader-side handle on a registered call.
///
/// Dropping it unregisters the group. If the fetch function unwound before a
/// result was stored, waiters are released with a failure first.
struct Flight<'a, G: Eq + Hash + fmt::Debug, V> {
    queue: &'a Queue<G, V>,
    group: G,
    call: Arc<Call<V>>,
    landed: bool,
}

impl<G: Eq + Hash + fmt::Debug, V> Flight<'_, G, V> {
    fn land(&mut self, result: Result<Mapping<V>>) {
        self.call.complete(result);
        self.landed = true;
    }
}

impl<G: Eq + Hash + fmt::Debug, V> Drop for Flight<'_, G, V> {
    fn drop(&mut self) {
        if !self.landed {
            warn!(group = ?self.group, "Fetch function panicked, releasing waiters");
            self.call.complete(Err(CacheError::fetch_failed(anyhow::anyhow!(
                "fetch function panicked"
            ))));
        }
        self.queue.calls.lock().remove(&self.group);
    }
}
