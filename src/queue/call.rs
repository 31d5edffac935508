//! In-flight call record
//!
//! A result slot plus a completion signal, shared between the caller that
//! runs a fetch and every caller waiting on it.

use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::{Condvar, Mutex};

use crate::cache::Mapping;
use crate::error::Result;

pub(crate) struct Call<V> {
    result: Mutex<Option<Result<Mapping<V>>>>,
    done: Condvar,
    waiters: AtomicUsize,
}

impl<V> Call<V> {
    pub(crate) fn new() -> Self {
        Self {
            result: Mutex::new(None),
            done: Condvar::new(),
            waiters: AtomicUsize::new(0),
        }
    }

    /// Stores the result and wakes every waiter. Only the first result sticks.
    pub(crate) fn complete(&self, result: Result<Mapping<V>>) {
        let mut slot = self.result.lock();
        if slot.is_none() {
            *slot = Some(result);
        }
        self.done.notify_all();
    }

    pub(crate) fn add_waiter(&self) {
        self.waiters.fetch_add(1, Ordering::SeqCst);
    }

    pub(crate) fn waiters(&self) -> usize {
        self.waiters.load(Ordering::SeqCst)
    }
}

impl<V: Clone> Call<V> {
    /// Blocks until the call completes and returns a copy of its result.
    pub(crate) fn wait(&self) -> Result<Mapping<V>> {
        let mut slot = self.result.lock();
        let result = loop {
            if let Some(result) = slot.as_ref() {
                break result.clone();
            }
            self.done.wait(&mut slot);
        };
        self.waiters.fetch_sub(1, Ordering::SeqCst);
        result
    }
}
