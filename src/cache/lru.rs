//! LRU Tracker Module
//!
//! Implements Least Recently Used tracking for cache eviction.

use std::collections::HashMap;

use crate::cache::Key;

const NIL: usize = usize::MAX;

#[derive(Debug, Clone, Copy)]
struct Slot {
    key: Key,
    prev: usize,
    next: usize,
}

// == LRU Tracker ==
/// Tracks access order for LRU eviction strategy.
///
/// Keys live in a doubly linked list threaded through an arena of slots,
/// with a key -> slot index map for O(1) lookups:
/// - Head = Most recently used
/// - Tail = Least recently used
///
/// Freed slots are recycled through a free list.
#[derive(Debug)]
pub struct LruTracker {
    slots: Vec<Slot>,
    free: Vec<usize>,
    index: HashMap<Key, usize>,
    head: usize,
    tail: usize,
}

impl Default for LruTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LruTracker {
    // == Constructor ==
    /// Creates a new empty LRU tracker.
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            index: HashMap::new(),
            head: NIL,
            tail: NIL,
        }
    }

    // == Touch ==
    /// Marks a key as recently used (moves it to the head).
    ///
    /// New keys are inserted at the head.
    pub fn touch(&mut self, key: Key) {
        if let Some(&slot) = self.index.get(&key) {
            if slot != self.head {
                self.unlink(slot);
                self.push_front(slot);
            }
            return;
        }

        let slot = self.allocate(key);
        self.push_front(slot);
        self.index.insert(key, slot);
    }

    // == Remove ==
    /// Removes a key from the tracker. Unknown keys are ignored.
    pub fn remove(&mut self, key: Key) -> bool {
        match self.index.remove(&key) {
            Some(slot) => {
                self.unlink(slot);
                self.free.push(slot);
                true
            }
            None => false,
        }
    }

    // == Evict Oldest ==
    /// Returns and removes the least recently used key.
    ///
    /// Returns None if tracker is empty.
    pub fn evict_oldest(&mut self) -> Option<Key> {
        if self.tail == NIL {
            return None;
        }
        let key = self.slots[self.tail].key;
        self.remove(key);
        Some(key)
    }

    fn allocate(&mut self, key: Key) -> usize {
        let slot = Slot {
            key,
            prev: NIL,
            next: NIL,
        };
        match self.free.pop() {
            Some(idx) => {
                self.slots[idx] = slot;
                idx
            }
            None => {
                self.slots.push(slot);
                self.slots.len() - 1
            }
        }
    }

    fn push_front(&mut self, idx: usize) {
        self.slots[idx].prev = NIL;
        self.slots[idx].next = self.head;
        if self.head != NIL {
            self.slots[self.head].prev = idx;
        }
        self.head = idx;
        if self.tail == NIL {
            self.tail = idx;
        }
    }

    fn unlink(&mut self, idx: usize) {
        let Slot { prev, next, .. } = self.slots[idx];
        if prev != NIL {
            self.slots[prev].next = next;
        } else {
            self.head = next;
        }
        if next != NIL {
            self.slots[next].prev = prev;
        } else {
            self.tail = prev;
        }
        self.slots[idx].prev = NIL;
        self.slots[idx].next = NIL;
    }
}

// == Unit Tests ==
#[cfg(test)]
impl LruTracker {
    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }

    fn peek_oldest(&self) -> Option<Key> {
        (self.tail != NIL).then(|| self.slots[self.tail].key)
    }

    fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    fn contains(&self, key: Key) -> bool {
        self.index.contains_key(&key)
    }

    /// Keys from most to least recently used.
    fn iter(&self) -> impl Iterator<Item = Key> + '_ {
        let mut cursor = self.head;
        std::iter::from_fn(move || {
            if cursor == NIL {
                return None;
            }
            let slot = &self.slots[cursor];
            cursor = slot.next;
            Some(slot.key)
        })
    }
}
