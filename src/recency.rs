//! Slab-backed doubly linked list ordering entries by recency.
//!
//! Nodes live in a `Vec` and refer to their neighbours by slot index, so
//! push-front, move-to-front, unlink and pop-back are all O(1) without
//! `unsafe`. Vacated slots are recycled through a free list. A slot index
//! stays valid for as long as the entry it was returned for is linked.

use crate::CacheEntry;

const NIL: usize = usize::MAX;

struct Node<K, V> {
    entry: CacheEntry<K, V>,
    prev: usize,
    next: usize,
}

/// Entries ordered from most recently used (front) to least recently used (back).
pub(crate) struct RecencyList<K, V> {
    slots: Vec<Option<Node<K, V>>>,
    free: Vec<usize>,
    head: usize,
    tail: usize,
    len: usize,
}

impl<K, V> RecencyList<K, V> {
    pub(crate) fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            head: NIL,
            tail: NIL,
            len: 0,
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Links a new entry at the front and returns its slot.
    pub(crate) fn push_front(&mut self, entry: CacheEntry<K, V>) -> usize {
        let node = Node {
            entry,
            prev: NIL,
            next: NIL,
        };
        let slot = match self.free.pop() {
            Some(slot) => {
                self.slots[slot] = Some(node);
                slot
            }
            None => {
                self.slots.push(Some(node));
                self.slots.len() - 1
            }
        };
        self.link_front(slot);
        self.len += 1;
        slot
    }

    /// Moves a linked slot to the front. Unknown slots are ignored.
    pub(crate) fn move_to_front(&mut self, slot: usize) {
        if slot == self.head || self.node(slot).is_none() {
            return;
        }
        self.unlink(slot);
        self.link_front(slot);
    }

    pub(crate) fn get(&self, slot: usize) -> Option<&CacheEntry<K, V>> {
        self.node(slot).map(|n| &n.entry)
    }

    pub(crate) fn get_mut(&mut self, slot: usize) -> Option<&mut CacheEntry<K, V>> {
        self.node_mut(slot).map(|n| &mut n.entry)
    }

    /// Unlinks a slot and hands back its entry.
    pub(crate) fn remove(&mut self, slot: usize) -> Option<CacheEntry<K, V>> {
        self.node(slot)?;
        self.unlink(slot);
        let node = self.slots[slot].take()?;
        self.free.push(slot);
        self.len -= 1;
        Some(node.entry)
    }

    /// The least recently used entry, if any.
    pub(crate) fn back(&self) -> Option<&CacheEntry<K, V>> {
        self.get(self.tail)
    }

    pub(crate) fn pop_back(&mut self) -> Option<CacheEntry<K, V>> {
        if self.tail == NIL {
            return None;
        }
        self.remove(self.tail)
    }

    /// Iterates entries from most to least recently used.
    #[cfg(test)]
    pub(crate) fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            list: self,
            cursor: self.head,
        }
    }

    fn node(&self, slot: usize) -> Option<&Node<K, V>> {
        self.slots.get(slot).and_then(Option::as_ref)
    }

    fn node_mut(&mut self, slot: usize) -> Option<&mut Node<K, V>> {
        self.slots.get_mut(slot).and_then(Option::as_mut)
    }

    fn unlink(&mut self, slot: usize) {
        let (prev, next) = match self.node(slot) {
            Some(n) => (n.prev, n.next),
            None => return,
        };

        if prev == NIL {
            self.head = next;
        } else if let Some(p) = self.node_mut(prev) {
            p.next = next;
        }

        if next == NIL {
            self.tail = prev;
        } else if let Some(n) = self.node_mut(next) {
            n.prev = prev;
        }
    }

    fn link_front(&mut self, slot: usize) {
        let old_head = self.head;
        if let Some(n) = self.node_mut(slot) {
            n.prev = NIL;
            n.next = old_head;
        }

        if old_head == NIL {
            self.tail = slot;
        } else if let Some(h) = self.node_mut(old_head) {
            h.prev = slot;
        }
        self.head = slot;
    }

    /// Walks the list both ways and checks the links agree with `len`.
    #[cfg(test)]
    pub(crate) fn validate_invariants(&self) {
        let mut count = 0;
        let mut prev = NIL;
        let mut cursor = self.head;
        while cursor != NIL {
            let node = self.node(cursor).expect("linked slot must be occupied");
            assert_eq!(node.prev, prev);
            prev = cursor;
            cursor = node.next;
            count += 1;
        }
        assert_eq!(prev, self.tail);
        assert_eq!(count, self.len);
        assert_eq!(self.slots.len() - self.free.len(), self.len);
    }
}

impl<K, V> Default for RecencyList<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) struct Iter<'a, K, V> {
    list: &'a RecencyList<K, V>,
    cursor: usize,
}

#[cfg(test)]
impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = &'a CacheEntry<K, V>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.list.node(self.cursor)?;
        self.cursor = node.next;
        Some(&node.entry)
    }
}
