use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::time::Instant;

use crate::recency::RecencyList;
use crate::CacheEntry;

/// One independently locked partition of the cache.
///
/// A shard pairs a recency list with an index from key to list slot. Both are
/// only ever mutated together, so every indexed key has exactly one node in
/// the list and every node is indexed.
///
/// Callers pass `now` from inside the shard lock. Because `Instant` is
/// monotonic, `last_access` is then non-increasing from front to back, which
/// is what lets age sweeps stop at the first fresh entry.
pub(crate) struct Shard<K, V> {
    order: RecencyList<K, V>,
    index: HashMap<K, usize>,
}

impl<K, V> Shard<K, V>
where
    K: Hash + Eq + Clone,
{
    pub(crate) fn new() -> Self {
        Self {
            order: RecencyList::new(),
            index: HashMap::new(),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Inserts or refreshes `key`.
    ///
    /// Returns `None` when the key is new, or the replaced value when the key
    /// was already present. Either way the key ends up most recently used.
    pub(crate) fn insert(&mut self, key: K, value: V, now: Instant) -> Option<V> {
        if let Some(&slot) = self.index.get(&key) {
            self.order.move_to_front(slot);
            return self.order.get_mut(slot).map(|e| e.replace(value, now));
        }

        let slot = self
            .order
            .push_front(CacheEntry::with_access(key.clone(), value, now));
        self.index.insert(key, slot);
        None
    }

    /// Looks up `key`, marking it most recently used on a hit.
    pub(crate) fn get<Q>(&mut self, key: &Q, now: Instant) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = *self.index.get(key)?;
        self.order.move_to_front(slot);
        let entry = self.order.get_mut(slot)?;
        entry.touch(now);
        Some(&entry.value)
    }

    pub(crate) fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.index.contains_key(key)
    }

    pub(crate) fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let slot = self.index.remove(key)?;
        self.order.remove(slot).map(|e| e.value)
    }

    /// Least recently used entry, if any.
    pub(crate) fn back(&self) -> Option<&CacheEntry<K, V>> {
        self.order.back()
    }

    /// Removes the least recently used entry if `admit` accepts it.
    pub(crate) fn pop_back_if<F>(&mut self, admit: F) -> Option<CacheEntry<K, V>>
    where
        F: FnOnce(&CacheEntry<K, V>) -> bool,
    {
        if !admit(self.back()?) {
            return None;
        }
        let entry = self.order.pop_back()?;
        self.index.remove(&entry.key);
        Some(entry)
    }

    pub(crate) fn pop_back(&mut self) -> Option<CacheEntry<K, V>> {
        self.pop_back_if(|_| true)
    }

    /// Keys from most to least recently used.
    #[cfg(test)]
    pub(crate) fn keys(&self) -> impl Iterator<Item = &K> {
        self.order.iter().map(|e| &e.key)
    }
}

impl<K, V> Default for Shard<K, V>
where
    K: Hash + Eq + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}
