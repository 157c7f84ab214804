use parking_lot::Mutex;
use std::borrow::Borrow;
use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use crate::eviction::{AgeFilter, EvictionMode, TrimTuning};
use crate::router::ShardRouter;
use crate::shard::Shard;
use crate::LruConfig;
#[cfg(feature = "stats")]
use crate::CacheStats;

/// A thread-safe LRU cache split into independently locked shards.
///
/// Each key is routed to exactly one shard. A shard keeps its entries in
/// recency order (most recently used first) behind its own
/// `parking_lot::Mutex`, so operations on keys in different shards never
/// contend. Recency is exact within a shard and approximate across the cache.
///
/// # Type Parameters
///
/// * `K` - The key type. Lookups accept any borrowed form `Q` of it.
/// * `V` - The stored value. It is never inspected; `get` returns a clone,
///   so store `Arc<T>` for payloads that are expensive to clone.
///
/// # Capacity
///
/// With a positive `max_entries`, an `add` that pushes the total above the
/// bound evicts exactly one entry before returning: the least recently used
/// entry of the shard the key went to, or of the next non-empty shard if
/// the new key is alone in its shard.
///
/// # Counting
///
/// The total entry count is a single atomic updated with relaxed ordering.
/// [`len`](Self::len) is therefore an estimate while other threads are
/// writing, and a concurrent `add` can leave a just-cleared cache non-empty.
///
/// # Thread Safety
///
/// No operation holds more than one shard lock at a time and none blocks on
/// anything but a shard lock. There are no background threads; eviction runs
/// on the calling thread.
///
/// # Examples
///
/// ```
/// use shardlru::ShardedLruCache;
/// use std::time::Duration;
///
/// let cache = ShardedLruCache::new(4, 100);
/// cache.add("user:1".to_string(), 42);
/// assert_eq!(cache.get("user:1"), Some(42));
///
/// cache.remove("user:1");
/// assert_eq!(cache.get("user:1"), None);
///
/// // Drop everything idle for more than a minute.
/// let removed = cache.remove_oldest(Duration::from_secs(60), 0);
/// assert_eq!(removed, 0);
/// ```
pub struct ShardedLruCache<K, V> {
    router: ShardRouter,
    shards: Box<[Mutex<Shard<K, V>>]>,
    max_entries: usize,
    count: AtomicUsize,
    tuning: TrimTuning,
    #[cfg(feature = "stats")]
    stats: CacheStats,
}

impl<K, V> ShardedLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// Creates a cache with `shard_count` shards holding at most
    /// `max_entries` entries.
    ///
    /// `shard_count == 0` selects one shard per logical CPU and
    /// `max_entries == 0` leaves the cache unbounded.
    pub fn new(shard_count: usize, max_entries: usize) -> Self {
        Self::with_config(LruConfig::new(shard_count, max_entries))
    }

    /// Creates a cache from a full configuration, normalizing it as needed.
    pub fn with_config(config: LruConfig) -> Self {
        let router = ShardRouter::new(config.shard_count);
        let tuning = TrimTuning::new(
            config.trim_budget_factor,
            config.floor_budget_at_shard_count,
        );
        let shards = (0..router.shard_count())
            .map(|_| Mutex::new(Shard::new()))
            .collect::<Vec<_>>()
            .into_boxed_slice();

        tracing::debug!(
            shard_count = router.shard_count(),
            max_entries = config.max_entries,
            "sharded lru cache created"
        );

        Self {
            router,
            shards,
            max_entries: config.max_entries,
            count: AtomicUsize::new(0),
            tuning,
            #[cfg(feature = "stats")]
            stats: CacheStats::new(),
        }
    }

    /// Inserts `value` under `key`, or replaces the value of an existing key.
    ///
    /// Either way the key becomes the most recently used entry of its shard.
    /// Inserting a new key into a full cache evicts one entry before this
    /// call returns; replacing a value never evicts.
    pub fn add(&self, key: K, value: V) {
        let idx = self.router.shard_for(&key);
        let count = {
            let mut shard = self.shards[idx].lock();
            let now = Instant::now();
            if let Some(previous) = shard.insert(key, value, now) {
                drop(shard);
                drop(previous);
                return;
            }
            self.count.fetch_add(1, Ordering::Relaxed) + 1
        };

        if self.max_entries > 0 && count > self.max_entries {
            self.evict_one(idx);
        }
    }

    /// Returns a clone of the value stored under `key`, marking it most
    /// recently used.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
        V: Clone,
    {
        let value = {
            let mut shard = self.shards[self.router.shard_for(key)].lock();
            let now = Instant::now();
            shard.get(key, now).cloned()
        };

        #[cfg(feature = "stats")]
        {
            if value.is_some() {
                self.stats.record_hit();
            } else {
                self.stats.record_miss();
            }
        }

        value
    }

    /// Returns true if `key` is cached. Does not affect recency.
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.shards[self.router.shard_for(key)].lock().contains(key)
    }

    /// Removes `key`, returning its value if it was present.
    ///
    /// Removing an absent key is a no-op.
    pub fn remove<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let removed = self.shards[self.router.shard_for(key)].lock().remove(key);
        if removed.is_some() {
            self.count.fetch_sub(1, Ordering::Relaxed);
        }
        removed
    }

    /// Approximate number of cached entries.
    ///
    /// A lock-free read of the shared counter; exact only when no other
    /// thread is mutating the cache.
    #[inline]
    pub fn len(&self) -> usize {
        self.count.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The configured entry bound; `0` means unbounded.
    #[inline]
    pub fn max_entries(&self) -> usize {
        self.max_entries
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.router.shard_count()
    }

    /// Removes entries by age and/or count and returns how many were removed.
    ///
    /// # Parameters
    ///
    /// * `max_age` - Only entries idle for longer than this are removed.
    ///   `Duration::ZERO` disables the age filter.
    /// * `max_count` - Upper bound on removals. `0` means no bound.
    ///
    /// # Behavior
    ///
    /// - `max_count == 0` and no age filter: clears the cache.
    /// - `max_count == 0` with an age filter: sweeps every shard from its
    ///   least recently used end, removing entries older than the cutoff and
    ///   stopping at the first fresh entry.
    /// - `max_count >= len()`: clears the cache.
    /// - Otherwise: a sampling trim. Each round locks one uniformly random
    ///   shard and removes its least recently used entry if it passes the age
    ///   filter. Rounds are budgeted (see [`TrimTuning`]), so fewer than
    ///   `max_count` entries may be removed when sampled shards are empty or
    ///   hold only fresh entries.
    ///
    /// # Examples
    ///
    /// ```
    /// use shardlru::ShardedLruCache;
    /// use std::time::Duration;
    ///
    /// let cache = ShardedLruCache::new(1, 0);
    /// for i in 0..13 {
    ///     cache.add(format!("tk{}", i), i);
    /// }
    ///
    /// assert_eq!(cache.remove_oldest(Duration::ZERO, 3), 3);
    /// assert_eq!(cache.len(), 10);
    /// assert!(!cache.contains("tk0"));
    /// ```
    pub fn remove_oldest(&self, max_age: Duration, max_count: usize) -> usize {
        let mode = EvictionMode::select(max_age, max_count, self.len());
        let removed = match mode {
            EvictionMode::Clear => self.clear(),
            EvictionMode::AgeSweep => self.sweep(max_age),
            EvictionMode::SampledTrim => self.sampled_trim(max_age, max_count),
        };

        #[cfg(feature = "stats")]
        self.stats.record_trimmed(removed);

        tracing::debug!(
            mode = mode.as_str(),
            max_age = ?max_age,
            max_count,
            removed,
            "removed oldest entries"
        );
        removed
    }

    /// Empties every shard and returns the number of entries dropped.
    ///
    /// Shards are cleared one at a time. Entries added concurrently to an
    /// already cleared shard survive, so `len()` may be non-zero afterwards
    /// under concurrent writers.
    pub fn clear(&self) -> usize {
        let mut cleared = 0;
        for shard in self.shards.iter() {
            let taken = std::mem::take(&mut *shard.lock());
            if taken.is_empty() {
                continue;
            }
            let n = taken.len();
            self.count.fetch_sub(n, Ordering::Relaxed);
            cleared += n;
        }

        tracing::debug!(cleared, "cache cleared");
        cleared
    }

    /// Returns a reference to the cache statistics.
    #[cfg(feature = "stats")]
    pub fn stats(&self) -> &CacheStats {
        &self.stats
    }

    /// Evicts one least recently used entry after an insert into shard `start`.
    ///
    /// The insert's own shard is tried first unless the new key is all it
    /// holds; then the remaining shards in order, wrapping around.
    fn evict_one(&self, start: usize) {
        let n = self.shards.len();
        for step in 0..n {
            let idx = (start + step) % n;
            let keep = if step == 0 { 1 } else { 0 };
            let evicted = {
                let mut shard = self.shards[idx].lock();
                if shard.len() > keep {
                    shard.pop_back()
                } else {
                    None
                }
            };

            if let Some(entry) = evicted {
                let remaining = self.count.fetch_sub(1, Ordering::Relaxed).saturating_sub(1);
                #[cfg(feature = "stats")]
                self.stats.record_capacity_eviction();
                tracing::trace!(
                    shard = idx,
                    remaining,
                    idle = ?entry.idle(),
                    "capacity eviction"
                );
                return;
            }
        }
    }

    fn sweep(&self, max_age: Duration) -> usize {
        let filter = AgeFilter::new(max_age, Instant::now());
        let mut removed = 0;
        for shard in self.shards.iter() {
            let mut evicted = Vec::new();
            {
                let mut shard = shard.lock();
                while let Some(entry) = shard.pop_back_if(|e| filter.admits(e)) {
                    evicted.push(entry);
                }
            }

            if !evicted.is_empty() {
                self.count.fetch_sub(evicted.len(), Ordering::Relaxed);
                removed += evicted.len();
            }
        }
        removed
    }

    fn sampled_trim(&self, max_age: Duration, max_count: usize) -> usize {
        let shard_count = self.shards.len();
        let rounds = self.tuning.rounds(max_count, shard_count);
        let filter = AgeFilter::new(max_age, Instant::now());

        let mut removed = 0;
        let mut round = 0;
        while round < rounds && removed < max_count {
            round += 1;
            let idx = fastrand::usize(..shard_count);
            let evicted = self.shards[idx].lock().pop_back_if(|e| filter.admits(e));
            if evicted.is_some() {
                self.count.fetch_sub(1, Ordering::Relaxed);
                removed += 1;
            }
        }

        tracing::trace!(rounds = round, budget = rounds, removed, "sampling trim finished");
        removed
    }
}

impl<K, V> Default for ShardedLruCache<K, V>
where
    K: Hash + Eq + Clone,
{
    /// An unbounded cache with one shard per logical CPU.
    fn default() -> Self {
        Self::new(0, 0)
    }
}

impl<K, V> fmt::Debug for ShardedLruCache<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShardedLruCache")
            .field("shard_count", &self.router.shard_count())
            .field("max_entries", &self.max_entries)
            .field("len", &self.count.load(Ordering::Relaxed))
            .field("tuning", &self.tuning)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn shard_keys(cache: &ShardedLruCache<String, i32>, idx: usize) -> Vec<String> {
        cache.shards[idx].lock().keys().cloned().collect()
    }

    #[test]
    fn test_add_get_round_trip() {
        let cache = ShardedLruCache::new(0, 0);
        cache.add("k1".to_string(), "a");
        cache.add("k2".to_string(), "b");
        assert_eq!(cache.get("k1"), Some("a"));
        assert_eq!(cache.get("k2"), Some("b"));
        assert_eq!(cache.get("k3"), None);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_add_existing_replaces_without_count_change() {
        let cache = ShardedLruCache::new(1, 0);
        cache.add("k".to_string(), 1);
        cache.add("k".to_string(), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn test_remove_is_idempotent() {
        let cache = ShardedLruCache::new(0, 0);
        cache.add("k".to_string(), 1);
        assert_eq!(cache.remove("k"), Some(1));
        assert_eq!(cache.remove("k"), None);
        assert_eq!(cache.get("k"), None);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_get_promotes_within_shard() {
        let cache = ShardedLruCache::new(1, 0);
        for i in 0..3 {
            cache.add(format!("k{}", i), i);
        }
        assert_eq!(shard_keys(&cache, 0), vec!["k2", "k1", "k0"]);

        cache.get("k0");
        assert_eq!(shard_keys(&cache, 0), vec!["k0", "k2", "k1"]);
    }

    #[test]
    fn test_contains_does_not_promote() {
        let cache = ShardedLruCache::new(1, 0);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        assert!(cache.contains("a"));
        assert_eq!(shard_keys(&cache, 0), vec!["b", "a"]);
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let cache = ShardedLruCache::new(1, 3);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        cache.add("c".to_string(), 3);
        cache.get("a");
        cache.add("d".to_string(), 4);

        assert_eq!(cache.len(), 3);
        assert!(!cache.contains("b"));
        assert!(cache.contains("a"));
        assert!(cache.contains("d"));
    }

    #[test]
    fn test_capacity_eviction_skips_lonely_new_key() {
        let cache: ShardedLruCache<String, i32> = ShardedLruCache::new(2, 1);
        // find two keys routed to different shards
        let first = "seed".to_string();
        let first_shard = cache.router.shard_for(&first);
        let second = (0..)
            .map(|i| format!("other{}", i))
            .find(|k| cache.router.shard_for(k) != first_shard)
            .unwrap();

        cache.add(first.clone(), 1);
        cache.add(second.clone(), 2);

        assert_eq!(cache.len(), 1);
        assert!(cache.contains(&second));
        assert!(!cache.contains(&first));
    }

    #[test]
    fn test_sampled_trim_single_shard() {
        let cache = ShardedLruCache::new(1, 0);
        for i in 0..13 {
            cache.add(format!("tk{}", i), i);
        }
        assert_eq!(cache.remove_oldest(Duration::ZERO, 3), 3);
        assert_eq!(cache.len(), 10);
        for i in 0..3 {
            assert!(!cache.contains(format!("tk{}", i).as_str()));
        }
    }

    #[test]
    fn test_remove_oldest_count_covering_everything_clears() {
        let cache = ShardedLruCache::new(4, 0);
        for i in 0..5 {
            cache.add(format!("k{}", i), i);
        }
        assert_eq!(cache.remove_oldest(Duration::ZERO, 5), 5);
        assert!(cache.is_empty());
    }

    #[test]
    fn test_remove_oldest_without_limits_clears() {
        let cache = ShardedLruCache::new(4, 0);
        for i in 0..7 {
            cache.add(format!("k{}", i), i);
        }
        assert_eq!(cache.remove_oldest(Duration::ZERO, 0), 7);
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn test_sampled_trim_skips_fresh_entries() {
        let cache = ShardedLruCache::new(1, 0);
        for i in 0..5 {
            cache.add(format!("k{}", i), i);
        }
        assert_eq!(cache.remove_oldest(Duration::from_secs(3600), 2), 0);
        assert_eq!(cache.len(), 5);
    }

    #[test]
    fn test_clear_returns_count() {
        let cache = ShardedLruCache::new(8, 0);
        for i in 0..100 {
            cache.add(format!("k{}", i), i);
        }
        assert_eq!(cache.clear(), 100);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.clear(), 0);
        for idx in 0..8 {
            assert!(shard_keys(&cache, idx).is_empty());
        }
    }

    #[cfg(feature = "stats")]
    #[test]
    fn test_stats_track_hits_misses_and_evictions() {
        let cache = ShardedLruCache::new(1, 2);
        cache.add("a".to_string(), 1);
        cache.add("b".to_string(), 2);
        cache.add("c".to_string(), 3);
        cache.get("c");
        cache.get("a");
        cache.remove_oldest(Duration::ZERO, 1);

        let stats = cache.stats();
        assert_eq!(stats.hits(), 1);
        assert_eq!(stats.misses(), 1);
        assert_eq!(stats.capacity_evictions(), 1);
        assert_eq!(stats.trimmed(), 1);
    }

    #[test]
    fn test_concurrent_adds_keep_count_exact_at_rest() {
        let cache = Arc::new(ShardedLruCache::new(8, 0));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for i in 0..500 {
                        cache.add(format!("{} {}", t, i), i);
                    }
                })
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(cache.len(), 4000);
    }

    #[test]
    fn test_debug_output() {
        let cache: ShardedLruCache<String, i32> = ShardedLruCache::new(3, 9);
        let out = format!("{:?}", cache);
        assert!(out.contains("shard_count: 3"));
        assert!(out.contains("max_entries: 9"));
    }
}
