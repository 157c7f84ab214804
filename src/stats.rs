use std::sync::atomic::{AtomicU64, Ordering};

/// Cache statistics for monitoring hit rates and eviction pressure.
///
/// All counters are updated with `Relaxed` atomics outside the shard locks,
/// so under concurrent use they are estimates in the same way
/// `ShardedLruCache::len` is.
///
/// # Counters
///
/// * `hits` / `misses` - outcome of every `get`
/// * `capacity_evictions` - entries dropped because an `add` pushed the
///   cache over its bound
/// * `trimmed` - entries dropped by `remove_oldest`
///
/// # Examples
///
/// ```
/// use shardlru::CacheStats;
///
/// let stats = CacheStats::new();
/// stats.record_hit();
/// stats.record_hit();
/// stats.record_miss();
///
/// assert_eq!(stats.hits(), 2);
/// assert_eq!(stats.misses(), 1);
/// assert_eq!(stats.total_accesses(), 3);
/// assert!((stats.hit_rate() - 0.6666).abs() < 0.001);
/// ```
#[derive(Debug)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    capacity_evictions: AtomicU64,
    trimmed: AtomicU64,
}

impl CacheStats {
    /// Creates a new `CacheStats` instance with zero counters.
    pub fn new() -> Self {
        Self {
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            capacity_evictions: AtomicU64::new(0),
            trimmed: AtomicU64::new(0),
        }
    }

    #[inline]
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn record_capacity_eviction(&self) {
        self.capacity_evictions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records `count` entries removed by one `remove_oldest` call.
    #[inline]
    pub fn record_trimmed(&self, count: usize) {
        if count > 0 {
            self.trimmed.fetch_add(count as u64, Ordering::Relaxed);
        }
    }

    #[inline]
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn capacity_evictions(&self) -> u64 {
        self.capacity_evictions.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn trimmed(&self) -> u64 {
        self.trimmed.load(Ordering::Relaxed)
    }

    /// Returns the total number of lookups (hits + misses).
    #[inline]
    pub fn total_accesses(&self) -> u64 {
        self.hits() + self.misses()
    }

    /// Fraction of lookups that hit, from 0.0 to 1.0.
    ///
    /// Returns 0.0 if there have been no lookups.
    ///
    /// # Examples
    ///
    /// ```
    /// use shardlru::CacheStats;
    ///
    /// let stats = CacheStats::new();
    /// assert_eq!(stats.hit_rate(), 0.0);
    ///
    /// stats.record_hit();
    /// stats.record_miss();
    /// assert_eq!(stats.hit_rate(), 0.5);
    /// ```
    #[inline]
    pub fn hit_rate(&self) -> f64 {
        let total = self.total_accesses();
        if total == 0 {
            0.0
        } else {
            self.hits() as f64 / total as f64
        }
    }

    #[inline]
    pub fn miss_rate(&self) -> f64 {
        1.0 - self.hit_rate()
    }

    /// Resets all counters to zero.
    pub fn reset(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.capacity_evictions.store(0, Ordering::Relaxed);
        self.trimmed.store(0, Ordering::Relaxed);
    }
}

impl Default for CacheStats {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for CacheStats {
    fn clone(&self) -> Self {
        Self {
            hits: AtomicU64::new(self.hits()),
            misses: AtomicU64::new(self.misses()),
            capacity_evictions: AtomicU64::new(self.capacity_evictions()),
            trimmed: AtomicU64::new(self.trimmed()),
        }
    }
}
