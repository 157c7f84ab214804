use std::time::{Duration, Instant};

/// A single cached key/value pair together with the time it was last touched.
///
/// Entries are owned by the shard that holds them. The value is stored as
/// given and never inspected; callers that want cheap handles store `Arc<T>`.
///
/// # Fields
///
/// * `key` - The key the entry is indexed under
/// * `value` - The cached value
/// * `last_access` - The `Instant` of the last `add` or `get` of this key
///
/// # Examples
///
/// ```
/// use shardlru::CacheEntry;
/// use std::time::Instant;
///
/// let entry = CacheEntry::new("k1", 42);
/// assert_eq!(entry.value, 42);
///
/// // Nothing is older than a cutoff taken before it was created.
/// let before = entry.last_access - std::time::Duration::from_millis(1);
/// assert!(!entry.accessed_before(before));
/// assert!(entry.last_access <= Instant::now());
/// ```
#[derive(Clone, Debug)]
pub struct CacheEntry<K, V> {
    pub key: K,
    pub value: V,
    pub last_access: Instant,
}

impl<K, V> CacheEntry<K, V> {
    /// Creates a new entry stamped with the current time.
    pub fn new(key: K, value: V) -> Self {
        Self::with_access(key, value, Instant::now())
    }

    /// Creates a new entry stamped with the given access time.
    pub fn with_access(key: K, value: V, last_access: Instant) -> Self {
        Self {
            key,
            value,
            last_access,
        }
    }

    /// Marks the entry as accessed at `now`.
    #[inline]
    pub fn touch(&mut self, now: Instant) {
        self.last_access = now;
    }

    /// Replaces the value and marks the entry as accessed at `now`.
    ///
    /// Returns the previous value.
    #[inline]
    pub fn replace(&mut self, value: V, now: Instant) -> V {
        self.last_access = now;
        std::mem::replace(&mut self.value, value)
    }

    /// Returns true if the last access happened strictly before `cutoff`.
    ///
    /// Age sweeps compute the cutoff once per call and compare every
    /// candidate against it.
    #[inline]
    pub fn accessed_before(&self, cutoff: Instant) -> bool {
        self.last_access < cutoff
    }

    /// Time elapsed since the last access.
    pub fn idle(&self) -> Duration {
        self.last_access.elapsed()
    }
}
