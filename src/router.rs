use once_cell::sync::Lazy;
use std::hash::{Hash, Hasher};

/// Shard count used when the caller asks for zero: one shard per logical CPU.
static DEFAULT_SHARD_COUNT: Lazy<usize> = Lazy::new(|| num_cpus::get().max(1));

/// Returns the shard count picked when none is configured.
///
/// # Examples
///
/// ```
/// use shardlru::router::default_shard_count;
///
/// assert!(default_shard_count() >= 1);
/// ```
pub fn default_shard_count() -> usize {
    *DEFAULT_SHARD_COUNT
}

/// Maps keys onto a fixed number of shards.
///
/// The mapping is CRC-32 (IEEE) over the key's `Hash` byte stream, reduced
/// modulo the shard count. It is deterministic for the lifetime of the router
/// and, because `Borrow` requires borrowed forms to hash identically, a
/// `String` key and its `&str` form always land on the same shard.
///
/// # Examples
///
/// ```
/// use shardlru::router::ShardRouter;
///
/// let router = ShardRouter::new(8);
/// assert_eq!(router.shard_count(), 8);
///
/// let shard = router.shard_for("user:42");
/// assert!(shard < 8);
/// assert_eq!(shard, router.shard_for(&String::from("user:42")));
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShardRouter {
    shard_count: usize,
}

impl ShardRouter {
    /// Creates a router over `shard_count` shards; zero selects
    /// [`default_shard_count`].
    pub fn new(shard_count: usize) -> Self {
        let shard_count = if shard_count == 0 {
            default_shard_count()
        } else {
            shard_count
        };
        Self { shard_count }
    }

    #[inline]
    pub fn shard_count(&self) -> usize {
        self.shard_count
    }

    /// Index of the shard owning `key`, in `0..shard_count`.
    #[inline]
    pub fn shard_for<Q>(&self, key: &Q) -> usize
    where
        Q: Hash + ?Sized,
    {
        if self.shard_count == 1 {
            return 0;
        }
        let mut hasher = crc32fast::Hasher::new();
        key.hash(&mut hasher);
        (hasher.finish() % self.shard_count as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_shards_uses_cpu_count() {
        let router = ShardRouter::new(0);
        assert_eq!(router.shard_count(), num_cpus::get().max(1));
    }

    #[test]
    fn test_single_shard_routes_everything_to_zero() {
        let router = ShardRouter::new(1);
        for i in 0..100 {
            assert_eq!(router.shard_for(&format!("k{}", i)), 0);
        }
    }

    #[test]
    fn test_routing_is_stable() {
        let router = ShardRouter::new(16);
        for i in 0..1000 {
            let key = format!("key-{}", i);
            let first = router.shard_for(&key);
            assert!(first < 16);
            assert_eq!(first, router.shard_for(&key));
            assert_eq!(first, router.shard_for(key.as_str()));
        }
    }

    #[test]
    fn test_keys_spread_across_shards() {
        let router = ShardRouter::new(8);
        let mut seen = [0usize; 8];
        for i in 0..8000 {
            seen[router.shard_for(&i)] += 1;
        }
        // every shard receives keys
        assert!(seen.iter().all(|&n| n > 0), "distribution: {:?}", seen);
    }
}
