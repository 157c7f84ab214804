use crate::eviction::DEFAULT_TRIM_BUDGET_FACTOR;

/// Construction parameters for [`ShardedLruCache`](crate::ShardedLruCache).
///
/// Every field has a forgiving meaning for its zero value, and out-of-range
/// values are normalized when the cache is built instead of being rejected.
///
/// # Fields
///
/// * `shard_count` - Number of independently locked shards. `0` picks one
///   shard per logical CPU.
/// * `max_entries` - Upper bound on the total entry count. `0` means
///   unbounded and disables capacity eviction.
/// * `trim_budget_factor` - Multiplier on `max_count` giving the sampling
///   trim's round budget. Values below 1.0 (or not finite) become 1.0.
/// * `floor_budget_at_shard_count` - Whether the round budget is raised to
///   at least the shard count.
///
/// # Examples
///
/// ```
/// use shardlru::{LruConfig, ShardedLruCache};
///
/// let config = LruConfig::default()
///     .with_shard_count(4)
///     .with_max_entries(1_000)
///     .with_trim_budget_factor(1.5);
///
/// let cache: ShardedLruCache<String, u32> = ShardedLruCache::with_config(config);
/// assert_eq!(cache.shard_count(), 4);
/// assert_eq!(cache.max_entries(), 1_000);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LruConfig {
    pub shard_count: usize,
    pub max_entries: usize,
    pub trim_budget_factor: f64,
    pub floor_budget_at_shard_count: bool,
}

impl LruConfig {
    /// Configuration with the given shard count and bound and default trim tuning.
    pub fn new(shard_count: usize, max_entries: usize) -> Self {
        Self {
            shard_count,
            max_entries,
            ..Self::default()
        }
    }

    pub fn with_shard_count(mut self, shard_count: usize) -> Self {
        self.shard_count = shard_count;
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = max_entries;
        self
    }

    pub fn with_trim_budget_factor(mut self, factor: f64) -> Self {
        self.trim_budget_factor = factor;
        self
    }

    pub fn with_floor_budget_at_shard_count(mut self, floor: bool) -> Self {
        self.floor_budget_at_shard_count = floor;
        self
    }

    /// The shard count a cache built from this configuration will use.
    ///
    /// ```
    /// use shardlru::LruConfig;
    ///
    /// assert_eq!(LruConfig::new(6, 0).resolved_shard_count(), 6);
    /// assert!(LruConfig::new(0, 0).resolved_shard_count() >= 1);
    /// ```
    pub fn resolved_shard_count(&self) -> usize {
        crate::router::ShardRouter::new(self.shard_count).shard_count()
    }
}

impl Default for LruConfig {
    fn default() -> Self {
        Self {
            shard_count: 0,
            max_entries: 0,
            trim_budget_factor: DEFAULT_TRIM_BUDGET_FACTOR,
            floor_budget_at_shard_count: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LruConfig::default();
        assert_eq!(config.shard_count, 0);
        assert_eq!(config.max_entries, 0);
        assert_eq!(config.trim_budget_factor, 1.1);
        assert!(config.floor_budget_at_shard_count);
    }

    #[test]
    fn test_builder_setters() {
        let config = LruConfig::new(2, 50)
            .with_trim_budget_factor(2.0)
            .with_floor_budget_at_shard_count(false);
        assert_eq!(config.shard_count, 2);
        assert_eq!(config.max_entries, 50);
        assert_eq!(config.trim_budget_factor, 2.0);
        assert!(!config.floor_budget_at_shard_count);
    }
}
