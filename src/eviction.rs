use std::time::{Duration, Instant};

use crate::CacheEntry;

/// Default multiplier applied to `max_count` to size the sampling-trim round budget.
pub const DEFAULT_TRIM_BUDGET_FACTOR: f64 = 1.1;

/// The strategy a `remove_oldest` call resolves to.
///
/// The mode is picked from the call's arguments and the current entry count:
///
/// * `Clear` - drop everything. Chosen when neither an age nor a count limit
///   is given, or when the count limit covers every entry anyway.
/// * `AgeSweep` - walk every shard from the least recently used end and drop
///   entries idle for longer than the age limit, stopping per shard at the
///   first fresh entry.
/// * `SampledTrim` - remove up to `max_count` entries by repeatedly picking a
///   random shard and dropping its least recently used entry if it passes
///   the age filter. Cost is bounded by the round budget, not by cache size.
///
/// # Examples
///
/// ```
/// use shardlru::EvictionMode;
/// use std::time::Duration;
///
/// assert_eq!(EvictionMode::select(Duration::ZERO, 0, 10), EvictionMode::Clear);
/// assert_eq!(EvictionMode::select(Duration::from_secs(1), 0, 10), EvictionMode::AgeSweep);
/// assert_eq!(EvictionMode::select(Duration::ZERO, 3, 10), EvictionMode::SampledTrim);
/// assert_eq!(EvictionMode::select(Duration::ZERO, 10, 10), EvictionMode::Clear);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EvictionMode {
    Clear,
    AgeSweep,
    SampledTrim,
}

impl EvictionMode {
    /// Resolves the mode for `remove_oldest(max_age, max_count)` against a
    /// cache currently holding `len` entries.
    pub fn select(max_age: Duration, max_count: usize, len: usize) -> Self {
        if max_count == 0 {
            if max_age.is_zero() {
                EvictionMode::Clear
            } else {
                EvictionMode::AgeSweep
            }
        } else if max_count >= len {
            EvictionMode::Clear
        } else {
            EvictionMode::SampledTrim
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EvictionMode::Clear => "clear",
            EvictionMode::AgeSweep => "age_sweep",
            EvictionMode::SampledTrim => "sampled_trim",
        }
    }
}

/// Decides whether an entry is old enough to be evicted.
///
/// Built once per eviction pass from the age limit and the pass start time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AgeFilter {
    /// No age limit; every entry qualifies.
    Any,
    /// Entries last accessed strictly before the cutoff qualify.
    OlderThan(Instant),
    /// The age limit reaches past the clock's origin; nothing qualifies.
    Never,
}

impl AgeFilter {
    pub fn new(max_age: Duration, now: Instant) -> Self {
        if max_age.is_zero() {
            return AgeFilter::Any;
        }
        match now.checked_sub(max_age) {
            Some(cutoff) => AgeFilter::OlderThan(cutoff),
            None => AgeFilter::Never,
        }
    }

    #[inline]
    pub fn admits<K, V>(&self, entry: &CacheEntry<K, V>) -> bool {
        match self {
            AgeFilter::Any => true,
            AgeFilter::OlderThan(cutoff) => entry.accessed_before(*cutoff),
            AgeFilter::Never => false,
        }
    }
}

/// Tunables for the sampling trim's round budget.
///
/// The budget is `ceil(max_count * budget_factor)` rounds, raised to the
/// shard count when `floor_at_shard_count` is set. Both knobs are heuristics;
/// the defaults (1.1 and on) keep a trim close to `max_count` lock
/// acquisitions while giving small trims a fair chance to find non-empty
/// shards.
///
/// # Examples
///
/// ```
/// use shardlru::TrimTuning;
///
/// let tuning = TrimTuning::default();
/// assert_eq!(tuning.rounds(100, 8), 110);
/// assert_eq!(tuning.rounds(5, 1), 6);
/// assert_eq!(tuning.rounds(1, 8), 8);
///
/// let unfloored = TrimTuning::new(1.1, false);
/// assert_eq!(unfloored.rounds(1, 8), 2);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TrimTuning {
    budget_factor: f64,
    floor_at_shard_count: bool,
}

impl TrimTuning {
    /// Creates tuning values, normalizing a factor that is not finite or is
    /// below 1.0 to 1.0 so a trim always gets at least `max_count` rounds.
    pub fn new(budget_factor: f64, floor_at_shard_count: bool) -> Self {
        let budget_factor = if budget_factor.is_finite() && budget_factor >= 1.0 {
            budget_factor
        } else {
            tracing::warn!(
                budget_factor,
                "trim budget factor must be a finite value >= 1.0, using 1.0"
            );
            1.0
        };
        Self {
            budget_factor,
            floor_at_shard_count,
        }
    }

    pub fn budget_factor(&self) -> f64 {
        self.budget_factor
    }

    pub fn floor_at_shard_count(&self) -> bool {
        self.floor_at_shard_count
    }

    /// Number of sampling rounds granted to a trim of `max_count` entries.
    pub fn rounds(&self, max_count: usize, shard_count: usize) -> usize {
        let product = max_count as f64 * self.budget_factor;
        let nearest = product.round();
        // 10 * 1.1 is 11.000000000000002 in binary floating point
        let exact = if (product - nearest).abs() <= 1e-9 * nearest.max(1.0) {
            nearest
        } else {
            product.ceil()
        };
        // float to int casts saturate
        let budget = exact as usize;
        if self.floor_at_shard_count {
            budget.max(shard_count)
        } else {
            budget.max(max_count)
        }
    }
}

impl Default for TrimTuning {
    fn default() -> Self {
        Self {
            budget_factor: DEFAULT_TRIM_BUDGET_FACTOR,
            floor_at_shard_count: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_select_modes() {
        let second = Duration::from_secs(1);
        assert_eq!(EvictionMode::select(Duration::ZERO, 0, 0), EvictionMode::Clear);
        assert_eq!(EvictionMode::select(second, 0, 0), EvictionMode::AgeSweep);
        assert_eq!(EvictionMode::select(second, 5, 4), EvictionMode::Clear);
        assert_eq!(EvictionMode::select(second, 3, 4), EvictionMode::SampledTrim);
    }

    #[test]
    fn test_age_filter() {
        let now = Instant::now();
        let old = CacheEntry::with_access("old", 1, now - Duration::from_millis(50));
        let fresh = CacheEntry::with_access("fresh", 2, now);

        let filter = AgeFilter::new(Duration::from_millis(10), now);
        assert!(filter.admits(&old));
        assert!(!filter.admits(&fresh));

        assert!(AgeFilter::new(Duration::ZERO, now).admits(&fresh));
        assert!(!AgeFilter::Never.admits(&old));
    }

    #[test]
    fn test_age_filter_past_clock_origin() {
        let now = Instant::now();
        let filter = AgeFilter::new(Duration::from_secs(u64::MAX), now);
        assert_eq!(filter, AgeFilter::Never);
    }

    #[test]
    fn test_rounds_default_tuning() {
        let tuning = TrimTuning::default();
        assert_eq!(tuning.rounds(3, 1), 4);
        assert_eq!(tuning.rounds(5, 1), 6);
        assert_eq!(tuning.rounds(10, 4), 11);
        assert_eq!(tuning.rounds(100, 8), 110);
        assert_eq!(tuning.rounds(2, 16), 16);
        assert_eq!(tuning.rounds(0, 1), 1);
    }

    #[test]
    fn test_rounds_round_up_partial_budget() {
        let unfloored = TrimTuning::new(1.1, false);
        assert_eq!(unfloored.rounds(1, 64), 2);
        assert_eq!(unfloored.rounds(7, 64), 8);
        assert_eq!(unfloored.rounds(20, 64), 22);
        assert_eq!(TrimTuning::new(1.5, false).rounds(3, 1), 5);
    }

    #[test]
    fn test_invalid_factor_is_normalized() {
        assert_eq!(TrimTuning::new(0.5, true).budget_factor(), 1.0);
        assert_eq!(TrimTuning::new(f64::NAN, true).budget_factor(), 1.0);
        assert_eq!(TrimTuning::new(f64::INFINITY, true).budget_factor(), 1.0);
        assert_eq!(TrimTuning::new(2.0, false).rounds(5, 64), 10);
        assert_eq!(TrimTuning::new(2.0, true).rounds(5, 64), 64);
    }
}
