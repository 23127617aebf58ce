//! Per-station statistics and the station table.
//!
//! All values are integer tenths. `sum` is an `i64`, which holds more than
//! 9 * 10^15 records at the largest magnitude before it could overflow.

use crate::streaming::buffers::DEFAULT_STATION_CAPACITY;
use rustc_hash::FxHashMap;
use std::collections::hash_map::Entry;

/// Running min/max/sum/count for one station.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StationStats {
    pub min: i16,
    pub max: i16,
    pub sum: i64,
    pub count: u64,
}

impl StationStats {
    /// Stats for a station seen once with `value`.
    #[inline]
    pub fn new(value: i16) -> Self {
        Self {
            min: value,
            max: value,
            sum: value as i64,
            count: 1,
        }
    }

    /// Fold one more observation in.
    #[inline(always)]
    pub fn record(&mut self, value: i16) {
        self.min = self.min.min(value);
        self.max = self.max.max(value);
        self.sum += value as i64;
        self.count += 1;
    }

    /// Combine with stats gathered for the same station elsewhere.
    ///
    /// Exact: merge order never changes the result.
    #[inline]
    pub fn merge(&mut self, other: &StationStats) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
        self.sum += other.sum;
        self.count += other.count;
    }

    /// Mean in tenths, rounded half to even.
    pub fn mean_tenths(&self) -> i64 {
        round_half_even(self.sum, self.count)
    }
}

/// Divide `sum` by `count` and round to the nearest integer, ties to even.
///
/// Uses floor division so negative sums round the same way as positive ones.
pub fn round_half_even(sum: i64, count: u64) -> i64 {
    debug_assert!(count > 0);
    let sum = sum as i128;
    let count = count as i128;
    let quotient = sum.div_euclid(count);
    let twice_remainder = 2 * sum.rem_euclid(count);

    let rounded = if twice_remainder > count || (twice_remainder == count && quotient % 2 != 0) {
        quotient + 1
    } else {
        quotient
    };
    rounded as i64
}

/// Station name bytes → statistics.
///
/// Keys are owned copies made the first time a station is seen; every later
/// lookup borrows the bytes straight from the scan buffer.
#[derive(Debug, Clone, Default)]
pub struct StationTable {
    stations: FxHashMap<Box<[u8]>, StationStats>,
}

impl StationTable {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_STATION_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            stations: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        }
    }

    /// Record one observation for `key`, copying the key only on first sight.
    #[inline(always)]
    pub fn update(&mut self, key: &[u8], value: i16) {
        if let Some(stats) = self.stations.get_mut(key) {
            stats.record(value);
            return;
        }
        self.stations.insert(key.into(), StationStats::new(value));
    }

    /// Merge another table into this one, reusing its owned keys.
    pub fn merge(&mut self, other: StationTable) {
        if self.stations.is_empty() {
            self.stations = other.stations;
            return;
        }
        for (key, stats) in other.stations {
            match self.stations.entry(key) {
                Entry::Occupied(mut e) => e.get_mut().merge(&stats),
                Entry::Vacant(e) => {
                    e.insert(stats);
                }
            }
        }
    }

    pub fn get(&self, key: &[u8]) -> Option<&StationStats> {
        self.stations.get(key)
    }

    /// Number of distinct stations.
    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    /// Total observations across all stations.
    pub fn total_records(&self) -> u64 {
        self.stations.values().map(|s| s.count).sum()
    }

    /// Iterate in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = (&[u8], &StationStats)> {
        self.stations.iter().map(|(k, v)| (&**k, v))
    }

    /// Entries sorted ascending by raw key bytes.
    pub fn sorted(&self) -> Vec<(&[u8], &StationStats)> {
        let mut entries: Vec<_> = self.iter().collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(b.0));
        entries
    }
}
