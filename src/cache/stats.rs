//! Cache Statistics Module
//!
//! Tracks lookup outcomes and evictions, independently of cache contents.

use serde::Serialize;

// == Stats Recorder ==
/// Running counters for cache lookups.
#[derive(Debug, Clone, Default)]
pub struct StatsRecorder {
    /// Number of `get` calls that found their key
    hits: u64,
    /// Number of `get` calls that did not
    misses: u64,
    /// Number of entries removed by any eviction rule
    evictions: u64,
}

impl StatsRecorder {
    // == Constructor ==
    /// Creates a recorder with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Record Hit ==
    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    // == Record Miss ==
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Evictions ==
    pub fn record_evictions(&mut self, count: usize) {
        self.evictions += count as u64;
    }

    // == Snapshot ==
    /// Freezes the counters together with the live entry count.
    pub fn snapshot(&self, size: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits,
            misses: self.misses,
            hit_rate: hit_rate(self.hits, self.misses),
            size,
            evictions: self.evictions,
        }
    }

    // == Reset ==
    /// Zeroes every counter.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// hits / (hits + misses), or 0.0 if no lookups have been made.
fn hit_rate(hits: u64, misses: u64) -> f64 {
    let total = hits + misses;
    if total == 0 {
        0.0
    } else {
        hits as f64 / total as f64
    }
}

// == Stats Snapshot ==
/// Point-in-time view of cache statistics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSnapshot {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    /// Entries retained when the snapshot was taken
    pub size: usize,
    pub evictions: u64,
}
