//! Eviction Policy Module
//!
//! Three independent rules over an [`EntryStore`]:
//! - Capacity: evict oldest-inserted entries beyond `max_size`
//! - Age: evict entries whose age exceeds `max_age`
//! - Memory: evict oldest-first while the probe reports usage above the limit
//!
//! Writes only apply the capacity rule. A full sweep applies all three, in
//! that order.

use std::time::Duration;

use serde::Serialize;
use tracing::debug;

use crate::cache::EntryStore;
use crate::config::CacheConfig;
use crate::memory::MemoryProbe;

// == Cleanup Report ==
/// Number of entries each rule removed during one pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CleanupReport {
    pub capacity: usize,
    pub expired: usize,
    pub memory: usize,
}

impl CleanupReport {
    pub fn total(&self) -> usize {
        self.capacity + self.expired + self.memory
    }

    pub fn is_empty(&self) -> bool {
        self.total() == 0
    }
}

// == Eviction Policy ==
/// The composite eviction rules of one cache. `None` disables a rule.
#[derive(Debug, Clone, PartialEq)]
pub struct EvictionPolicy {
    max_size: Option<usize>,
    max_age: Option<Duration>,
    memory_limit_mb: Option<f64>,
    memory_floor: usize,
}

impl EvictionPolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            max_size: config.max_size,
            max_age: config.max_age,
            memory_limit_mb: config.memory_limit_mb,
            memory_floor: config.memory_floor,
        }
    }

    // == Capacity Rule ==
    /// Removes the oldest-inserted entries until the store fits `max_size`.
    ///
    /// Returns the number of entries removed.
    pub fn enforce_capacity<V>(&self, store: &mut EntryStore<V>) -> usize {
        let Some(max_size) = self.max_size else {
            return 0;
        };

        let mut removed = 0;
        while store.len() > max_size {
            match store.pop_oldest() {
                Some(entry) => {
                    debug!(key = %entry.key, "Capacity eviction");
                    removed += 1;
                }
                None => break,
            }
        }
        removed
    }

    // == Age Rule ==
    /// Removes every entry older than `max_age` at `now`.
    pub fn evict_expired<V>(&self, store: &mut EntryStore<V>, now: u64) -> usize {
        let Some(max_age) = self.max_age else {
            return 0;
        };

        let expired_keys: Vec<String> = store
            .all()
            .filter(|entry| entry.is_older_than(max_age, now))
            .map(|entry| entry.key.clone())
            .collect();

        for key in &expired_keys {
            store.remove(key);
        }
        expired_keys.len()
    }

    // == Memory Rule ==
    /// Evicts oldest-first when the probe reports usage above the limit.
    ///
    /// The eviction count is proportional to the overage:
    /// `ceil(len * (used - limit) / used)`, at least one, never leaving
    /// fewer than `memory_floor` entries. An unavailable or malformed sample
    /// means no pressure.
    pub fn evict_for_memory<V>(
        &self,
        store: &mut EntryStore<V>,
        probe: Option<&dyn MemoryProbe>,
    ) -> usize {
        let (Some(limit), Some(probe)) = (self.memory_limit_mb, probe) else {
            return 0;
        };

        let sample = match probe.sample() {
            Some(sample) if sample.is_valid() => sample,
            Some(sample) => {
                debug!(?sample, "Ignoring malformed memory sample");
                return 0;
            }
            None => {
                debug!("Memory probe unavailable, assuming no pressure");
                return 0;
            }
        };

        if sample.used_mb <= limit {
            return 0;
        }

        let evictable = store.len().saturating_sub(self.memory_floor);
        let overage = (sample.used_mb - limit) / sample.used_mb;
        let wanted = ((store.len() as f64) * overage).ceil() as usize;
        let count = wanted.max(1).min(evictable);

        debug!(
            used_mb = sample.used_mb,
            limit_mb = limit,
            count,
            "Memory pressure eviction"
        );

        let mut removed = 0;
        while removed < count && store.pop_oldest().is_some() {
            removed += 1;
        }
        removed
    }

    // == Sweep ==
    /// Runs capacity, age and memory rules in that order.
    pub fn sweep<V>(
        &self,
        store: &mut EntryStore<V>,
        now: u64,
        probe: Option<&dyn MemoryProbe>,
    ) -> CleanupReport {
        let capacity = self.enforce_capacity(store);
        let expired = self.evict_expired(store, now);
        let memory = self.evict_for_memory(store, probe);

        CleanupReport {
            capacity,
            expired,
            memory,
        }
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::FixedMemoryProbe;

    fn filled(count: usize) -> EntryStore<usize> {
        let mut store = EntryStore::new();
        for i in 0..count {
            store.put(format!("item-{}", i), i, i as u64);
        }
        store
    }

    fn policy(config: CacheConfig) -> EvictionPolicy {
        EvictionPolicy::from_config(&config)
    }

    #[test]
    fn test_capacity_evicts_oldest_first() {
        let mut store = filled(8);
        let removed = policy(CacheConfig::new().max_size(5)).enforce_capacity(&mut store);

        assert_eq!(removed, 3);
        assert_eq!(store.len(), 5);
        assert!(!store.contains("item-0"));
        assert!(!store.contains("item-2"));
        assert!(store.contains("item-3"));
        assert!(store.contains("item-7"));
    }

    #[test]
    fn test_capacity_disabled() {
        let mut store = filled(8);
        assert_eq!(policy(CacheConfig::new()).enforce_capacity(&mut store), 0);
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_age_rule_strictly_older() {
        // item-i is inserted at i ms
        let mut store = filled(5);
        let rule = policy(CacheConfig::new().max_age(Duration::from_millis(100)));

        // At 102, items 0 and 1 are older than 100 ms; item 2 is exactly 100.
        let removed = rule.evict_expired(&mut store, 102);

        assert_eq!(removed, 2);
        assert!(store.contains("item-2"));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_memory_rule_under_pressure() {
        let mut store = filled(10);
        let probe = FixedMemoryProbe::new(60.0, 100.0);
        let rule = policy(CacheConfig::new().memory_limit_mb(50.0));

        let removed = rule.evict_for_memory(&mut store, Some(&probe));

        // ceil(10 * 10 / 60) = 2
        assert_eq!(removed, 2);
        assert_eq!(store.len(), 8);
        assert!(!store.contains("item-0"));
        assert!(!store.contains("item-1"));
    }

    #[test]
    fn test_memory_rule_evicts_at_least_one() {
        let mut store = filled(3);
        let probe = FixedMemoryProbe::new(50.1, 100.0);
        let rule = policy(CacheConfig::new().memory_limit_mb(50.0));

        assert_eq!(rule.evict_for_memory(&mut store, Some(&probe)), 1);
    }

    #[test]
    fn test_memory_rule_respects_floor() {
        let mut store = filled(4);
        let probe = FixedMemoryProbe::new(1000.0, 2000.0);
        let rule = policy(CacheConfig::new().memory_limit_mb(10.0).memory_floor(3));

        assert_eq!(rule.evict_for_memory(&mut store, Some(&probe)), 1);
        assert_eq!(rule.evict_for_memory(&mut store, Some(&probe)), 0);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_memory_rule_no_pressure() {
        let mut store = filled(4);
        let rule = policy(CacheConfig::new().memory_limit_mb(50.0));

        let below = FixedMemoryProbe::new(40.0, 100.0);
        assert_eq!(rule.evict_for_memory(&mut store, Some(&below)), 0);

        let unavailable = FixedMemoryProbe::unavailable();
        assert_eq!(rule.evict_for_memory(&mut store, Some(&unavailable)), 0);

        let malformed = FixedMemoryProbe::new(f64::NAN, 100.0);
        assert_eq!(rule.evict_for_memory(&mut store, Some(&malformed)), 0);

        assert_eq!(rule.evict_for_memory(&mut store, None), 0);
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_sweep_runs_all_rules() {
        let mut store = filled(10);
        let probe = FixedMemoryProbe::new(60.0, 100.0);
        let rule = policy(
            CacheConfig::new()
                .max_size(8)
                .max_age(Duration::from_millis(5))
                .memory_limit_mb(50.0),
        );

        // Capacity drops items 0-1; at 10 ms items 2-4 are older than 5 ms;
        // memory removes ceil(5 * 10 / 60) = 1 more.
        let report = rule.sweep(&mut store, 10, Some(&probe));

        assert_eq!(
            report,
            CleanupReport {
                capacity: 2,
                expired: 3,
                memory: 1,
            }
        );
        assert_eq!(report.total(), 6);
        assert_eq!(store.len(), 4);
        assert!(store.contains("item-6"));
    }

    #[test]
    fn test_sweep_is_idempotent() {
        let mut store = filled(6);
        let rule = policy(
            CacheConfig::new()
                .max_size(4)
                .max_age(Duration::from_millis(2)),
        );

        let first = rule.sweep(&mut store, 5, None);
        assert!(!first.is_empty());

        let second = rule.sweep(&mut store, 5, None);
        assert!(second.is_empty());
        assert_eq!(store.len(), 3);
    }
}
