//! Cache Entry Module
//!
//! Defines the record kept for every cached value.

use std::time::Duration;

// == Cache Entry ==
/// A stored value with its key and timestamps.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry<V> {
    /// Key derived from the value at insertion
    pub key: String,
    /// The stored value
    pub value: V,
    /// Insertion (or last overwrite) time in clock milliseconds
    pub inserted_at: u64,
    /// Time of the last successful `get`
    pub last_accessed_at: u64,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates an entry inserted and last accessed at `now`.
    pub fn new(key: String, value: V, now: u64) -> Self {
        Self {
            key,
            value,
            inserted_at: now,
            last_accessed_at: now,
        }
    }

    // == Age ==
    /// Milliseconds since insertion. Saturates at zero.
    pub fn age_ms(&self, now: u64) -> u64 {
        now.saturating_sub(self.inserted_at)
    }

    // == Is Older Than ==
    /// Checks the age rule.
    ///
    /// Boundary condition: an entry is only stale once its age strictly
    /// exceeds `max_age`; an entry exactly `max_age` old is kept.
    pub fn is_older_than(&self, max_age: Duration, now: u64) -> bool {
        u128::from(self.age_ms(now)) > max_age.as_millis()
    }

    // == Touch ==
    /// Records a successful read.
    pub fn touch(&mut self, now: u64) {
        self.last_accessed_at = now;
    }

    /// Replaces the value and restarts the entry's age.
    pub fn refresh(&mut self, value: V, now: u64) {
        self.value = value;
        self.inserted_at = now;
        self.last_accessed_at = now;
    }
}
