//! Insertion Order Module
//!
//! Tracks keys in the order they were inserted, for oldest-first eviction.

use std::collections::VecDeque;

// == Insertion Order ==
/// Tracks insertion order for FIFO eviction.
///
/// Keys are stored in a VecDeque where:
/// - Front = Oldest inserted
/// - Back = Most recently inserted
///
/// Reads never reorder keys.
#[derive(Debug, Default)]
pub struct InsertionOrder {
    order: VecDeque<String>,
}

impl InsertionOrder {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            order: VecDeque::new(),
        }
    }

    // == Push ==
    /// Appends a key as the newest. An existing occurrence is dropped first.
    pub fn push(&mut self, key: &str) {
        self.remove(key);
        self.order.push_back(key.to_string());
    }

    // == Remove ==
    /// Removes a key from the tracker.
    pub fn remove(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    // == Pop Oldest ==
    /// Returns and removes the oldest key, or None if empty.
    pub fn pop_oldest(&mut self) -> Option<String> {
        self.order.pop_front()
    }

    // == Peek Oldest ==
    #[cfg(test)]
    pub fn peek_oldest(&self) -> Option<&String> {
        self.order.front()
    }

    /// Iterates keys oldest-first.
    pub fn iter(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    pub fn clear(&mut self) {
        self.order.clear();
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
