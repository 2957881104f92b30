//! Entry Store Module
//!
//! Keyed storage combining a HashMap with an insertion-order tracker.
//! Holds no policy: eviction decisions live in the eviction module.

use std::collections::hash_map::Entry;
use std::collections::HashMap;

use crate::cache::{CacheEntry, InsertionOrder};

// == Entry Store ==
/// Key to entry mapping that remembers insertion order.
#[derive(Debug)]
pub struct EntryStore<V> {
    /// Key-entry storage
    entries: HashMap<String, CacheEntry<V>>,
    /// Oldest-first key order
    order: InsertionOrder,
}

impl<V> EntryStore<V> {
    // == Constructor ==
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            order: InsertionOrder::new(),
        }
    }

    // == Put ==
    /// Inserts a value at the tail.
    ///
    /// If the key already exists, the value is replaced, its age restarts
    /// and it moves to the tail, so insertion order always matches
    /// `inserted_at` order.
    pub fn put(&mut self, key: String, value: V, now: u64) {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut slot) => slot.get_mut().refresh(value, now),
            Entry::Vacant(slot) => {
                slot.insert(CacheEntry::new(key.clone(), value, now));
            }
        }
        self.order.push(&key);
    }

    // == Get ==
    /// Looks up an entry without touching it.
    pub fn get(&self, key: &str) -> Option<&CacheEntry<V>> {
        self.entries.get(key)
    }

    // == Touch ==
    /// Marks an entry as read and returns it. Order is not affected.
    pub fn touch(&mut self, key: &str, now: u64) -> Option<&CacheEntry<V>> {
        let entry = self.entries.get_mut(key)?;
        entry.touch(now);
        Some(&*entry)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    // == Remove ==
    /// Removes an entry; returns it if it was present.
    pub fn remove(&mut self, key: &str) -> Option<CacheEntry<V>> {
        let entry = self.entries.remove(key)?;
        self.order.remove(key);
        Some(entry)
    }

    // == Pop Oldest ==
    /// Removes and returns the oldest-inserted entry.
    pub fn pop_oldest(&mut self) -> Option<CacheEntry<V>> {
        while let Some(key) = self.order.pop_oldest() {
            if let Some(entry) = self.entries.remove(&key) {
                return Some(entry);
            }
        }
        None
    }

    // == Oldest First ==
    /// Keys in insertion order, oldest first.
    pub fn oldest_first(&self) -> impl Iterator<Item = &String> {
        self.order.iter()
    }

    // == All ==
    /// Entries in insertion order, oldest first.
    pub fn all(&self) -> impl Iterator<Item = &CacheEntry<V>> {
        self.order.iter().filter_map(|key| self.entries.get(key))
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    // == Length ==
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<V> Default for EntryStore<V> {
    fn default() -> Self {
        Self::new()
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn keys<V>(store: &EntryStore<V>) -> Vec<String> {
        store.oldest_first().cloned().collect()
    }

    #[test]
    fn test_store_new() {
        let store: EntryStore<i32> = EntryStore::new();
        assert_eq!(store.len(), 0);
        assert!(store.is_empty());
    }

    #[test]
    fn test_store_put_and_get() {
        let mut store = EntryStore::new();

        store.put("key1".to_string(), "value1", 0);
        let entry = store.get("key1").unwrap();

        assert_eq!(entry.value, "value1");
        assert_eq!(store.len(), 1);
        assert!(store.contains("key1"));
        assert!(store.get("missing").is_none());
    }

    #[test]
    fn test_store_overwrite_refreshes_and_moves_to_tail() {
        let mut store = EntryStore::new();

        store.put("a".to_string(), 1, 0);
        store.put("b".to_string(), 2, 10);
        store.put("a".to_string(), 3, 20);

        assert_eq!(store.len(), 2);
        assert_eq!(keys(&store), ["b", "a"]);
        let entry = store.get("a").unwrap();
        assert_eq!(entry.value, 3);
        assert_eq!(entry.inserted_at, 20);
    }

    #[test]
    fn test_store_touch_does_not_reorder() {
        let mut store = EntryStore::new();

        store.put("a".to_string(), 1, 0);
        store.put("b".to_string(), 2, 0);
        let touched = store.touch("a", 50).unwrap();

        assert_eq!(touched.last_accessed_at, 50);
        assert_eq!(keys(&store), ["a", "b"]);
        assert!(store.touch("missing", 50).is_none());
    }

    #[test]
    fn test_store_remove() {
        let mut store = EntryStore::new();

        store.put("key1".to_string(), 1, 0);
        assert!(store.remove("key1").is_some());
        assert!(store.remove("key1").is_none());
        assert!(store.is_empty());
        assert_eq!(store.oldest_first().count(), 0);
    }

    #[test]
    fn test_store_pop_oldest() {
        let mut store = EntryStore::new();

        store.put("a".to_string(), 1, 0);
        store.put("b".to_string(), 2, 0);
        store.put("c".to_string(), 3, 0);

        assert_eq!(store.pop_oldest().map(|e| e.key), Some("a".to_string()));
        assert_eq!(store.pop_oldest().map(|e| e.key), Some("b".to_string()));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_store_all_in_insertion_order() {
        let mut store = EntryStore::new();

        store.put("x".to_string(), 1, 0);
        store.put("y".to_string(), 2, 0);

        let values: Vec<i32> = store.all().map(|e| e.value).collect();
        assert_eq!(values, vec![1, 2]);
    }

    #[test]
    fn test_store_clear() {
        let mut store = EntryStore::new();
        store.put("x".to_string(), 1, 0);
        store.clear();

        assert!(store.is_empty());
        assert!(store.pop_oldest().is_none());
    }
}
