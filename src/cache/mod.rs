//! Cache Module
//!
//! Provides an in-memory object cache with capacity, age and memory-pressure
//! eviction.

mod entry;
mod eviction;
mod facade;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use eviction::{CleanupReport, EvictionPolicy};
pub use facade::{Cache, CacheBuilder};
pub use order::InsertionOrder;
pub use stats::{StatsRecorder, StatsSnapshot};
pub use store::EntryStore;
