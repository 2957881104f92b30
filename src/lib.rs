//! Item Cache - A bounded in-memory object cache
//!
//! Caches values that carry their own key, with oldest-first capacity
//! eviction, TTL and memory-pressure sweeps, hit-rate statistics and an
//! optional auto-cleanup timer.

pub mod cache;
pub mod clock;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod tasks;

pub use cache::{Cache, CacheBuilder, CleanupReport, StatsSnapshot};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
pub use key::CacheKey;
pub use memory::{FixedMemoryProbe, MemoryProbe, MemorySample, SystemMemoryProbe};
pub use tasks::{ManualScheduler, Scheduler, TimerHandle, TokioScheduler};
