//! Cache Facade Module
//!
//! The public [`Cache`] type: entry store, eviction policy and statistics
//! behind one lock, plus the optional auto-cleanup timer.

use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

use crate::cache::{
    CacheEntry, CleanupReport, EntryStore, EvictionPolicy, StatsRecorder, StatsSnapshot,
};
use crate::clock::{Clock, SystemClock};
use crate::config::CacheConfig;
use crate::error::Result;
use crate::key::CacheKey;
use crate::memory::{MemoryProbe, SystemMemoryProbe};
use crate::tasks::{PeriodicTask, Scheduler, TimerHandle, TokioScheduler};

/// State guarded by the cache lock.
struct CacheState<V> {
    store: EntryStore<V>,
    stats: StatsRecorder,
}

/// Everything the cleanup timer needs, shared with the foreground handle.
struct Shared<V> {
    state: Mutex<CacheState<V>>,
    policy: EvictionPolicy,
    clock: Arc<dyn Clock>,
    probe: Option<Arc<dyn MemoryProbe>>,
}

impl<V> Shared<V> {
    // == Full Sweep ==
    fn cleanup(&self) -> CleanupReport {
        let mut state = self.state.lock();
        let now = self.clock.now_ms();
        let report = self
            .policy
            .sweep(&mut state.store, now, self.probe.as_deref());
        state.stats.record_evictions(report.total());

        if report.is_empty() {
            debug!("Cleanup: nothing to evict");
        } else {
            info!(
                capacity = report.capacity,
                expired = report.expired,
                memory = report.memory,
                remaining = state.store.len(),
                "Cleanup: removed {} entries",
                report.total()
            );
        }
        report
    }
}

// == Cache ==
/// Bounded in-memory object cache.
///
/// Values are addressed by their [`CacheKey`]. Entries are evicted
/// oldest-inserted-first when `max_size` is exceeded on write; the age and
/// memory rules only run on [`cleanup`](Cache::cleanup), called explicitly or
/// by the auto-cleanup timer.
///
/// Every public call holds the cache lock for its whole duration, so calls
/// from other threads and timer sweeps appear atomic.
///
/// # Example
/// ```
/// use item_cache::{Cache, CacheConfig};
///
/// let cache: Cache<String> = Cache::new(CacheConfig::new().max_size(2)).unwrap();
/// cache.set("a".to_string());
/// cache.set("b".to_string());
/// cache.set("c".to_string());
///
/// assert_eq!(cache.size(), 2);
/// assert!(!cache.has("a"));
/// assert_eq!(cache.get("c"), Some("c".to_string()));
/// ```
pub struct Cache<V> {
    shared: Arc<Shared<V>>,
    config: CacheConfig,
    timer: Mutex<Option<TimerHandle>>,
    disposed: AtomicBool,
}

impl<V> Cache<V>
where
    V: CacheKey + Clone + Send + 'static,
{
    /// Creates a cache with the system clock, the system memory probe (if a
    /// memory limit is set) and the tokio scheduler (if auto-cleanup is set).
    pub fn new(config: CacheConfig) -> Result<Self> {
        Self::builder(config).build()
    }

    /// Starts a builder to inject the clock, memory probe or scheduler.
    pub fn builder(config: CacheConfig) -> CacheBuilder<V> {
        CacheBuilder::new(config)
    }
}

impl<V: CacheKey + Clone> Cache<V> {
    // == Set ==
    /// Stores a value under its derived key.
    ///
    /// An existing entry with the same key is replaced and its age restarts.
    /// The capacity rule runs before returning.
    pub fn set(&self, value: V) {
        let key = value.cache_key();
        let mut state = self.shared.state.lock();
        self.insert_locked(&mut state, key, value);
    }

    // == Set Many ==
    /// Stores values in order, exactly as repeated [`set`](Cache::set) calls.
    pub fn set_many<I>(&self, values: I)
    where
        I: IntoIterator<Item = V>,
    {
        let mut state = self.shared.state.lock();
        for value in values {
            let key = value.cache_key();
            self.insert_locked(&mut state, key, value);
        }
    }

    fn insert_locked(&self, state: &mut CacheState<V>, key: String, value: V) {
        let now = self.shared.clock.now_ms();
        state.store.put(key, value, now);
        let evicted = self.shared.policy.enforce_capacity(&mut state.store);
        state.stats.record_evictions(evicted);
    }

    // == Get ==
    /// Returns a copy of the value stored under `key`.
    ///
    /// Counts a hit or a miss and updates the entry's last access time.
    /// Entries past `max_age` are still returned until a cleanup runs.
    pub fn get(&self, key: &str) -> Option<V> {
        let mut state = self.shared.state.lock();
        let now = self.shared.clock.now_ms();
        let CacheState { store, stats } = &mut *state;

        match store.touch(key, now) {
            Some(entry) => {
                stats.record_hit();
                Some(entry.value.clone())
            }
            None => {
                stats.record_miss();
                None
            }
        }
    }

    /// [`get`](Cache::get) using the key derived from `value`.
    pub fn get_value(&self, value: &V) -> Option<V> {
        self.get(&value.cache_key())
    }

    /// Returns a copy of the whole entry without counting a lookup.
    pub fn peek_entry(&self, key: &str) -> Option<CacheEntry<V>> {
        self.shared.state.lock().store.get(key).cloned()
    }

    // == Get All ==
    /// Snapshot of all retained values, oldest-inserted first.
    pub fn get_all(&self) -> Vec<V> {
        self.shared
            .state
            .lock()
            .store
            .all()
            .map(|entry| entry.value.clone())
            .collect()
    }
}

impl<V: CacheKey> Cache<V> {
    /// [`has`](Cache::has) using the key derived from `value`.
    pub fn has_value(&self, value: &V) -> bool {
        self.has(&value.cache_key())
    }

    /// [`delete`](Cache::delete) using the key derived from `value`.
    pub fn delete_value(&self, value: &V) -> bool {
        self.delete(&value.cache_key())
    }
}

impl<V> Cache<V> {
    // == Has ==
    /// Checks whether `key` is stored. Does not count as a lookup.
    pub fn has(&self, key: &str) -> bool {
        self.shared.state.lock().store.contains(key)
    }

    // == Delete ==
    /// Removes the entry for `key`. Returns false if there was none.
    pub fn delete(&self, key: &str) -> bool {
        self.shared.state.lock().store.remove(key).is_some()
    }

    // == Clear ==
    /// Removes every entry. Statistics are kept.
    pub fn clear(&self) {
        self.shared.state.lock().store.clear();
    }

    // == Size ==
    pub fn size(&self) -> usize {
        self.shared.state.lock().store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shared.state.lock().store.is_empty()
    }

    // == Cleanup ==
    /// Runs the capacity, age and memory rules now.
    ///
    /// Safe to call at any time, including after [`dispose`](Cache::dispose).
    pub fn cleanup(&self) -> CleanupReport {
        self.shared.cleanup()
    }

    // == Stats ==
    /// Current statistics; `size` is read live.
    pub fn stats(&self) -> StatsSnapshot {
        let state = self.shared.state.lock();
        state.stats.snapshot(state.store.len())
    }

    /// Zeroes hit, miss and eviction counters. Entries are kept.
    pub fn reset_stats(&self) {
        self.shared.state.lock().stats.reset();
    }

    pub fn config(&self) -> &CacheConfig {
        &self.config
    }

    /// True while the auto-cleanup timer is scheduled.
    pub fn auto_cleanup_active(&self) -> bool {
        self.timer.lock().is_some()
    }

    // == Dispose ==
    /// Cancels the auto-cleanup timer. Repeated calls do nothing.
    ///
    /// Entries stay addressable and `cleanup()` stays callable.
    pub fn dispose(&self) {
        if self.disposed.swap(true, Ordering::SeqCst) {
            return;
        }
        if let Some(mut timer) = self.timer.lock().take() {
            timer.cancel();
            debug!("Auto-cleanup timer cancelled");
        }
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed.load(Ordering::SeqCst)
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl<V> std::fmt::Debug for Cache<V> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Cache")
            .field("config", &self.config)
            .field("size", &self.size())
            .field("disposed", &self.is_disposed())
            .finish()
    }
}

// == Cache Builder ==
/// Builder for a [`Cache`] with injected collaborators.
pub struct CacheBuilder<V> {
    config: CacheConfig,
    clock: Option<Arc<dyn Clock>>,
    probe: Option<Arc<dyn MemoryProbe>>,
    scheduler: Option<Arc<dyn Scheduler>>,
    _values: PhantomData<fn() -> V>,
}

impl<V> CacheBuilder<V>
where
    V: CacheKey + Clone + Send + 'static,
{
    pub fn new(config: CacheConfig) -> Self {
        Self {
            config,
            clock: None,
            probe: None,
            scheduler: None,
            _values: PhantomData,
        }
    }

    /// Time source for entry timestamps (default: [`SystemClock`]).
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Memory probe for the memory rule (default: [`SystemMemoryProbe`]).
    pub fn memory_probe(mut self, probe: impl MemoryProbe + 'static) -> Self {
        self.probe = Some(Arc::new(probe));
        self
    }

    /// Shared memory probe, for callers that keep a handle to it.
    pub fn shared_memory_probe(mut self, probe: Arc<dyn MemoryProbe>) -> Self {
        self.probe = Some(probe);
        self
    }

    /// Timer for auto-cleanup (default: the current tokio runtime).
    pub fn scheduler(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.scheduler = Some(Arc::new(scheduler));
        self
    }

    // == Build ==
    /// Validates the configuration and starts the auto-cleanup timer.
    ///
    /// A timer that cannot be scheduled is not an error: a warning is logged
    /// and the cache works with explicit `cleanup()` calls only.
    pub fn build(self) -> Result<Cache<V>> {
        self.config.validate()?;

        let probe = match (self.config.memory_limit_mb, self.probe) {
            (Some(_), None) => {
                Some(Arc::new(SystemMemoryProbe::new()) as Arc<dyn MemoryProbe>)
            }
            (_, probe) => probe,
        };

        let shared = Arc::new(Shared {
            state: Mutex::new(CacheState {
                store: EntryStore::new(),
                stats: StatsRecorder::new(),
            }),
            policy: EvictionPolicy::from_config(&self.config),
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock::new())),
            probe,
        });

        let timer = match self.config.auto_cleanup_interval {
            Some(every) => start_timer(&shared, every, self.scheduler),
            None => None,
        };

        debug!(config = ?self.config, auto_cleanup = timer.is_some(), "Cache created");

        Ok(Cache {
            shared,
            config: self.config,
            timer: Mutex::new(timer),
            disposed: AtomicBool::new(false),
        })
    }
}

fn start_timer<V: Send + 'static>(
    shared: &Arc<Shared<V>>,
    every: std::time::Duration,
    scheduler: Option<Arc<dyn Scheduler>>,
) -> Option<TimerHandle> {
    let scheduler: Arc<dyn Scheduler> = match scheduler {
        Some(scheduler) => scheduler,
        None => match TokioScheduler::current() {
            Ok(scheduler) => Arc::new(scheduler),
            Err(err) => {
                warn!("Auto-cleanup disabled: {}", err);
                return None;
            }
        },
    };

    // The timer holds a weak reference so it never keeps a dropped cache alive.
    let weak = Arc::downgrade(shared);
    let task: PeriodicTask = Arc::new(move || {
        if let Some(shared) = weak.upgrade() {
            shared.cleanup();
        }
    });

    match scheduler.schedule_periodic(every, task) {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!("Auto-cleanup disabled: {}", err);
            None
        }
    }
}
