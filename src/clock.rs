//! Time sources
//!
//! Entry timestamps are milliseconds read from a [`Clock`]. Production code
//! uses [`SystemClock`]; tests drive a [`ManualClock`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

// == Clock ==
/// A monotonic millisecond time source.
pub trait Clock: Send + Sync {
    /// Milliseconds elapsed since an arbitrary fixed origin.
    fn now_ms(&self) -> u64;
}

// == System Clock ==
/// Monotonic clock anchored at construction time.
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

// == Manual Clock ==
/// Controllable clock for deterministic tests.
///
/// Clones share the same time, so a test can keep one handle and give
/// another to the cache.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    /// Creates a clock starting at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves time forward.
    pub fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as u64, Ordering::SeqCst);
    }

    /// Jumps to an absolute time. Never moves backwards.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_advance() {
        let clock = ManualClock::new();
        assert_eq!(clock.now_ms(), 0);

        clock.advance(Duration::from_millis(1100));
        assert_eq!(clock.now_ms(), 1100);
    }

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new();
        let other = clock.clone();

        other.advance(Duration::from_millis(250));
        assert_eq!(clock.now_ms(), 250);
    }

    #[test]
    fn test_manual_clock_set_is_monotonic() {
        let clock = ManualClock::new();
        clock.set(500);
        clock.set(100);
        assert_eq!(clock.now_ms(), 500);
    }

    #[test]
    fn test_system_clock_moves_forward() {
        let clock = SystemClock::new();
        let first = clock.now_ms();
        std::thread::sleep(Duration::from_millis(5));
        assert!(clock.now_ms() >= first);
    }
}
