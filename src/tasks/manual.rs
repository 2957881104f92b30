//! Virtual scheduler for deterministic timer tests.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use super::{PeriodicTask, Scheduler, TimerHandle};
use crate::clock::{Clock, ManualClock};
use crate::error::Result;

struct ManualTimer {
    every_ms: u64,
    next_due: u64,
    task: PeriodicTask,
    cancelled: Arc<AtomicBool>,
}

// == Manual Scheduler ==
/// Fires periodic tasks as a [`ManualClock`] is advanced through it.
///
/// Advancing the clock directly does not fire anything; use
/// [`ManualScheduler::advance`].
#[derive(Clone)]
pub struct ManualScheduler {
    clock: ManualClock,
    timers: Arc<Mutex<Vec<ManualTimer>>>,
}

impl ManualScheduler {
    pub fn new(clock: ManualClock) -> Self {
        Self {
            clock,
            timers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    /// Number of timers that have not been cancelled.
    pub fn active_timers(&self) -> usize {
        self.timers
            .lock()
            .iter()
            .filter(|timer| !timer.cancelled.load(Ordering::SeqCst))
            .count()
    }

    // == Advance ==
    /// Moves time forward by `by`, firing each due tick in time order with
    /// the clock set to the tick's instant.
    pub fn advance(&self, by: Duration) {
        let target = self.clock.now_ms() + by.as_millis() as u64;

        loop {
            // The lock is released before the task runs; tasks may cancel timers.
            let due = {
                let mut timers = self.timers.lock();
                timers.retain(|timer| !timer.cancelled.load(Ordering::SeqCst));
                timers
                    .iter_mut()
                    .filter(|timer| timer.next_due <= target)
                    .min_by_key(|timer| timer.next_due)
                    .map(|timer| {
                        let at = timer.next_due;
                        timer.next_due += timer.every_ms;
                        (at, timer.task.clone())
                    })
            };

            match due {
                Some((at, task)) => {
                    self.clock.set(at);
                    task();
                }
                None => break,
            }
        }

        self.clock.set(target);
    }
}

impl Scheduler for ManualScheduler {
    fn schedule_periodic(&self, every: Duration, task: PeriodicTask) -> Result<TimerHandle> {
        let every_ms = (every.as_millis() as u64).max(1);
        let cancelled = Arc::new(AtomicBool::new(false));

        self.timers.lock().push(ManualTimer {
            every_ms,
            next_due: self.clock.now_ms() + every_ms,
            task,
            cancelled: cancelled.clone(),
        });

        Ok(TimerHandle::new(move || {
            cancelled.store(true, Ordering::SeqCst);
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn recording_task(clock: &ManualClock) -> (Arc<Mutex<Vec<u64>>>, PeriodicTask) {
        let fired = Arc::new(Mutex::new(Vec::new()));
        let log = fired.clone();
        let clock = clock.clone();
        let task: PeriodicTask = Arc::new(move || log.lock().push(clock.now_ms()));
        (fired, task)
    }

    #[test]
    fn test_fires_at_each_period() {
        let clock = ManualClock::new();
        let scheduler = ManualScheduler::new(clock.clone());
        let (fired, task) = recording_task(&clock);

        let _handle = scheduler
            .schedule_periodic(Duration::from_millis(1000), task)
            .unwrap();

        scheduler.advance(Duration::from_millis(600));
        assert!(fired.lock().is_empty());

        scheduler.advance(Duration::from_millis(2500));
        assert_eq!(*fired.lock(), vec![1000, 2000, 3000]);
        assert_eq!(clock.now_ms(), 3100);
    }

    #[test]
    fn test_interleaves_timers_in_time_order() {
        let clock = ManualClock::new();
        let scheduler = ManualScheduler::new(clock.clone());
        let (fired, task) = recording_task(&clock);

        let _a = scheduler
            .schedule_periodic(Duration::from_millis(300), task.clone())
            .unwrap();
        let _b = scheduler
            .schedule_periodic(Duration::from_millis(500), task)
            .unwrap();

        scheduler.advance(Duration::from_millis(1000));
        assert_eq!(*fired.lock(), vec![300, 500, 600, 900, 1000]);
    }

    #[test]
    fn test_cancelled_timer_does_not_fire() {
        let clock = ManualClock::new();
        let scheduler = ManualScheduler::new(clock.clone());
        let (fired, task) = recording_task(&clock);

        let handle = scheduler
            .schedule_periodic(Duration::from_millis(100), task)
            .unwrap();
        assert_eq!(scheduler.active_timers(), 1);

        drop(handle);
        scheduler.advance(Duration::from_millis(1000));

        assert!(fired.lock().is_empty());
        assert_eq!(scheduler.active_timers(), 0);
    }

    #[test]
    fn test_plain_clock_advance_fires_nothing() {
        let clock = ManualClock::new();
        let scheduler = ManualScheduler::new(clock.clone());
        let (fired, task) = recording_task(&clock);

        let _handle = scheduler
            .schedule_periodic(Duration::from_millis(100), task)
            .unwrap();

        clock.advance(Duration::from_millis(1000));
        assert!(fired.lock().is_empty());
    }
}
