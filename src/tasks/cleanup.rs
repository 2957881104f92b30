//! Tokio Cleanup Timer
//!
//! Runs the periodic cleanup callback on a tokio runtime.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use super::{PeriodicTask, Scheduler, TimerHandle};
use crate::error::{CacheError, Result};

// == Tokio Scheduler ==
/// Schedules periodic tasks as tokio tasks.
#[derive(Debug, Clone)]
pub struct TokioScheduler {
    runtime: Handle,
}

impl TokioScheduler {
    pub fn new(runtime: Handle) -> Self {
        Self { runtime }
    }

    /// Uses the runtime of the calling context.
    ///
    /// Fails when called outside a tokio runtime.
    pub fn current() -> Result<Self> {
        Handle::try_current()
            .map(Self::new)
            .map_err(|err| CacheError::Scheduler(err.to_string()))
    }
}

impl Scheduler for TokioScheduler {
    /// Spawns a task that sleeps one period, runs the callback, and repeats.
    ///
    /// Ticks delayed by a busy runtime are not bunched up: the next tick is
    /// pushed back instead.
    fn schedule_periodic(&self, every: Duration, task: PeriodicTask) -> Result<TimerHandle> {
        let join = self.runtime.spawn(async move {
            info!("Starting cleanup timer with interval of {:?}", every);

            let mut ticker = interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                task();
            }
        });

        Ok(TimerHandle::new(move || {
            join.abort();
            debug!("Cleanup timer aborted");
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    fn counting_task() -> (Arc<AtomicUsize>, PeriodicTask) {
        let ticks = Arc::new(AtomicUsize::new(0));
        let counter = ticks.clone();
        let task: PeriodicTask = Arc::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        (ticks, task)
    }

    #[test]
    fn test_current_fails_outside_runtime() {
        let result = TokioScheduler::current();
        assert!(matches!(result, Err(CacheError::Scheduler(_))));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires_every_period() {
        let (ticks, task) = counting_task();
        let scheduler = TokioScheduler::current().unwrap();

        let _handle = scheduler
            .schedule_periodic(Duration::from_secs(1), task)
            .unwrap();

        tokio::time::sleep(Duration::from_millis(500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 0, "No tick before one period");

        tokio::time::sleep(Duration::from_millis(3000)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timer_stops_after_cancel() {
        let (ticks, task) = counting_task();
        let scheduler = TokioScheduler::current().unwrap();

        let mut handle = scheduler
            .schedule_periodic(Duration::from_secs(1), task)
            .unwrap();

        tokio::time::sleep(Duration::from_millis(1500)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1);

        handle.cancel();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(ticks.load(Ordering::SeqCst), 1, "Cancelled timer must not fire");
    }
}
