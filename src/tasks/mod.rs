//! Background Tasks Module
//!
//! The periodic auto-cleanup is started through a [`Scheduler`], so the
//! cache does not depend on a particular runtime's timer.
//!
//! # Schedulers
//! - [`TokioScheduler`]: real timer on a tokio runtime
//! - [`ManualScheduler`]: virtual timer driven by a [`ManualClock`](crate::clock::ManualClock)

mod cleanup;
mod manual;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;

pub use cleanup::TokioScheduler;
pub use manual::ManualScheduler;

/// Callback run on every tick of a periodic timer.
pub type PeriodicTask = Arc<dyn Fn() + Send + Sync>;

// == Scheduler ==
/// Capability to run a callback periodically.
pub trait Scheduler: Send + Sync {
    /// Schedules `task` every `every`, first firing one period from now.
    ///
    /// Returns an error if the host cannot schedule timers.
    fn schedule_periodic(&self, every: Duration, task: PeriodicTask) -> Result<TimerHandle>;
}

// == Timer Handle ==
/// Owns a scheduled timer. Dropping the handle cancels the timer.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl TimerHandle {
    /// Wraps the action that stops the timer.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stops the timer. Calling it again does nothing.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        self.cancel();
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
