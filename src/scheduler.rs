//! The injected "run this unit of work, optionally after a delay" service.
//!
//! Core logic never reaches for a scheduler implicitly; the process-wide
//! [`default_scheduler`] exists only for the outermost convenience wrappers.

use crate::subscription::Subscription;
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;
use std::time::{Duration, Instant};

mod test_scheduler;
mod thread_scheduler;

pub use test_scheduler::TestScheduler;
pub use thread_scheduler::ThreadScheduler;

/// Orders units of work and schedules their execution.
pub trait Scheduler {
  /// Run `task` as soon as the scheduler allows.
  fn schedule_now(&self, task: Box<dyn FnOnce() + Send>) -> TaskHandle;

  /// Run `task` once `delay` has elapsed.
  fn schedule_after(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TaskHandle;
}

/// Cancellation handle for a scheduled task.
///
/// Cancelling after the task started running has no effect; before, the task
/// is skipped (and a delayed task's wait is cut short).
#[derive(Clone, Default)]
pub struct TaskHandle {
  inner: Arc<HandleInner>,
}

#[derive(Default)]
struct HandleInner {
  cancelled: Mutex<bool>,
  wakeup: Condvar,
}

impl TaskHandle {
  pub fn new() -> Self { Self::default() }

  pub fn is_cancelled(&self) -> bool { *self.inner.cancelled.lock() }

  /// Park until `delay` elapses or the handle is cancelled; reports whether
  /// it was cancelled.
  pub(crate) fn wait_for(&self, delay: Duration) -> bool {
    let deadline = Instant::now() + delay;
    let mut cancelled = self.inner.cancelled.lock();
    while !*cancelled {
      let now = Instant::now();
      if now >= deadline {
        break;
      }
      let _ = self.inner.wakeup.wait_for(&mut cancelled, deadline - now);
    }
    *cancelled
  }
}

impl Subscription for TaskHandle {
  fn unsubscribe(&mut self) {
    *self.inner.cancelled.lock() = true;
    self.inner.wakeup.notify_all();
  }

  fn is_closed(&self) -> bool { self.is_cancelled() }
}

/// The process-wide default scheduler, created on first use.
pub fn default_scheduler() -> Arc<ThreadScheduler> {
  static DEFAULT: Lazy<Arc<ThreadScheduler>> = Lazy::new(|| Arc::new(ThreadScheduler));
  DEFAULT.clone()
}

impl<S: Scheduler + ?Sized> Scheduler for Arc<S> {
  fn schedule_now(&self, task: Box<dyn FnOnce() + Send>) -> TaskHandle {
    (**self).schedule_now(task)
  }

  fn schedule_after(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TaskHandle {
    (**self).schedule_after(delay, task)
  }
}
