use super::{Scheduler, TaskHandle};
use std::time::Duration;

/// Creates a new thread for each unit of work.
#[derive(Clone, Copy, Debug, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
  fn schedule_now(&self, task: Box<dyn FnOnce() + Send>) -> TaskHandle {
    let handle = TaskHandle::new();
    let task_handle = handle.clone();
    std::thread::spawn(move || {
      if !task_handle.is_cancelled() {
        task();
      }
    });
    handle
  }

  fn schedule_after(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TaskHandle {
    let handle = TaskHandle::new();
    let task_handle = handle.clone();
    std::thread::spawn(move || {
      if !task_handle.wait_for(delay) {
        task();
      }
    });
    handle
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::subscription::Subscription;
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::mpsc;
  use std::sync::Arc;

  #[test]
  fn runs_the_task() {
    let (tx, rx) = mpsc::channel();
    ThreadScheduler.schedule_now(Box::new(move || {
      tx.send(42).unwrap();
    }));
    assert_eq!(rx.recv_timeout(Duration::from_secs(5)).unwrap(), 42);
  }

  #[test]
  fn delayed_task_waits() {
    let (tx, rx) = mpsc::channel();
    let start = std::time::Instant::now();
    ThreadScheduler.schedule_after(
      Duration::from_millis(30),
      Box::new(move || {
        tx.send(()).unwrap();
      }),
    );
    rx.recv_timeout(Duration::from_secs(5)).unwrap();
    assert!(start.elapsed() >= Duration::from_millis(30));
  }

  #[test]
  fn cancelled_task_is_skipped() {
    let fired = Arc::new(AtomicUsize::new(0));
    let c_fired = fired.clone();
    let mut handle = ThreadScheduler.schedule_after(
      Duration::from_millis(200),
      Box::new(move || {
        c_fired.fetch_add(1, Ordering::SeqCst);
      }),
    );
    handle.unsubscribe();
    // The cancel cuts the wait short; give the worker a moment to observe it.
    std::thread::sleep(Duration::from_millis(300));
    assert_eq!(fired.load(Ordering::SeqCst), 0);
  }
}
