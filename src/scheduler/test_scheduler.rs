use super::{Scheduler, TaskHandle};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;

/// Virtual-time scheduler for deterministic tests.
///
/// Tasks are queued with a due time on a virtual clock that only moves when
/// [`advance`](TestScheduler::advance) is called. Due tasks run on the
/// advancing thread, in due order, outside the scheduler's own lock, so a
/// task may freely schedule further work.
#[derive(Clone, Default)]
pub struct TestScheduler {
  inner: Arc<Mutex<TestSchedulerInner>>,
}

#[derive(Default)]
struct TestSchedulerInner {
  now: Duration,
  seq: u64,
  queue: Vec<QueuedTask>,
}

struct QueuedTask {
  due: Duration,
  seq: u64,
  handle: TaskHandle,
  task: Box<dyn FnOnce() + Send>,
}

impl TestScheduler {
  pub fn new() -> Self { Self::default() }

  /// The current virtual time.
  pub fn now(&self) -> Duration { self.inner.lock().now }

  /// Number of tasks still queued.
  pub fn pending_tasks(&self) -> usize { self.inner.lock().queue.len() }

  /// Move virtual time forward, running every due, uncancelled task.
  pub fn advance(&self, by: Duration) {
    let target = self.inner.lock().now + by;
    loop {
      let due_task = {
        let mut inner = self.inner.lock();
        let next = inner
          .queue
          .iter()
          .enumerate()
          .filter(|(_, queued)| queued.due <= target)
          .min_by_key(|(_, queued)| (queued.due, queued.seq))
          .map(|(index, _)| index);
        match next {
          Some(index) => {
            let queued = inner.queue.remove(index);
            if queued.due > inner.now {
              inner.now = queued.due;
            }
            Some(queued)
          }
          None => {
            inner.now = target;
            None
          }
        }
      };
      match due_task {
        Some(queued) => {
          if !queued.handle.is_cancelled() {
            (queued.task)();
          }
        }
        None => break,
      }
    }
  }

  fn push(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TaskHandle {
    let handle = TaskHandle::new();
    let mut inner = self.inner.lock();
    let due = inner.now + delay;
    let seq = inner.seq;
    inner.seq += 1;
    inner.queue.push(QueuedTask { due, seq, handle: handle.clone(), task });
    handle
  }
}

impl Scheduler for TestScheduler {
  fn schedule_now(&self, task: Box<dyn FnOnce() + Send>) -> TaskHandle {
    self.push(Duration::ZERO, task)
  }

  fn schedule_after(&self, delay: Duration, task: Box<dyn FnOnce() + Send>) -> TaskHandle {
    self.push(delay, task)
  }
}
