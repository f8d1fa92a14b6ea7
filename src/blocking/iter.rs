use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Subscription;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::Arc;

/// Blocking enumeration of a push stream.
///
/// Every value is queued without bound; `next` blocks the calling thread
/// until the queue is non-empty or a terminal signal was recorded. The
/// upstream subscription is established lazily, on the first pull.
///
/// # Example
///
/// ```rust
/// use rxcast::prelude::*;
///
/// let values: Result<Vec<i32>, ()> = from_iter::<_, ()>(1..=3).blocking_iter().collect();
/// assert_eq!(values.unwrap(), vec![1, 2, 3]);
/// ```
pub struct BlockingIter<S: Observable> {
  source: Option<S>,
  channel: Arc<IterChannel<S::Item, S::Err>>,
  upstream: Option<S::Unsub>,
}

struct IterChannel<Item, Err> {
  state: Mutex<IterState<Item, Err>>,
  ready: Condvar,
}

struct IterState<Item, Err> {
  queue: VecDeque<Item>,
  failed: Option<Err>,
  done: bool,
  disposed: bool,
}

struct IterObserver<Item, Err> {
  channel: Arc<IterChannel<Item, Err>>,
}

impl<Item, Err> Observer for IterObserver<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn next(&mut self, value: Item) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.queue.push_back(value);
    self.channel.ready.notify_one();
  }

  fn error(&mut self, err: Err) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.failed = Some(err);
    state.done = true;
    self.channel.ready.notify_all();
  }

  fn complete(&mut self) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.done = true;
    self.channel.ready.notify_all();
  }

  fn is_closed(&self) -> bool {
    let state = self.channel.state.lock();
    state.done || state.disposed
  }
}

impl<S: Observable> BlockingIter<S> {
  pub(crate) fn new(source: S) -> Self {
    BlockingIter {
      source: Some(source),
      channel: Arc::new(IterChannel {
        state: Mutex::new(IterState {
          queue: VecDeque::new(),
          failed: None,
          done: false,
          disposed: false,
        }),
        ready: Condvar::new(),
      }),
      upstream: None,
    }
  }

  /// Release the upstream subscription and wake any blocked pull.
  pub fn unsubscribe(&mut self) {
    self.source = None;
    {
      let mut state = self.channel.state.lock();
      state.disposed = true;
      state.queue.clear();
      self.channel.ready.notify_all();
    }
    if let Some(mut upstream) = self.upstream.take() {
      upstream.unsubscribe();
    }
  }
}

impl<S: Observable> Drop for BlockingIter<S> {
  fn drop(&mut self) { self.unsubscribe(); }
}

impl<S> Iterator for BlockingIter<S>
where
  S: Observable,
  S::Item: Send + 'static,
  S::Err: Send + 'static,
{
  type Item = Result<S::Item, S::Err>;

  fn next(&mut self) -> Option<Self::Item> {
    if let Some(source) = self.source.take() {
      self.upstream = Some(source.actual_subscribe(IterObserver { channel: self.channel.clone() }));
    }
    let mut state = self.channel.state.lock();
    loop {
      if let Some(err) = state.failed.take() {
        state.queue.clear();
        return Some(Err(err));
      }
      if let Some(value) = state.queue.pop_front() {
        return Some(Ok(value));
      }
      if state.done || state.disposed {
        return None;
      }
      self.channel.ready.wait(&mut state);
    }
  }
}
