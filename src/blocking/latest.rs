use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Subscription;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Blocking pull of the most recent undelivered value.
///
/// The internal observer overwrites a single slot; `pull` blocks until a
/// fresh value is available, so values produced while the consumer had not
/// yet pulled are coalesced away. A value is never delivered twice.
pub struct LatestBridge<Item, Err, U: Subscription> {
  channel: Arc<LatestChannel<Item, Err>>,
  upstream: Option<U>,
}

struct LatestChannel<Item, Err> {
  state: Mutex<LatestState<Item, Err>>,
  fresh: Condvar,
}

struct LatestState<Item, Err> {
  slot: Option<Item>,
  failed: Option<Err>,
  done: bool,
  disposed: bool,
}

struct LatestObserver<Item, Err> {
  channel: Arc<LatestChannel<Item, Err>>,
}

impl<Item, Err> Observer for LatestObserver<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn next(&mut self, value: Item) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.slot = Some(value);
    self.channel.fresh.notify_one();
  }

  fn error(&mut self, err: Err) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.failed = Some(err);
    state.done = true;
    self.channel.fresh.notify_all();
  }

  fn complete(&mut self) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.done = true;
    self.channel.fresh.notify_all();
  }

  fn is_closed(&self) -> bool {
    let state = self.channel.state.lock();
    state.done || state.disposed
  }
}

impl<Item, Err, U: Subscription> LatestBridge<Item, Err, U> {
  pub(crate) fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err, Unsub = U>,
    Item: Send + 'static,
    Err: Send + 'static,
  {
    let channel = Arc::new(LatestChannel {
      state: Mutex::new(LatestState { slot: None, failed: None, done: false, disposed: false }),
      fresh: Condvar::new(),
    });
    let upstream = source.actual_subscribe(LatestObserver { channel: channel.clone() });
    LatestBridge { channel, upstream: Some(upstream) }
  }

  /// Block until a fresh value (or a terminal event) arrives. `Ok(None)`
  /// means the stream ended.
  pub fn pull(&mut self) -> Result<Option<Item>, Err> {
    let mut state = self.channel.state.lock();
    loop {
      if let Some(err) = state.failed.take() {
        state.slot = None;
        return Err(err);
      }
      if let Some(value) = state.slot.take() {
        return Ok(Some(value));
      }
      if state.done || state.disposed {
        return Ok(None);
      }
      self.channel.fresh.wait(&mut state);
    }
  }

  /// Release the upstream subscription and wake any blocked pull.
  pub fn unsubscribe(&mut self) {
    {
      let mut state = self.channel.state.lock();
      state.disposed = true;
      state.slot = None;
      self.channel.fresh.notify_all();
    }
    if let Some(mut upstream) = self.upstream.take() {
      upstream.unsubscribe();
    }
  }
}

impl<Item, Err, U: Subscription> Drop for LatestBridge<Item, Err, U> {
  fn drop(&mut self) { self.unsubscribe(); }
}
