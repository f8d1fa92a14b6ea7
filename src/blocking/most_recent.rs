use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Subscription;
use parking_lot::Mutex;
use std::sync::Arc;

/// Non-blocking poll of the most recent value.
///
/// The internal observer overwrites a single slot and never blocks the
/// producer; `poll` never blocks the consumer and returns the slot's current
/// value, seeded with an initial value until the first push arrives. The
/// same value may be returned repeatedly if no new push occurred between
/// polls.
pub struct MostRecentBridge<Item, Err, U: Subscription> {
  channel: Arc<MostRecentChannel<Item, Err>>,
  upstream: Option<U>,
}

struct MostRecentChannel<Item, Err> {
  state: Mutex<MostRecentState<Item, Err>>,
}

struct MostRecentState<Item, Err> {
  current: Item,
  failed: Option<Err>,
  done: bool,
  disposed: bool,
}

struct MostRecentObserver<Item, Err> {
  channel: Arc<MostRecentChannel<Item, Err>>,
}

impl<Item, Err> Observer for MostRecentObserver<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn next(&mut self, value: Item) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.current = value;
  }

  fn error(&mut self, err: Err) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.failed = Some(err);
    state.done = true;
  }

  fn complete(&mut self) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.done = true;
  }

  fn is_closed(&self) -> bool {
    let state = self.channel.state.lock();
    state.done || state.disposed
  }
}

impl<Item, Err, U: Subscription> MostRecentBridge<Item, Err, U> {
  pub(crate) fn new<S>(source: S, initial: Item) -> Self
  where
    S: Observable<Item = Item, Err = Err, Unsub = U>,
    Item: Send + 'static,
    Err: Send + 'static,
  {
    let channel = Arc::new(MostRecentChannel {
      state: Mutex::new(MostRecentState {
        current: initial,
        failed: None,
        done: false,
        disposed: false,
      }),
    });
    let upstream = source.actual_subscribe(MostRecentObserver { channel: channel.clone() });
    MostRecentBridge { channel, upstream: Some(upstream) }
  }

  /// The slot's current value; never blocks. `Ok(None)` once the stream has
  /// ended or the bridge was disposed.
  pub fn poll(&mut self) -> Result<Option<Item>, Err>
  where
    Item: Clone,
  {
    let mut state = self.channel.state.lock();
    if let Some(err) = state.failed.take() {
      return Err(err);
    }
    if state.done || state.disposed {
      return Ok(None);
    }
    Ok(Some(state.current.clone()))
  }

  /// Release the upstream subscription.
  pub fn unsubscribe(&mut self) {
    self.channel.state.lock().disposed = true;
    if let Some(mut upstream) = self.upstream.take() {
      upstream.unsubscribe();
    }
  }
}

impl<Item, Err, U: Subscription> Drop for MostRecentBridge<Item, Err, U> {
  fn drop(&mut self) { self.unsubscribe(); }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::blocking::BlockingExt;
  use crate::subject::Subject;

  #[test]
  fn repeats_the_seed_until_a_push_arrives() {
    let subject = Subject::<i32, ()>::new();
    let mut bridge = subject.clone().blocking_most_recent(0);

    assert_eq!(bridge.poll(), Ok(Some(0)));
    assert_eq!(bridge.poll(), Ok(Some(0)));

    subject.clone().next(5);
    assert_eq!(bridge.poll(), Ok(Some(5)));
    assert_eq!(bridge.poll(), Ok(Some(5)));
  }

  #[test]
  fn intermediate_values_are_skipped() {
    let subject = Subject::<i32, ()>::new();
    let mut bridge = subject.clone().blocking_most_recent(0);

    subject.clone().next(1);
    subject.clone().next(2);
    subject.clone().next(3);
    assert_eq!(bridge.poll(), Ok(Some(3)));
  }

  #[test]
  fn terminal_events_end_the_polls() {
    let subject = Subject::<i32, &'static str>::new();
    let mut bridge = subject.clone().blocking_most_recent(0);

    subject.clone().next(1);
    subject.clone().error("boom");

    assert_eq!(bridge.poll(), Err("boom"));
    assert_eq!(bridge.poll(), Ok(None));
  }
}
