use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Subscription;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

/// Blocking pull of every value, in lock-step with the producer.
///
/// The internal observer writes into a single slot only once the previous
/// value has been consumed; until then the producer-side callback is held.
/// The consumer therefore sees every value, strictly in order, and the
/// producer is throttled to the consumer's pace. This is the one point in
/// the crate where blocking runs in both directions. Disposing the bridge
/// releases a held producer as well as a blocked pull.
pub struct NextBridge<Item, Err, U: Subscription> {
  channel: Arc<NextChannel<Item, Err>>,
  upstream: Option<U>,
}

struct NextChannel<Item, Err> {
  state: Mutex<NextState<Item, Err>>,
  filled: Condvar,
  vacated: Condvar,
}

struct NextState<Item, Err> {
  slot: Option<Item>,
  failed: Option<Err>,
  done: bool,
  disposed: bool,
}

struct NextObserver<Item, Err> {
  channel: Arc<NextChannel<Item, Err>>,
}

impl<Item, Err> Observer for NextObserver<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn next(&mut self, value: Item) {
    let mut state = self.channel.state.lock();
    while state.slot.is_some() && !state.done && !state.disposed {
      self.channel.vacated.wait(&mut state);
    }
    if state.done || state.disposed {
      return;
    }
    state.slot = Some(value);
    self.channel.filled.notify_one();
  }

  fn error(&mut self, err: Err) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.failed = Some(err);
    state.done = true;
    self.channel.filled.notify_all();
    self.channel.vacated.notify_all();
  }

  fn complete(&mut self) {
    let mut state = self.channel.state.lock();
    if state.done || state.disposed {
      return;
    }
    state.done = true;
    self.channel.filled.notify_all();
    self.channel.vacated.notify_all();
  }

  fn is_closed(&self) -> bool {
    let state = self.channel.state.lock();
    state.done || state.disposed
  }
}

impl<Item, Err, U: Subscription> NextBridge<Item, Err, U> {
  pub(crate) fn new<S>(source: S) -> Self
  where
    S: Observable<Item = Item, Err = Err, Unsub = U>,
    Item: Send + 'static,
    Err: Send + 'static,
  {
    let channel = Arc::new(NextChannel {
      state: Mutex::new(NextState { slot: None, failed: None, done: false, disposed: false }),
      filled: Condvar::new(),
      vacated: Condvar::new(),
    });
    let upstream = source.actual_subscribe(NextObserver { channel: channel.clone() });
    NextBridge { channel, upstream: Some(upstream) }
  }

  /// Block until the next value (or a terminal event) arrives. `Ok(None)`
  /// means the stream ended. Taking a value frees the slot and releases a
  /// held producer.
  pub fn pull(&mut self) -> Result<Option<Item>, Err> {
    let mut state = self.channel.state.lock();
    loop {
      if let Some(err) = state.failed.take() {
        state.slot = None;
        return Err(err);
      }
      if let Some(value) = state.slot.take() {
        self.channel.vacated.notify_one();
        return Ok(Some(value));
      }
      if state.done || state.disposed {
        return Ok(None);
      }
      self.channel.filled.wait(&mut state);
    }
  }

  /// Release the upstream subscription and wake every blocked party.
  pub fn unsubscribe(&mut self) {
    {
      let mut state = self.channel.state.lock();
      state.disposed = true;
      state.slot = None;
      self.channel.filled.notify_all();
      self.channel.vacated.notify_all();
    }
    if let Some(mut upstream) = self.upstream.take() {
      upstream.unsubscribe();
    }
  }
}

impl<Item, Err, U: Subscription> Drop for NextBridge<Item, Err, U> {
  fn drop(&mut self) { self.unsubscribe(); }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::blocking::BlockingExt;
  use crate::subject::Subject;
  use std::time::Duration;

  #[test]
  fn no_value_is_lost_between_pulls() {
    let subject = Subject::<i32, ()>::new();
    let mut bridge = subject.clone().blocking_next();

    // The producer pushes [1, 2] with no pull in between; the second push is
    // held until 1 is consumed.
    let producer = subject.clone();
    let handle = std::thread::spawn(move || {
      producer.clone().next(1);
      producer.clone().next(2);
      producer.clone().complete();
    });

    assert_eq!(bridge.pull(), Ok(Some(1)));
    assert_eq!(bridge.pull(), Ok(Some(2)));
    assert_eq!(bridge.pull(), Ok(None));
    handle.join().unwrap();
  }

  #[test]
  fn producer_is_held_while_the_slot_is_full() {
    let subject = Subject::<i32, ()>::new();
    let mut bridge = subject.clone().blocking_next();

    let producer = subject.clone();
    let handle = std::thread::spawn(move || {
      producer.clone().next(1);
      // Blocks here until the consumer takes 1.
      producer.clone().next(2);
    });

    std::thread::sleep(Duration::from_millis(30));
    assert!(!handle.is_finished());

    assert_eq!(bridge.pull(), Ok(Some(1)));
    assert_eq!(bridge.pull(), Ok(Some(2)));
    handle.join().unwrap();
  }

  #[test]
  fn disposal_releases_a_held_producer() {
    let subject = Subject::<i32, ()>::new();
    let mut bridge = subject.clone().blocking_next();

    let producer = subject.clone();
    let handle = std::thread::spawn(move || {
      producer.clone().next(1);
      producer.clone().next(2);
    });

    std::thread::sleep(Duration::from_millis(30));
    bridge.unsubscribe();
    // The held second push is released rather than hanging forever.
    handle.join().unwrap();
    assert_eq!(bridge.pull(), Ok(None));
  }

  #[test]
  fn error_surfaces_on_the_next_pull() {
    let subject = Subject::<i32, &'static str>::new();
    let mut bridge = subject.clone().blocking_next();

    subject.clone().error("boom");
    assert_eq!(bridge.pull(), Err("boom"));
    assert_eq!(bridge.pull(), Ok(None));
  }
}
