use super::core::{Buffering, Hub, SubjectSubscription};
use crate::observable::Observable;
use crate::observer::Observer;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;

/// A relay holding an ordered backlog of past values, bounded by a maximum
/// count and/or a maximum age.
///
/// New subscribers receive the backlog (oldest first, trimmed to the bounds
/// at delivery time) and then future values, with no gap and no duplicate. After
/// termination a subscriber still receives the (trimmed) backlog, then the
/// terminal event.
pub struct ReplaySubject<Item, Err> {
  hub: Arc<Hub<Item, Err>>,
}

impl<Item, Err> ReplaySubject<Item, Err> {
  /// Keep at most the `max_len` most recent values.
  pub fn bounded(max_len: usize) -> Self {
    assert!(max_len > 0, "replay buffer must hold at least one element");
    Self::with_bounds(max_len, None)
  }

  /// Keep every value ever pushed.
  pub fn unbounded() -> Self { Self::with_bounds(usize::MAX, None) }

  /// Keep values no older than `window`.
  pub fn within(window: Duration) -> Self { Self::with_bounds(usize::MAX, Some(window)) }

  /// Keep at most `max_len` values no older than `window`.
  pub fn bounded_within(max_len: usize, window: Duration) -> Self {
    assert!(max_len > 0, "replay buffer must hold at least one element");
    Self::with_bounds(max_len, Some(window))
  }

  fn with_bounds(max_len: usize, max_age: Option<Duration>) -> Self {
    ReplaySubject {
      hub: Arc::new(Hub::new(Buffering::Backlog { buf: VecDeque::new(), max_len, max_age })),
    }
  }

  pub fn subscriber_count(&self) -> usize { self.hub.subscriber_count() }

  pub fn is_terminated(&self) -> bool { self.hub.is_terminated() }
}

impl<Item, Err> Clone for ReplaySubject<Item, Err> {
  fn clone(&self) -> Self { ReplaySubject { hub: self.hub.clone() } }
}

impl<Item: Clone, Err: Clone> Observer for ReplaySubject<Item, Err> {
  type Item = Item;
  type Err = Err;

  #[inline]
  fn next(&mut self, value: Item) { self.hub.emit(value) }

  #[inline]
  fn error(&mut self, err: Err) { self.hub.fail(err) }

  #[inline]
  fn complete(&mut self) { self.hub.finish() }

  #[inline]
  fn is_closed(&self) -> bool { self.hub.is_terminated() }
}

impl<Item, Err> Observable for ReplaySubject<Item, Err>
where
  Item: Clone + Send + 'static,
  Err: Clone + Send + 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = SubjectSubscription<Item, Err>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Item, Err = Err> + Send + 'static,
  {
    Hub::subscribe(&self.hub, Box::new(observer))
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::SubscribeExt;
  use std::sync::{Arc, Mutex};

  #[test]
  fn backlog_is_trimmed_to_capacity() {
    let subject = ReplaySubject::<_, ()>::bounded(3);
    for v in [1, 2, 3, 4, 5] {
      subject.clone().next(v);
    }

    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));

    assert_eq!(*seen.lock().unwrap(), vec![3, 4, 5]);
  }

  #[test]
  fn backlog_then_live_values_without_gap() {
    let subject = ReplaySubject::<_, ()>::unbounded();
    subject.clone().next(1);

    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));

    subject.clone().next(2);
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
  }

  #[test]
  fn backlog_survives_completion() {
    let subject = ReplaySubject::<_, ()>::bounded(2);
    subject.clone().next(1);
    subject.clone().next(2);
    subject.clone().next(3);
    subject.clone().complete();

    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let c_seen = seen.clone();
    let c_completed = completed.clone();
    subject.clone().subscribe_all(
      move |v| c_seen.lock().unwrap().push(v),
      |_| {},
      move || *c_completed.lock().unwrap() = true,
    );

    assert_eq!(*seen.lock().unwrap(), vec![2, 3]);
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn backlog_then_error_for_late_subscriber() {
    let subject = ReplaySubject::<i32, &'static str>::unbounded();
    subject.clone().next(7);
    subject.clone().error("boom");

    let seen = Arc::new(Mutex::new(vec![]));
    let errors = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let c_errors = errors.clone();
    subject.clone().subscribe_err(
      move |v| c_seen.lock().unwrap().push(v),
      move |e| c_errors.lock().unwrap().push(e),
    );

    assert_eq!(*seen.lock().unwrap(), vec![7]);
    assert_eq!(*errors.lock().unwrap(), vec!["boom"]);
  }

  #[test]
  fn aged_values_fall_out_of_the_window() {
    let subject = ReplaySubject::<_, ()>::within(Duration::from_millis(40));
    subject.clone().next(1);
    std::thread::sleep(Duration::from_millis(80));
    subject.clone().next(2);

    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));

    assert_eq!(*seen.lock().unwrap(), vec![2]);
  }
}
