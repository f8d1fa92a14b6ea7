//! Relay-variant convenience factories.
//!
//! Each returns a [`ConnectableObservable`] over the chosen relay: it does
//! not begin emitting when subscribed to, only when `connect` is applied.
//! This way all intended observers can subscribe before the source begins.

use crate::observable::{ConnectableObservable, Observable};
use crate::ops::ref_count::RefCountObservable;
use crate::subject::{BehaviorSubject, LastSubject, ReplaySubject, Subject};
use std::time::Duration;

pub trait Publish: Observable + Sized {
  /// Multicast through a plain relay: late subscribers see only values
  /// emitted after they subscribed (and after `connect`).
  fn publish(self) -> ConnectableObservable<Self, Subject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, Subject::new())
  }

  /// Multicast through a current-value relay seeded with `initial`.
  fn publish_behavior(
    self,
    initial: Self::Item,
  ) -> ConnectableObservable<Self, BehaviorSubject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, BehaviorSubject::new(initial))
  }

  /// Multicast only the final value, delivered on completion.
  fn publish_last(self) -> ConnectableObservable<Self, LastSubject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, LastSubject::new())
  }

  /// Multicast with a backlog of the `buffer_size` most recent values.
  fn replay(
    self,
    buffer_size: usize,
  ) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, ReplaySubject::bounded(buffer_size))
  }

  /// Multicast with a backlog bounded by count and age.
  fn replay_within(
    self,
    buffer_size: usize,
    window: Duration,
  ) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, ReplaySubject::bounded_within(buffer_size, window))
  }

  /// Multicast with an unbounded backlog.
  fn replay_all(self) -> ConnectableObservable<Self, ReplaySubject<Self::Item, Self::Err>> {
    ConnectableObservable::new(self, ReplaySubject::unbounded())
  }

  /// `publish().ref_count()`: connect while at least one observer is
  /// subscribed, disconnect when the last leaves.
  fn share(self) -> RefCountObservable<Self, Subject<Self::Item, Self::Err>> {
    self.publish().ref_count()
  }
}

impl<T: Observable> Publish for T {}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::{from_iter, SubscribeExt};
  use std::sync::{Arc, Mutex};

  #[test]
  fn publish_multicasts_to_all_forks() {
    let published = from_iter::<_, ()>([100]).publish();
    let first = Arc::new(Mutex::new(0));
    let second = Arc::new(Mutex::new(0));

    let c_first = first.clone();
    let c_second = second.clone();
    published.fork().subscribe(move |v| *c_first.lock().unwrap() = v);
    published.fork().subscribe(move |v| *c_second.lock().unwrap() = v);

    published.connect();
    assert_eq!(*first.lock().unwrap(), 100);
    assert_eq!(*second.lock().unwrap(), 100);
  }

  #[test]
  fn replay_backlog_reaches_late_fork() {
    let published = from_iter::<_, ()>(1..=5).replay(3);
    published.connect();

    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    published.fork().subscribe(move |v| c_seen.lock().unwrap().push(v));

    assert_eq!(*seen.lock().unwrap(), vec![3, 4, 5]);
  }

  #[test]
  fn publish_last_delivers_on_completion() {
    let published = from_iter::<_, ()>(1..=4).publish_last();
    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    published.fork().subscribe(move |v| c_seen.lock().unwrap().push(v));

    published.connect();
    assert_eq!(*seen.lock().unwrap(), vec![4]);
  }

  #[test]
  #[should_panic(expected = "at least one element")]
  fn replay_rejects_zero_capacity() {
    let _ = from_iter::<_, ()>(1..=3).replay(0);
  }
}
