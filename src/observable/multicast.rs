//! Multicast through a per-subscription relay.
//!
//! `multicast` guarantees exactly one upstream subscription per outer
//! subscription, regardless of how many times the selector's result is
//! itself subscribed internally: each outer subscribe builds a fresh relay,
//! wraps it as a connectable, runs the selector against the forked relay,
//! subscribes the downstream observer to the selector's result and then
//! connects. The returned handle disposes the downstream subscription and
//! the connection together.

use crate::observable::{ConnectableObservable, ConnectionHandle, Observable};
use crate::observer::Observer;
use crate::subscription::PairedSubscription;

/// Builds one relay per outer subscription.
pub trait RelayFactory {
  type Relay;
  fn relay(&self) -> Self::Relay;
}

impl<F, Sub> RelayFactory for F
where
  F: Fn() -> Sub,
{
  type Relay = Sub;

  #[inline]
  fn relay(&self) -> Sub { self() }
}

/// Derives the observable the downstream observer actually subscribes to.
pub trait MulticastSelector<Sub> {
  type Output: Observable;
  fn select(&self, relay: Sub) -> Self::Output;
}

impl<F, Sub, R> MulticastSelector<Sub> for F
where
  F: Fn(Sub) -> R,
  R: Observable,
{
  type Output = R;

  #[inline]
  fn select(&self, relay: Sub) -> R { self(relay) }
}

pub struct MulticastOp<S, F, Sel> {
  source: S,
  factory: F,
  selector: Sel,
}

impl<S: Clone, F: Clone, Sel: Clone> Clone for MulticastOp<S, F, Sel> {
  fn clone(&self) -> Self {
    MulticastOp {
      source: self.source.clone(),
      factory: self.factory.clone(),
      selector: self.selector.clone(),
    }
  }
}

pub trait MulticastExt: Observable + Sized {
  /// Share one upstream subscription through a fresh relay per subscription.
  ///
  /// ```rust
  /// use rxcast::prelude::*;
  /// use std::sync::{Arc, Mutex};
  ///
  /// let shared = from_iter::<_, ()>(1..=3)
  ///   .multicast(Subject::new, |relay: Subject<i32, ()>| relay);
  ///
  /// let seen = Arc::new(Mutex::new(vec![]));
  /// let c_seen = seen.clone();
  /// shared.subscribe(move |v| c_seen.lock().unwrap().push(v));
  /// assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
  /// ```
  fn multicast<F, Sel>(self, factory: F, selector: Sel) -> MulticastOp<Self, F, Sel>
  where
    F: RelayFactory,
    Sel: MulticastSelector<F::Relay>,
  {
    MulticastOp { source: self, factory, selector }
  }
}

impl<T: Observable> MulticastExt for T {}

impl<S, F, Sel> Observable for MulticastOp<S, F, Sel>
where
  S: Observable + Clone,
  S::Unsub: Send + 'static,
  F: RelayFactory,
  F::Relay: Observer<Item = S::Item, Err = S::Err> + Clone + Send + 'static,
  Sel: MulticastSelector<F::Relay>,
{
  type Item = <Sel::Output as Observable>::Item;
  type Err = <Sel::Output as Observable>::Err;
  type Unsub = PairedSubscription<<Sel::Output as Observable>::Unsub, ConnectionHandle<S, F::Relay>>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Self::Item, Err = Self::Err> + Send + 'static,
  {
    let relay = self.factory.relay();
    let connectable = ConnectableObservable::new(self.source, relay.clone());
    let derived = self.selector.select(relay);
    let downstream = derived.actual_subscribe(observer);
    let connection = connectable.connect();
    PairedSubscription::new(downstream, connection)
  }
}
