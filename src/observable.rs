//! Observable trait, subscribe helpers and source constructors.

use crate::observer::{Observer, ObserverAll};
use crate::subscription::Subscription;

mod connectable;
mod create;
mod from_iter;
mod multicast;
mod of;
mod trivial;

pub use connectable::{ConnectableObservable, ConnectionHandle};
pub use create::{create, Create, Feeder};
pub use from_iter::{from_iter, ObservableFromIter};
pub use multicast::{MulticastExt, MulticastOp, MulticastSelector, RelayFactory};
pub use of::{of, ObservableOf};
pub use trivial::{empty, never, throw, ObservableEmpty, ObservableNever, ObservableThrow};

/// A capability to accept one observer per subscription and push values and
/// termination to it.
///
/// Subscribing consumes the observable; observables that can be subscribed
/// more than once are `Clone` (subjects and the connectable wrappers clone
/// cheaply by sharing their inner state).
pub trait Observable {
  type Item;
  type Err;
  type Unsub: Subscription;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Self::Item, Err = Self::Err> + Send + 'static;
}

/// Closure-based subscribe entry points.
pub trait SubscribeExt: Observable + Sized {
  /// Subscribe with a value handler; terminal events are ignored.
  fn subscribe<N>(self, next: N) -> Self::Unsub
  where
    N: FnMut(Self::Item) + Send + 'static,
    Self::Item: 'static,
    Self::Err: 'static,
  {
    self.actual_subscribe(ObserverAll::new(next, |_| {}, || {}))
  }

  /// Subscribe with value and error handlers.
  fn subscribe_err<N, E>(self, next: N, error: E) -> Self::Unsub
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(Self::Err) + Send + 'static,
    Self::Item: 'static,
    Self::Err: 'static,
  {
    self.actual_subscribe(ObserverAll::new(next, error, || {}))
  }

  /// Subscribe with value, error and completion handlers.
  fn subscribe_all<N, E, C>(self, next: N, error: E, complete: C) -> Self::Unsub
  where
    N: FnMut(Self::Item) + Send + 'static,
    E: FnMut(Self::Err) + Send + 'static,
    C: FnMut() + Send + 'static,
    Self::Item: 'static,
    Self::Err: 'static,
  {
    self.actual_subscribe(ObserverAll::new(next, error, complete))
  }
}

impl<T: Observable> SubscribeExt for T {}
