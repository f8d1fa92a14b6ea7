//! Multicasting with an explicit shared connection.
//!
//! A `ConnectableObservable` pairs an upstream source with one relay
//! (subject). Downstream observers subscribe to the relay and see nothing
//! until [`connect`](ConnectableObservable::connect) subscribes the relay to
//! the source. At most one upstream subscription exists at any instant;
//! disposing the connection handle clears the state and permits a later
//! reconnect.

use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::{BoxSubscription, Subscription};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

/// A source whose upstream subscription is deferred until `connect`.
///
/// # Example
///
/// ```rust
/// use rxcast::prelude::*;
///
/// let published = from_iter::<_, ()>(1..=2).publish();
/// let seen = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
///
/// let c_seen = seen.clone();
/// published.fork().subscribe(move |v| c_seen.lock().unwrap().push(v));
/// assert!(seen.lock().unwrap().is_empty());
///
/// published.connect();
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct ConnectableObservable<S, Sub> {
  inner: Arc<ConnectableInner<S, Sub>>,
}

struct ConnectableInner<S, Sub> {
  subject: Sub,
  state: Mutex<ConnectState<S>>,
}

struct ConnectState<S> {
  source: S,
  generation: u64,
  conn: Conn,
}

enum Conn {
  Idle,
  /// Claimed by a `connect` that is establishing the upstream subscription
  /// outside the lock.
  Connecting(u64),
  Active(u64, BoxSubscription),
  /// Claimed by a dispose that is tearing the upstream subscription down
  /// outside the lock. Reconnection is refused until the teardown finishes,
  /// so two upstream subscriptions can never overlap.
  Disconnecting(u64),
}

impl<S, Sub> Clone for ConnectableObservable<S, Sub> {
  fn clone(&self) -> Self { ConnectableObservable { inner: self.inner.clone() } }
}

impl<S, Sub> ConnectableObservable<S, Sub> {
  pub fn new(source: S, subject: Sub) -> Self {
    ConnectableObservable {
      inner: Arc::new(ConnectableInner {
        subject,
        state: Mutex::new(ConnectState { source, generation: 0, conn: Conn::Idle }),
      }),
    }
  }

  /// The relay, as an observable for downstream subscribers. All forks share
  /// the same upstream connection.
  pub fn fork(&self) -> Sub
  where
    Sub: Clone,
  {
    self.inner.subject.clone()
  }

  pub fn is_connected(&self) -> bool {
    !matches!(self.inner.state.lock().conn, Conn::Idle)
  }
}

impl<S, Sub> ConnectableObservable<S, Sub>
where
  S: Observable + Clone,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Clone + Send + 'static,
{
  /// Subscribe the relay to the source, once.
  ///
  /// The first `connect` after construction (or after a disconnect) owns the
  /// upstream subscription: disposing the returned handle disconnects and
  /// permits reconnection. While connected, further `connect` calls return a
  /// handle whose dispose is a no-op.
  ///
  /// The upstream subscription is established outside the connection lock,
  /// so a synchronous source may re-enter `connect`/disconnect from its own
  /// notifications without deadlocking. A disconnect racing the
  /// establishment wins and the fresh subscription is torn down; a `connect`
  /// racing an in-flight disconnect is refused (non-owning handle). Two
  /// upstream subscriptions never overlap.
  pub fn connect(&self) -> ConnectionHandle<S, Sub> {
    let (generation, source) = {
      let mut state = self.inner.state.lock();
      match state.conn {
        Conn::Idle => {
          state.generation += 1;
          let generation = state.generation;
          state.conn = Conn::Connecting(generation);
          (generation, state.source.clone())
        }
        Conn::Connecting(_) | Conn::Active(..) | Conn::Disconnecting(_) => {
          return ConnectionHandle { inner: None, generation: 0 };
        }
      }
    };

    trace!(generation, "connecting relay to upstream source");
    let upstream = source.actual_subscribe(self.inner.subject.clone());

    let mut state = self.inner.state.lock();
    match state.conn {
      Conn::Connecting(current) if current == generation => {
        state.conn = Conn::Active(generation, Box::new(upstream));
        ConnectionHandle { inner: Some(self.inner.clone()), generation }
      }
      _ => {
        // Disconnected while the subscription was being established.
        drop(state);
        let mut upstream = upstream;
        upstream.unsubscribe();
        ConnectionHandle { inner: None, generation }
      }
    }
  }
}

impl<S, Sub> Observable for ConnectableObservable<S, Sub>
where
  Sub: Observable + Clone,
{
  type Item = Sub::Item;
  type Err = Sub::Err;
  type Unsub = Sub::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Self::Item, Err = Self::Err> + Send + 'static,
  {
    self.inner.subject.clone().actual_subscribe(observer)
  }
}

/// Handle for one upstream connection of a [`ConnectableObservable`].
///
/// Only the handle returned by the connecting `connect` call owns the
/// connection; disposing it disconnects the upstream subscription and clears
/// the connected state. Handles returned by later `connect` calls (and
/// handles whose connection was already replaced) dispose as no-ops.
pub struct ConnectionHandle<S, Sub> {
  inner: Option<Arc<ConnectableInner<S, Sub>>>,
  generation: u64,
}

impl<S, Sub> ConnectionHandle<S, Sub> {
  /// Whether this handle owns the live upstream connection.
  pub fn owns_connection(&self) -> bool { self.inner.is_some() }
}

impl<S, Sub> Subscription for ConnectionHandle<S, Sub> {
  fn unsubscribe(&mut self) {
    if let Some(inner) = self.inner.take() {
      let upstream = {
        let mut state = inner.state.lock();
        let current = std::mem::replace(&mut state.conn, Conn::Idle);
        match current {
          Conn::Active(generation, upstream) if generation == self.generation => {
            state.conn = Conn::Disconnecting(generation);
            Some(upstream)
          }
          Conn::Connecting(generation) if generation == self.generation => None,
          other => {
            state.conn = other;
            None
          }
        }
      };
      if let Some(mut upstream) = upstream {
        trace!(generation = self.generation, "disconnecting upstream source");
        upstream.unsubscribe();
        let mut state = inner.state.lock();
        if matches!(state.conn, Conn::Disconnecting(generation) if generation == self.generation) {
          state.conn = Conn::Idle;
        }
      }
    }
  }

  fn is_closed(&self) -> bool { self.inner.is_none() }
}
