//! One-shot automatic connection.
//!
//! Counts subscriptions (never decrementing) and connects exactly once
//! when the count first reaches the minimum. Never disconnects on its own;
//! the connection handle is passed to the `on_connect` callback so the
//! caller can tear the upstream down explicitly.

use crate::observable::{ConnectableObservable, ConnectionHandle, Observable};
use crate::observer::Observer;
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::trace;

type ConnectCallback<S, Sub> = Box<dyn FnOnce(ConnectionHandle<S, Sub>) + Send>;

pub struct AutoConnectObservable<S, Sub> {
  state: Arc<AutoConnectState<S, Sub>>,
}

impl<S, Sub> Clone for AutoConnectObservable<S, Sub> {
  fn clone(&self) -> Self { AutoConnectObservable { state: self.state.clone() } }
}

struct AutoConnectState<S, Sub> {
  connectable: ConnectableObservable<S, Sub>,
  min_observers: usize,
  inner: Mutex<AutoConnectInner<S, Sub>>,
}

struct AutoConnectInner<S, Sub> {
  seen: usize,
  connected: bool,
  on_connect: Option<ConnectCallback<S, Sub>>,
}

impl<S, Sub> ConnectableObservable<S, Sub>
where
  S: Observable + Clone,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Clone + Send + 'static,
{
  /// Connect once `min_observers` subscriptions have been seen. With
  /// `min_observers == 0` the connection is made immediately.
  pub fn auto_connect(self, min_observers: usize) -> AutoConnectObservable<S, Sub> {
    self.auto_connect_with(min_observers, |_| {})
  }

  /// Like [`auto_connect`](Self::auto_connect); `on_connect` receives the
  /// connection handle when the connection is made.
  pub fn auto_connect_with(
    self,
    min_observers: usize,
    on_connect: impl FnOnce(ConnectionHandle<S, Sub>) + Send + 'static,
  ) -> AutoConnectObservable<S, Sub> {
    let state = Arc::new(AutoConnectState {
      connectable: self,
      min_observers,
      inner: Mutex::new(AutoConnectInner {
        seen: 0,
        connected: false,
        on_connect: Some(Box::new(on_connect)),
      }),
    });
    if min_observers == 0 {
      connect_once(&state);
    }
    AutoConnectObservable { state }
  }
}

fn connect_once<S, Sub>(state: &Arc<AutoConnectState<S, Sub>>)
where
  S: Observable + Clone,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Clone + Send + 'static,
{
  let callback = {
    let mut inner = state.inner.lock();
    if inner.connected {
      return;
    }
    inner.connected = true;
    inner.on_connect.take()
  };
  trace!(min_observers = state.min_observers, "auto-connecting upstream");
  let handle = state.connectable.connect();
  if let Some(callback) = callback {
    callback(handle);
  }
}

impl<S, Sub> Observable for AutoConnectObservable<S, Sub>
where
  S: Observable + Clone,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Observable + Clone + Send + 'static,
{
  type Item = <Sub as Observable>::Item;
  type Err = <Sub as Observable>::Err;
  type Unsub = <Sub as Observable>::Unsub;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Self::Item, Err = Self::Err> + Send + 'static,
  {
    let downstream = self.state.connectable.fork().actual_subscribe(observer);
    let ready = {
      let mut inner = self.state.inner.lock();
      inner.seen += 1;
      !inner.connected && inner.seen >= self.state.min_observers
    };
    if ready {
      connect_once(&self.state);
    }
    downstream
  }
}
