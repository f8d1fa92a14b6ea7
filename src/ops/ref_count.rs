//! Connect/disconnect driven by the live downstream observer count.
//!
//! Wraps a [`ConnectableObservable`] so it behaves like an ordinary
//! observable: the upstream is connected when the observer count first
//! reaches the threshold and disconnected (immediately, or after a grace
//! delay on a scheduler) when it drops back below. A single lock covers the
//! count, the connection handle, the pending-disconnect handle and an epoch
//! counter, so a disconnect timer racing a fresh subscribe resolves
//! deterministically: whichever takes the lock first wins, and a fired timer
//! re-checks both epoch and count before touching the connection.

use crate::observable::{ConnectableObservable, ConnectionHandle, Observable};
use crate::observer::Observer;
use crate::scheduler::{default_scheduler, Scheduler, TaskHandle};
use crate::subscription::Subscription;
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tracing::trace;

enum DisconnectPolicy {
  Eager,
  Lazy {
    delay: Duration,
    scheduler: Arc<dyn Scheduler + Send + Sync>,
  },
}

/// A connectable observable that manages its own connection.
pub struct RefCountObservable<S, Sub> {
  state: Arc<RefCountState<S, Sub>>,
}

impl<S, Sub> Clone for RefCountObservable<S, Sub> {
  fn clone(&self) -> Self { RefCountObservable { state: self.state.clone() } }
}

struct RefCountState<S, Sub> {
  connectable: ConnectableObservable<S, Sub>,
  min_observers: usize,
  policy: DisconnectPolicy,
  inner: Mutex<RefCountInner<S, Sub>>,
}

struct RefCountInner<S, Sub> {
  observers: usize,
  connection: Option<ConnectionHandle<S, Sub>>,
  pending_disconnect: Option<TaskHandle>,
  epoch: u64,
}

impl<S, Sub> Drop for RefCountState<S, Sub> {
  fn drop(&mut self) {
    // No scheduled disconnect may outlive the operator itself.
    if let Some(mut pending) = self.inner.get_mut().pending_disconnect.take() {
      pending.unsubscribe();
    }
  }
}

impl<S, Sub> ConnectableObservable<S, Sub> {
  /// Connect while at least one observer is subscribed; disconnect
  /// synchronously when the last leaves.
  pub fn ref_count(self) -> RefCountObservable<S, Sub> {
    RefCountObservable::new(self, 1, DisconnectPolicy::Eager)
  }

  /// Connect once `min_observers` are subscribed; disconnect synchronously
  /// when the count drops below.
  pub fn ref_count_min(self, min_observers: usize) -> RefCountObservable<S, Sub> {
    assert!(min_observers >= 1, "ref_count requires at least one observer");
    RefCountObservable::new(self, min_observers, DisconnectPolicy::Eager)
  }

  /// Like [`ref_count_min`](Self::ref_count_min), but the disconnect is
  /// scheduled after `disconnect_delay` on the process default scheduler; a
  /// subscriber arriving within the grace period keeps the upstream
  /// subscription alive.
  pub fn ref_count_lazy(
    self,
    min_observers: usize,
    disconnect_delay: Duration,
  ) -> RefCountObservable<S, Sub> {
    self.ref_count_lazy_with(min_observers, disconnect_delay, default_scheduler())
  }

  /// Grace-delay disconnect on an explicit scheduler.
  pub fn ref_count_lazy_with(
    self,
    min_observers: usize,
    disconnect_delay: Duration,
    scheduler: impl Scheduler + Send + Sync + 'static,
  ) -> RefCountObservable<S, Sub> {
    assert!(min_observers >= 1, "ref_count requires at least one observer");
    RefCountObservable::new(
      self,
      min_observers,
      DisconnectPolicy::Lazy { delay: disconnect_delay, scheduler: Arc::new(scheduler) },
    )
  }
}

impl<S, Sub> RefCountObservable<S, Sub> {
  fn new(
    connectable: ConnectableObservable<S, Sub>,
    min_observers: usize,
    policy: DisconnectPolicy,
  ) -> Self {
    RefCountObservable {
      state: Arc::new(RefCountState {
        connectable,
        min_observers,
        policy,
        inner: Mutex::new(RefCountInner {
          observers: 0,
          connection: None,
          pending_disconnect: None,
          epoch: 0,
        }),
      }),
    }
  }
}

/// Connect if the threshold is met and no connection exists. Re-evaluates
/// after losing a race, so a subscribe arriving while a disconnect is
/// mid-flight still ends up connected.
fn ensure_connected<S, Sub>(state: &Arc<RefCountState<S, Sub>>)
where
  S: Observable + Clone,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Clone + Send + 'static,
{
  loop {
    {
      let inner = state.inner.lock();
      if inner.observers < state.min_observers || inner.connection.is_some() {
        return;
      }
    }
    let handle = state.connectable.connect();
    if !handle.owns_connection() {
      // A still-live connection belongs to a disconnect in flight; that
      // disconnector re-runs this check after it finishes.
      return;
    }
    trace!("refcount connected upstream");
    let mut inner = state.inner.lock();
    if inner.connection.is_none() && inner.observers >= state.min_observers {
      inner.connection = Some(handle);
      return;
    }
    // The count dropped while connecting; undo and re-evaluate.
    drop(inner);
    let mut handle = handle;
    handle.unsubscribe();
  }
}

fn disconnect_below_threshold<S, Sub>(state: &Arc<RefCountState<S, Sub>>)
where
  S: Observable + Clone + Send + 'static,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Clone + Send + Sync + 'static,
{
  let mut inner = state.inner.lock();
  if inner.observers >= state.min_observers || inner.connection.is_none() {
    return;
  }
  match &state.policy {
    DisconnectPolicy::Eager => {
      let connection = inner.connection.take();
      drop(inner);
      if let Some(mut connection) = connection {
        trace!("refcount disconnecting upstream");
        connection.unsubscribe();
      }
      ensure_connected(state);
    }
    DisconnectPolicy::Lazy { delay, scheduler } => {
      inner.epoch += 1;
      let epoch = inner.epoch;
      if let Some(mut stale) = inner.pending_disconnect.take() {
        stale.unsubscribe();
      }
      let task_state = state.clone();
      let task = Box::new(move || {
        let connection = {
          let mut inner = task_state.inner.lock();
          if inner.epoch != epoch || inner.observers >= task_state.min_observers {
            return;
          }
          inner.pending_disconnect = None;
          inner.connection.take()
        };
        if let Some(mut connection) = connection {
          trace!("refcount grace period elapsed, disconnecting upstream");
          connection.unsubscribe();
        }
        ensure_connected(&task_state);
      });
      trace!(delay_ms = delay.as_millis() as u64, "refcount scheduling lazy disconnect");
      inner.pending_disconnect = Some(scheduler.schedule_after(*delay, task));
    }
  }
}

impl<S, Sub> Observable for RefCountObservable<S, Sub>
where
  S: Observable + Clone + Send + 'static,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Observable + Clone + Send + Sync + 'static,
{
  type Item = <Sub as Observable>::Item;
  type Err = <Sub as Observable>::Err;
  type Unsub = RefCountSubscription<S, Sub, <Sub as Observable>::Unsub>;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Self::Item, Err = Self::Err> + Send + 'static,
  {
    let state = self.state;
    let downstream = state.connectable.fork().actual_subscribe(observer);
    {
      let mut inner = state.inner.lock();
      inner.observers += 1;
      inner.epoch += 1;
      if let Some(mut pending) = inner.pending_disconnect.take() {
        trace!("refcount resubscribed within grace period, keeping upstream");
        pending.unsubscribe();
      }
    }
    ensure_connected(&state);
    RefCountSubscription { state, downstream: Some(downstream) }
  }
}

/// Downstream handle of a [`RefCountObservable`]; disposing it decrements
/// the observer count and applies the disconnect policy.
pub struct RefCountSubscription<S, Sub, U> {
  state: Arc<RefCountState<S, Sub>>,
  downstream: Option<U>,
}

impl<S, Sub, U> Subscription for RefCountSubscription<S, Sub, U>
where
  S: Observable + Clone + Send + 'static,
  S::Unsub: Send + 'static,
  Sub: Observer<Item = S::Item, Err = S::Err> + Clone + Send + Sync + 'static,
  U: Subscription,
{
  fn unsubscribe(&mut self) {
    if let Some(mut downstream) = self.downstream.take() {
      downstream.unsubscribe();
      {
        let mut inner = self.state.inner.lock();
        inner.observers -= 1;
      }
      disconnect_below_threshold(&self.state);
    }
  }

  fn is_closed(&self) -> bool { self.downstream.is_none() }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::SubscribeExt;
  use crate::scheduler::TestScheduler;
  use crate::subject::Subject;
  use crate::subscription::{PairedSubscription, Teardown};
  use std::sync::atomic::{AtomicUsize, Ordering};
  use std::sync::{Arc, Mutex};

  #[derive(Clone)]
  struct ProbeSource {
    relay: Subject<i32, ()>,
    subscribed: Arc<AtomicUsize>,
    live: Arc<AtomicUsize>,
  }

  impl ProbeSource {
    fn new() -> Self {
      ProbeSource {
        relay: Subject::new(),
        subscribed: Arc::new(AtomicUsize::new(0)),
        live: Arc::new(AtomicUsize::new(0)),
      }
    }
  }

  impl Observable for ProbeSource {
    type Item = i32;
    type Err = ();
    type Unsub =
      PairedSubscription<crate::subject::SubjectSubscription<i32, ()>, Teardown>;

    fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
    where
      O: Observer<Item = i32, Err = ()> + Send + 'static,
    {
      self.subscribed.fetch_add(1, Ordering::SeqCst);
      self.live.fetch_add(1, Ordering::SeqCst);
      let live = self.live.clone();
      PairedSubscription::new(
        self.relay.clone().actual_subscribe(observer),
        Teardown::new(move || {
          live.fetch_sub(1, Ordering::SeqCst);
        }),
      )
    }
  }

  #[test]
  fn eager_connects_on_first_and_disconnects_on_last() {
    let probe = ProbeSource::new();
    let shared = ConnectableObservable::new(probe.clone(), Subject::new()).ref_count();

    let mut first = shared.clone().subscribe(|_| {});
    assert_eq!(probe.live.load(Ordering::SeqCst), 1);

    let mut second = shared.clone().subscribe(|_| {});
    assert_eq!(probe.subscribed.load(Ordering::SeqCst), 1);

    first.unsubscribe();
    assert_eq!(probe.live.load(Ordering::SeqCst), 1);
    second.unsubscribe();
    assert_eq!(probe.live.load(Ordering::SeqCst), 0);

    // A fresh subscriber re-connects with a new upstream subscription.
    let _third = shared.clone().subscribe(|_| {});
    assert_eq!(probe.subscribed.load(Ordering::SeqCst), 2);
    assert_eq!(probe.live.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn threshold_defers_the_connect() {
    let probe = ProbeSource::new();
    let shared = ConnectableObservable::new(probe.clone(), Subject::new()).ref_count_min(2);

    let _first = shared.clone().subscribe(|_| {});
    assert_eq!(probe.live.load(Ordering::SeqCst), 0);

    let _second = shared.clone().subscribe(|_| {});
    assert_eq!(probe.live.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn values_flow_through_the_shared_relay() {
    let probe = ProbeSource::new();
    let shared = ConnectableObservable::new(probe.clone(), Subject::new()).ref_count();

    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let _sub = shared.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));

    probe.relay.clone().next(5);
    assert_eq!(*seen.lock().unwrap(), vec![5]);
  }

  #[test]
  fn lazy_disconnect_waits_for_the_grace_period() {
    let probe = ProbeSource::new();
    let scheduler = TestScheduler::new();
    let shared = ConnectableObservable::new(probe.clone(), Subject::new()).ref_count_lazy_with(
      1,
      Duration::from_millis(500),
      scheduler.clone(),
    );

    let mut sub = shared.clone().subscribe(|_| {});
    assert_eq!(probe.live.load(Ordering::SeqCst), 1);

    sub.unsubscribe();
    // Still connected through the grace period.
    assert_eq!(probe.live.load(Ordering::SeqCst), 1);

    scheduler.advance(Duration::from_millis(100));
    // A subscriber arriving before the timer fires cancels the disconnect.
    let _second = shared.clone().subscribe(|_| {});
    scheduler.advance(Duration::from_millis(1000));

    assert_eq!(probe.live.load(Ordering::SeqCst), 1);
    assert_eq!(probe.subscribed.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn lazy_disconnect_fires_when_nobody_returns() {
    let probe = ProbeSource::new();
    let scheduler = TestScheduler::new();
    let shared = ConnectableObservable::new(probe.clone(), Subject::new()).ref_count_lazy_with(
      1,
      Duration::from_millis(500),
      scheduler.clone(),
    );

    let mut sub = shared.clone().subscribe(|_| {});
    sub.unsubscribe();
    scheduler.advance(Duration::from_millis(1000));

    assert_eq!(probe.live.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn dropping_the_operator_cancels_the_pending_disconnect() {
    let probe = ProbeSource::new();
    let scheduler = TestScheduler::new();
    {
      let shared = ConnectableObservable::new(probe.clone(), Subject::new())
        .ref_count_lazy_with(1, Duration::from_millis(500), scheduler.clone());
      let mut sub = shared.clone().subscribe(|_| {});
      sub.unsubscribe();
    }
    // The operator state is gone; advancing must not panic or disconnect
    // through a dead handle.
    scheduler.advance(Duration::from_millis(1000));
  }
}
