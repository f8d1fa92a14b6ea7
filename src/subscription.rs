//! Disposable handles for active registrations.
//!
//! A [`Subscription`] is the token returned from subscribing an observer (or
//! connecting a shared upstream). Disposing one is idempotent: under
//! concurrent callers exactly one performs the release. The two structural
//! composition patterns are [`SharedSubscription`] (a group disposed
//! together) and [`SerialSubscription`] (a single slot whose held handle can
//! be replaced).

use parking_lot::Mutex;
use smallvec::SmallVec;
use std::sync::Arc;

/// Handle that deregisters a stream before it has finished receiving all
/// events, and releases the resources held by the registration.
pub trait Subscription {
  /// Stop further delivery and release resources. Idempotent; safe to call
  /// from any thread, including from inside a notification callback.
  fn unsubscribe(&mut self);

  fn is_closed(&self) -> bool;
}

/// Type-erased subscription for heterogeneous storage.
pub type BoxSubscription = Box<dyn Subscription + Send>;

impl<S: Subscription + ?Sized> Subscription for Box<S> {
  #[inline]
  fn unsubscribe(&mut self) { (**self).unsubscribe() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// A single-fire release callback.
///
/// Clones share one slot, so a `Teardown` raced from several threads still
/// runs its callback exactly once.
#[derive(Clone)]
pub struct Teardown {
  release: Arc<Mutex<Option<Box<dyn FnOnce() + Send>>>>,
}

impl Teardown {
  pub fn new(release: impl FnOnce() + Send + 'static) -> Self {
    Teardown { release: Arc::new(Mutex::new(Some(Box::new(release)))) }
  }

  /// A handle that was never backed by a resource; already closed.
  pub fn closed() -> Self { Teardown { release: Arc::new(Mutex::new(None)) } }
}

impl Subscription for Teardown {
  fn unsubscribe(&mut self) {
    let release = self.release.lock().take();
    if let Some(release) = release {
      release();
    }
  }

  fn is_closed(&self) -> bool { self.release.lock().is_none() }
}

/// A group of subscriptions disposed together.
///
/// Adding to an already-disposed group disposes the incoming handle
/// immediately instead of storing it.
#[derive(Clone, Default)]
pub struct SharedSubscription(Arc<Mutex<CompositeInner>>);

#[derive(Default)]
struct CompositeInner {
  closed: bool,
  teardown: SmallVec<[BoxSubscription; 2]>,
}

impl SharedSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn add<S: Subscription + Send + 'static>(&self, subscription: S) {
    let mut subscription: BoxSubscription = Box::new(subscription);
    let mut inner = self.0.lock();
    if inner.closed {
      drop(inner);
      subscription.unsubscribe();
    } else {
      inner.teardown.retain(|s| !s.is_closed());
      inner.teardown.push(subscription);
    }
  }

  pub fn teardown_size(&self) -> usize { self.0.lock().teardown.len() }
}

impl Subscription for SharedSubscription {
  fn unsubscribe(&mut self) {
    // Members are released outside the lock so a member's teardown may
    // touch this group again without deadlocking.
    let drained = {
      let mut inner = self.0.lock();
      if inner.closed {
        return;
      }
      inner.closed = true;
      std::mem::take(&mut inner.teardown)
    };
    for mut subscription in drained {
      subscription.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.lock().closed }
}

/// A slot holding at most one inner subscription.
///
/// Swapping in a new handle disposes the previously held one; swapping into
/// a disposed slot disposes the incoming handle instead of storing it.
#[derive(Clone, Default)]
pub struct SerialSubscription(Arc<Mutex<SerialInner>>);

#[derive(Default)]
struct SerialInner {
  closed: bool,
  current: Option<BoxSubscription>,
}

impl SerialSubscription {
  pub fn new() -> Self { Self::default() }

  pub fn swap<S: Subscription + Send + 'static>(&self, subscription: S) {
    let incoming: BoxSubscription = Box::new(subscription);
    let outgoing = {
      let mut inner = self.0.lock();
      if inner.closed {
        Some(incoming)
      } else {
        inner.current.replace(incoming)
      }
    };
    if let Some(mut outgoing) = outgoing {
      outgoing.unsubscribe();
    }
  }
}

impl Subscription for SerialSubscription {
  fn unsubscribe(&mut self) {
    let current = {
      let mut inner = self.0.lock();
      if inner.closed {
        return;
      }
      inner.closed = true;
      inner.current.take()
    };
    if let Some(mut current) = current {
      current.unsubscribe();
    }
  }

  fn is_closed(&self) -> bool { self.0.lock().closed }
}

/// Two handles disposed together, e.g. a downstream subscription paired with
/// the connection handle that feeds it.
pub struct PairedSubscription<A, B> {
  first: A,
  second: B,
}

impl<A, B> PairedSubscription<A, B> {
  #[inline]
  pub fn new(first: A, second: B) -> Self { PairedSubscription { first, second } }
}

impl<A, B> Subscription for PairedSubscription<A, B>
where
  A: Subscription,
  B: Subscription,
{
  fn unsubscribe(&mut self) {
    self.first.unsubscribe();
    self.second.unsubscribe();
  }

  fn is_closed(&self) -> bool { self.first.is_closed() && self.second.is_closed() }
}

#[cfg(test)]
mod test {
  use super::*;
  use std::sync::atomic::{AtomicUsize, Ordering};

  #[test]
  fn teardown_fires_once() {
    let fired = Arc::new(AtomicUsize::new(0));
    let c_fired = fired.clone();
    let mut teardown = Teardown::new(move || {
      c_fired.fetch_add(1, Ordering::SeqCst);
    });
    assert!(!teardown.is_closed());
    teardown.unsubscribe();
    teardown.unsubscribe();
    assert!(teardown.is_closed());
    assert_eq!(fired.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn teardown_fires_once_under_race() {
    for _ in 0..64 {
      let fired = Arc::new(AtomicUsize::new(0));
      let c_fired = fired.clone();
      let teardown = Teardown::new(move || {
        c_fired.fetch_add(1, Ordering::SeqCst);
      });
      let handles: Vec<_> = (0..4)
        .map(|_| {
          let mut teardown = teardown.clone();
          std::thread::spawn(move || teardown.unsubscribe())
        })
        .collect();
      for h in handles {
        h.join().unwrap();
      }
      assert_eq!(fired.load(Ordering::SeqCst), 1);
    }
  }

  #[test]
  fn composite_disposes_members() {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut group = SharedSubscription::new();
    for _ in 0..3 {
      let c_fired = fired.clone();
      group.add(Teardown::new(move || {
        c_fired.fetch_add(1, Ordering::SeqCst);
      }));
    }
    assert_eq!(group.teardown_size(), 3);
    group.unsubscribe();
    assert_eq!(fired.load(Ordering::SeqCst), 3);
  }

  #[test]
  fn composite_add_after_close_disposes_immediately() {
    let mut group = SharedSubscription::new();
    group.unsubscribe();

    let fired = Arc::new(AtomicUsize::new(0));
    let c_fired = fired.clone();
    group.add(Teardown::new(move || {
      c_fired.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
    assert_eq!(group.teardown_size(), 0);
  }

  #[test]
  fn serial_swap_disposes_previous() {
    let first = Arc::new(AtomicUsize::new(0));
    let second = Arc::new(AtomicUsize::new(0));
    let slot = SerialSubscription::new();

    let c_first = first.clone();
    slot.swap(Teardown::new(move || {
      c_first.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(first.load(Ordering::SeqCst), 0);

    let c_second = second.clone();
    slot.swap(Teardown::new(move || {
      c_second.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(first.load(Ordering::SeqCst), 1);
    assert_eq!(second.load(Ordering::SeqCst), 0);
  }

  #[test]
  fn serial_swap_into_closed_slot_disposes_incoming() {
    let fired = Arc::new(AtomicUsize::new(0));
    let mut slot = SerialSubscription::new();
    slot.unsubscribe();

    let c_fired = fired.clone();
    slot.swap(Teardown::new(move || {
      c_fired.fetch_add(1, Ordering::SeqCst);
    }));
    assert_eq!(fired.load(Ordering::SeqCst), 1);
  }

  #[test]
  fn paired_disposes_both() {
    let fired = Arc::new(AtomicUsize::new(0));
    let a = fired.clone();
    let b = fired.clone();
    let mut pair = PairedSubscription::new(
      Teardown::new(move || {
        a.fetch_add(1, Ordering::SeqCst);
      }),
      Teardown::new(move || {
        b.fetch_add(1, Ordering::SeqCst);
      }),
    );
    assert!(!pair.is_closed());
    pair.unsubscribe();
    assert!(pair.is_closed());
    assert_eq!(fired.load(Ordering::SeqCst), 2);
  }
}
