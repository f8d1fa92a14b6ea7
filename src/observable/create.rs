use crate::observable::Observable;
use crate::observer::{BoxObserver, Observer};
use crate::subscription::Teardown;
use parking_lot::Mutex;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// An observable driven by a subscribe function.
///
/// The function receives an owned [`Feeder`], a clonable, `Send` handle to
/// the downstream observer, so it may emit synchronously or hand the feeder
/// to a spawned thread.
///
/// # Example
///
/// ```rust
/// use rxcast::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let source = create(|mut feeder: Feeder<i32, ()>| {
///   feeder.next(1);
///   feeder.next(2);
///   feeder.complete();
/// });
///
/// let seen = Arc::new(Mutex::new(vec![]));
/// let c_seen = seen.clone();
/// source.subscribe(move |v| c_seen.lock().unwrap().push(v));
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// ```
pub struct Create<F, Item, Err> {
  subscribe: F,
  _hint: PhantomData<fn(Item, Err)>,
}

pub fn create<F, Item, Err>(subscribe: F) -> Create<F, Item, Err>
where
  F: FnOnce(Feeder<Item, Err>),
{
  Create { subscribe, _hint: PhantomData }
}

impl<F: Clone, Item, Err> Clone for Create<F, Item, Err> {
  fn clone(&self) -> Self { Create { subscribe: self.subscribe.clone(), _hint: PhantomData } }
}

struct FeederShared<Item, Err> {
  observer: Mutex<Option<BoxObserver<Item, Err>>>,
  disposed: AtomicBool,
}

/// Producer-side handle of a [`Create`] observable.
///
/// Notifications must not be issued concurrently (the observer contract);
/// the feeder serializes nothing itself.
pub struct Feeder<Item, Err> {
  shared: Arc<FeederShared<Item, Err>>,
}

impl<Item, Err> Clone for Feeder<Item, Err> {
  fn clone(&self) -> Self { Feeder { shared: self.shared.clone() } }
}

impl<Item, Err> Feeder<Item, Err> {
  pub fn is_stopped(&self) -> bool {
    self.shared.disposed.load(Ordering::Acquire) || self.shared.observer.lock().is_none()
  }
}

impl<Item, Err> Observer for Feeder<Item, Err> {
  type Item = Item;
  type Err = Err;

  fn next(&mut self, value: Item) {
    // Deliver outside the slot lock so the observer may dispose its own
    // subscription mid-callback; the slot is re-filled afterwards unless the
    // subscription went away.
    let observer = self.shared.observer.lock().take();
    if let Some(mut observer) = observer {
      observer.next(value);
      if !self.shared.disposed.load(Ordering::Acquire) {
        *self.shared.observer.lock() = Some(observer);
      }
    }
  }

  fn error(&mut self, err: Err) {
    self.shared.disposed.store(true, Ordering::Release);
    let observer = self.shared.observer.lock().take();
    if let Some(mut observer) = observer {
      observer.error(err);
    }
  }

  fn complete(&mut self) {
    self.shared.disposed.store(true, Ordering::Release);
    let observer = self.shared.observer.lock().take();
    if let Some(mut observer) = observer {
      observer.complete();
    }
  }

  fn is_closed(&self) -> bool { self.is_stopped() }
}

impl<F, Item, Err> Observable for Create<F, Item, Err>
where
  F: FnOnce(Feeder<Item, Err>),
  Item: 'static,
  Err: 'static,
{
  type Item = Item;
  type Err = Err;
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Item, Err = Err> + Send + 'static,
  {
    let shared = Arc::new(FeederShared {
      observer: Mutex::new(Some(Box::new(observer) as BoxObserver<Item, Err>)),
      disposed: AtomicBool::new(false),
    });
    let teardown = {
      let shared = shared.clone();
      Teardown::new(move || {
        shared.disposed.store(true, Ordering::Release);
        shared.observer.lock().take();
      })
    };
    (self.subscribe)(Feeder { shared });
    teardown
  }
}

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::SubscribeExt;
  use crate::subscription::Subscription;
  use std::sync::{Arc, Mutex};

  #[test]
  fn emits_from_a_spawned_thread() {
    let source = create(|mut feeder: Feeder<i32, ()>| {
      std::thread::spawn(move || {
        feeder.next(1);
        feeder.next(2);
        feeder.complete();
      });
    });

    let seen = Arc::new(Mutex::new(vec![]));
    let done = Arc::new(Mutex::new(false));
    let c_seen = seen.clone();
    let c_done = done.clone();
    source.subscribe_all(
      move |v| c_seen.lock().unwrap().push(v),
      |_| {},
      move || *c_done.lock().unwrap() = true,
    );

    while !*done.lock().unwrap() {
      std::thread::yield_now();
    }
    assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
  }

  #[test]
  fn unsubscribe_stops_delivery() {
    let feeder_slot: Arc<Mutex<Option<Feeder<i32, ()>>>> = Arc::new(Mutex::new(None));
    let c_slot = feeder_slot.clone();
    let source = create(move |feeder: Feeder<i32, ()>| {
      *c_slot.lock().unwrap() = Some(feeder);
    });

    let seen = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let mut sub = source.subscribe(move |v| c_seen.lock().unwrap().push(v));

    let mut feeder = feeder_slot.lock().unwrap().take().unwrap();
    feeder.next(1);
    sub.unsubscribe();
    feeder.next(2);

    assert_eq!(*seen.lock().unwrap(), vec![1]);
    assert!(feeder.is_stopped());
  }
}
