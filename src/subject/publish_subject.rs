use super::core::{Buffering, Hub, SubjectSubscription};
use crate::observable::Observable;
use crate::observer::Observer;
use std::sync::Arc;

/// A plain relay: values pushed in are multicast to every currently
/// registered observer; late subscribers see only future values.
///
/// `Subject` is both an [`Observer`] (producers push into it, from any
/// thread) and an [`Observable`] (downstream registers with it). Concurrent
/// pushes are serialized, so every observer sees the same FIFO order. A
/// terminal event is remembered and delivered exactly once to every current
/// and every later subscriber.
///
/// Pushing into a subject from inside one of its own callbacks is not
/// supported.
///
/// # Example
///
/// ```rust
/// use rxcast::prelude::*;
/// use std::sync::{Arc, Mutex};
///
/// let subject = Subject::new();
/// let seen = Arc::new(Mutex::new(vec![]));
///
/// let c_seen = seen.clone();
/// subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));
///
/// let mut producer = subject.clone();
/// producer.next(1);
/// producer.next(2);
/// assert_eq!(*seen.lock().unwrap(), vec![1, 2]);
/// # let _: Subject<i32, ()> = subject;
/// ```
pub struct Subject<Item, Err> {
  pub(crate) hub: Arc<Hub<Item, Err>>,
}

impl<Item, Err> Subject<Item, Err> {
  pub fn new() -> Self { Subject { hub: Arc::new(Hub::new(Buffering::None)) } }

  /// Number of currently registered observers.
  pub fn subscriber_count(&self) -> usize { self.hub.subscriber_count() }

  pub fn is_empty(&self) -> bool { self.subscriber_count() == 0 }

  /// Whether a terminal event has been delivered.
  pub fn is_terminated(&self) -> bool { self.hub.is_terminated() }
}

impl<Item, Err> Clone for Subject<Item, Err> {
  fn clone(&self) -> Self { Subject { hub: self.hub.clone() } }
}

impl<Item, Err> Default for Subject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone, Err: Clone> Observer for Subject<Item, Err> {
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

impl<Item, Err> Observable for Subject<Item, Err>
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
