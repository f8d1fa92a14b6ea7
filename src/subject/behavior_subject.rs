use super::core::{Buffering, Hub, SubjectSubscription};
use crate::observable::Observable;
use crate::observer::Observer;
use std::sync::Arc;

/// A relay holding exactly one current value, seeded with an initial value.
///
/// New subscribers immediately receive the current value, then future ones.
/// Once the subject has terminated, subscribers receive only the terminal
/// event.
pub struct BehaviorSubject<Item, Err> {
  hub: Arc<Hub<Item, Err>>,
}

impl<Item, Err> BehaviorSubject<Item, Err> {
  pub fn new(initial: Item) -> Self {
    BehaviorSubject { hub: Arc::new(Hub::new(Buffering::Current(initial))) }
  }

  pub fn subscriber_count(&self) -> usize { self.hub.subscriber_count() }

  pub fn is_terminated(&self) -> bool { self.hub.is_terminated() }
}

impl<Item, Err> Clone for BehaviorSubject<Item, Err> {
  fn clone(&self) -> Self { BehaviorSubject { hub: self.hub.clone() } }
}

impl<Item: Clone, Err: Clone> Observer for BehaviorSubject<Item, Err> {
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

impl<Item, Err> Observable for BehaviorSubject<Item, Err>
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
