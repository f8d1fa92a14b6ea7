use super::core::{Buffering, Hub, SubjectSubscription};
use crate::observable::Observable;
use crate::observer::Observer;
use std::sync::Arc;

/// A relay caching at most the final value of its stream.
///
/// Nothing is broadcast while the stream is live; on completion the last
/// value pushed (if any) is delivered to every subscriber, followed by the
/// completion itself. Subscribers arriving after completion receive the same
/// pair. An error delivers no value.
pub struct LastSubject<Item, Err> {
  hub: Arc<Hub<Item, Err>>,
}

impl<Item, Err> LastSubject<Item, Err> {
  pub fn new() -> Self { LastSubject { hub: Arc::new(Hub::new(Buffering::Last(None))) } }

  pub fn subscriber_count(&self) -> usize { self.hub.subscriber_count() }

  pub fn is_terminated(&self) -> bool { self.hub.is_terminated() }
}

impl<Item, Err> Clone for LastSubject<Item, Err> {
  fn clone(&self) -> Self { LastSubject { hub: self.hub.clone() } }
}

impl<Item, Err> Default for LastSubject<Item, Err> {
  fn default() -> Self { Self::new() }
}

impl<Item: Clone, Err: Clone> Observer for LastSubject<Item, Err> {
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

impl<Item, Err> Observable for LastSubject<Item, Err>
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

#[cfg(test)]
mod test {
  use super::*;
  use crate::observable::SubscribeExt;
  use std::sync::{Arc, Mutex};

  #[test]
  fn delivers_final_value_only_on_completion() {
    let subject = LastSubject::<_, ()>::new();
    let seen = Arc::new(Mutex::new(vec![]));

    let c_seen = seen.clone();
    subject.clone().subscribe(move |v| c_seen.lock().unwrap().push(v));

    subject.clone().next(1);
    subject.clone().next(2);
    assert!(seen.lock().unwrap().is_empty());

    subject.clone().complete();
    assert_eq!(*seen.lock().unwrap(), vec![2]);
  }

  #[test]
  fn late_subscriber_after_completion_gets_the_value() {
    let subject = LastSubject::<_, ()>::new();
    subject.clone().next(9);
    subject.clone().complete();

    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));
    let c_seen = seen.clone();
    let c_completed = completed.clone();
    subject.clone().subscribe_all(
      move |v| c_seen.lock().unwrap().push(v),
      |_| {},
      move || *c_completed.lock().unwrap() = true,
    );

    assert_eq!(*seen.lock().unwrap(), vec![9]);
    assert!(*completed.lock().unwrap());
  }

  #[test]
  fn error_delivers_no_value() {
    let subject = LastSubject::<i32, &'static str>::new();
    subject.clone().next(5);

    let seen = Arc::new(Mutex::new(vec![]));
    let errors = Arc::new(Mutex::new(vec![]));
    let c_seen = seen.clone();
    let c_errors = errors.clone();
    subject.clone().subscribe_err(
      move |v| c_seen.lock().unwrap().push(v),
      move |e| c_errors.lock().unwrap().push(e),
    );

    subject.clone().error("boom");

    assert!(seen.lock().unwrap().is_empty());
    assert_eq!(*errors.lock().unwrap(), vec!["boom"]);
  }

  #[test]
  fn empty_completion_delivers_no_value() {
    let subject = LastSubject::<i32, ()>::new();
    let seen = Arc::new(Mutex::new(vec![]));
    let completed = Arc::new(Mutex::new(false));

    let c_seen = seen.clone();
    let c_completed = completed.clone();
    subject.clone().subscribe_all(
      move |v| c_seen.lock().unwrap().push(v),
      |_| {},
      move || *c_completed.lock().unwrap() = true,
    );

    subject.clone().complete();
    assert!(seen.lock().unwrap().is_empty());
    assert!(*completed.lock().unwrap());
  }
}
