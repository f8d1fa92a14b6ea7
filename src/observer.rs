//! Observer trait and closure adapters.
//!
//! An `Observer` consumes the three notification kinds of a stream: `next`
//! for values, `error` and `complete` for the two terminal events. The
//! contract every producer in this crate upholds: notifications to a single
//! observer are serialized, at most one terminal event is ever delivered, and
//! nothing follows a terminal event.

use std::marker::PhantomData;

/// The consumer side of a push stream.
pub trait Observer {
  type Item;
  type Err;

  /// Receive the next value.
  fn next(&mut self, value: Self::Item);

  /// Receive the terminal error.
  fn error(&mut self, err: Self::Err);

  /// Receive the terminal completion.
  fn complete(&mut self);

  /// Sources may stop emitting early once this returns `true`.
  fn is_closed(&self) -> bool { false }
}

/// Observers are boxed with this alias for storage in relays and bridges.
pub type BoxObserver<Item, Err> = Box<dyn Observer<Item = Item, Err = Err> + Send>;

impl<O: Observer + ?Sized> Observer for Box<O> {
  type Item = O::Item;
  type Err = O::Err;

  #[inline]
  fn next(&mut self, value: Self::Item) { (**self).next(value) }

  #[inline]
  fn error(&mut self, err: Self::Err) { (**self).error(err) }

  #[inline]
  fn complete(&mut self) { (**self).complete() }

  #[inline]
  fn is_closed(&self) -> bool { (**self).is_closed() }
}

/// Adapter turning a closure triple into an observer.
///
/// Enforces the at-most-one-terminal half of the observer contract on behalf
/// of the closures.
pub struct ObserverAll<N, E, C, Item, Err> {
  next: N,
  error: E,
  complete: C,
  stopped: bool,
  _hint: PhantomData<fn(Item, Err)>,
}

impl<N, E, C, Item, Err> ObserverAll<N, E, C, Item, Err> {
  #[inline]
  pub fn new(next: N, error: E, complete: C) -> Self {
    ObserverAll { next, error, complete, stopped: false, _hint: PhantomData }
  }
}

impl<N, E, C, Item, Err> Observer for ObserverAll<N, E, C, Item, Err>
where
  N: FnMut(Item),
  E: FnMut(Err),
  C: FnMut(),
{
  type Item = Item;
  type Err = Err;

  fn next(&mut self, value: Item) {
    if !self.stopped {
      (self.next)(value);
    }
  }

  fn error(&mut self, err: Err) {
    if !self.stopped {
      self.stopped = true;
      (self.error)(err);
    }
  }

  fn complete(&mut self) {
    if !self.stopped {
      self.stopped = true;
      (self.complete)();
    }
  }

  fn is_closed(&self) -> bool { self.stopped }
}
