use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Teardown;
use std::marker::PhantomData;

/// An observable emitting every item of an iterator, then completing.
///
/// Emission is synchronous inside `actual_subscribe`; the observer's
/// `is_closed` is consulted between items so a downstream that has seen
/// enough can stop the drain early.
pub struct ObservableFromIter<I, Err> {
  iter: I,
  _hint: PhantomData<fn(Err)>,
}

pub fn from_iter<I, Err>(iter: I) -> ObservableFromIter<I, Err>
where
  I: IntoIterator,
{
  ObservableFromIter { iter, _hint: PhantomData }
}

impl<I: Clone, Err> Clone for ObservableFromIter<I, Err> {
  fn clone(&self) -> Self { ObservableFromIter { iter: self.iter.clone(), _hint: PhantomData } }
}

impl<I, Err> Observable for ObservableFromIter<I, Err>
where
  I: IntoIterator,
{
  type Item = I::Item;
  type Err = Err;
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item = Self::Item, Err = Err> + Send + 'static,
  {
    for value in self.iter {
      if observer.is_closed() {
        return Teardown::closed();
      }
      observer.next(value);
    }
    observer.complete();
    Teardown::closed()
  }
}
