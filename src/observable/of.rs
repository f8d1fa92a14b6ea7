use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Teardown;
use std::marker::PhantomData;

/// An observable emitting a single value, then completing.
pub struct ObservableOf<Item, Err> {
  value: Item,
  _hint: PhantomData<fn(Err)>,
}

pub fn of<Item, Err>(value: Item) -> ObservableOf<Item, Err> {
  ObservableOf { value, _hint: PhantomData }
}

impl<Item: Clone, Err> Clone for ObservableOf<Item, Err> {
  fn clone(&self) -> Self { ObservableOf { value: self.value.clone(), _hint: PhantomData } }
}

impl<Item, Err> Observable for ObservableOf<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item = Item, Err = Err> + Send + 'static,
  {
    observer.next(self.value);
    observer.complete();
    Teardown::closed()
  }
}
