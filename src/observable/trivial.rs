use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Teardown;
use std::marker::PhantomData;

/// Completes immediately without emitting.
pub struct ObservableEmpty<Item, Err>(PhantomData<fn(Item, Err)>);

pub fn empty<Item, Err>() -> ObservableEmpty<Item, Err> { ObservableEmpty(PhantomData) }

impl<Item, Err> Clone for ObservableEmpty<Item, Err> {
  fn clone(&self) -> Self { ObservableEmpty(PhantomData) }
}

impl<Item, Err> Observable for ObservableEmpty<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item = Item, Err = Err> + Send + 'static,
  {
    observer.complete();
    Teardown::closed()
  }
}

/// Never emits and never terminates.
pub struct ObservableNever<Item, Err>(PhantomData<fn(Item, Err)>);

pub fn never<Item, Err>() -> ObservableNever<Item, Err> { ObservableNever(PhantomData) }

impl<Item, Err> Clone for ObservableNever<Item, Err> {
  fn clone(&self) -> Self { ObservableNever(PhantomData) }
}

impl<Item, Err> Observable for ObservableNever<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, observer: O) -> Self::Unsub
  where
    O: Observer<Item = Item, Err = Err> + Send + 'static,
  {
    // The observer is parked until the subscription is dropped.
    Teardown::new(move || drop(observer))
  }
}

/// Errors immediately without emitting.
pub struct ObservableThrow<Item, Err> {
  err: Err,
  _hint: PhantomData<fn(Item)>,
}

pub fn throw<Item, Err>(err: Err) -> ObservableThrow<Item, Err> {
  ObservableThrow { err, _hint: PhantomData }
}

impl<Item, Err: Clone> Clone for ObservableThrow<Item, Err> {
  fn clone(&self) -> Self { ObservableThrow { err: self.err.clone(), _hint: PhantomData } }
}

impl<Item, Err> Observable for ObservableThrow<Item, Err> {
  type Item = Item;
  type Err = Err;
  type Unsub = Teardown;

  fn actual_subscribe<O>(self, mut observer: O) -> Self::Unsub
  where
    O: Observer<Item = Item, Err = Err> + Send + 'static,
  {
    observer.error(self.err);
    Teardown::closed()
  }
}
