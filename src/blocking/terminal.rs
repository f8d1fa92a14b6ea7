//! Blocking single-element terminal queries.
//!
//! A short-lived observer subscribes, records the first/last/only qualifying
//! value per policy, and signals a condition variable on a terminal event (or
//! as soon as the policy is decided). The calling thread subscribes, parks on
//! the condvar, disposes the subscription, then inspects the captured
//! outcome.

use crate::error::BlockingError;
use crate::observable::Observable;
use crate::observer::Observer;
use crate::subscription::Subscription;
use parking_lot::{Condvar, Mutex};
use std::sync::Arc;

#[derive(Clone, Copy)]
pub(crate) enum Want {
  First,
  Last,
  Single,
}

struct ExtractCell<Item, Err> {
  state: Mutex<ExtractState<Item, Err>>,
  finished: Condvar,
}

struct ExtractState<Item, Err> {
  value: Option<Item>,
  failed: Option<Err>,
  too_many: bool,
  done: bool,
}

struct ExtractObserver<Item, Err, P> {
  cell: Arc<ExtractCell<Item, Err>>,
  want: Want,
  predicate: P,
}

impl<Item, Err, P> Observer for ExtractObserver<Item, Err, P>
where
  P: FnMut(&Item) -> bool,
{
  type Item = Item;
  type Err = Err;

  fn next(&mut self, value: Item) {
    let mut state = self.cell.state.lock();
    if state.done || !(self.predicate)(&value) {
      return;
    }
    match self.want {
      Want::First => {
        state.value = Some(value);
        state.done = true;
        self.cell.finished.notify_all();
      }
      Want::Last => {
        state.value = Some(value);
      }
      Want::Single => {
        if state.value.is_some() {
          state.too_many = true;
          state.done = true;
          self.cell.finished.notify_all();
        } else {
          state.value = Some(value);
        }
      }
    }
  }

  fn error(&mut self, err: Err) {
    let mut state = self.cell.state.lock();
    if state.done {
      return;
    }
    state.failed = Some(err);
    state.done = true;
    self.cell.finished.notify_all();
  }

  fn complete(&mut self) {
    let mut state = self.cell.state.lock();
    if state.done {
      return;
    }
    state.done = true;
    self.cell.finished.notify_all();
  }

  fn is_closed(&self) -> bool { self.cell.state.lock().done }
}

pub(crate) fn run_extract<S, P>(
  source: S,
  want: Want,
  predicate: P,
) -> Result<Option<S::Item>, BlockingError<S::Err>>
where
  S: Observable,
  S::Item: Send + 'static,
  S::Err: Send + 'static,
  P: FnMut(&S::Item) -> bool + Send + 'static,
{
  let cell = Arc::new(ExtractCell {
    state: Mutex::new(ExtractState { value: None, failed: None, too_many: false, done: false }),
    finished: Condvar::new(),
  });

  let mut upstream =
    source.actual_subscribe(ExtractObserver { cell: cell.clone(), want, predicate });

  let (value, failed, too_many) = {
    let mut state = cell.state.lock();
    while !state.done {
      cell.finished.wait(&mut state);
    }
    (state.value.take(), state.failed.take(), state.too_many)
  };
  upstream.unsubscribe();

  if let Some(err) = failed {
    return Err(BlockingError::Source(err));
  }
  if too_many {
    return Err(BlockingError::TooMany);
  }
  Ok(value)
}
