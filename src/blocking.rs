//! Push-to-pull bridges and blocking terminal queries.
//!
//! Each bridge subscribes an internal observer to the source and exposes a
//! pull operation to a foreground thread, parking it on a condition variable
//! that the producer-side callbacks signal (never a polling loop). Disposal
//! from either side wakes every blocked party, so a pull reports
//! end-of-stream instead of hanging and a held-back producer is released.
//!
//! A captured source error surfaces on the next pull after it was recorded,
//! taking precedence over undelivered buffered values; completion surfaces
//! only once buffered values have drained.

use crate::error::BlockingError;
use crate::observable::Observable;

mod iter;
mod latest;
mod most_recent;
mod next;
mod terminal;

pub use iter::BlockingIter;
pub use latest::LatestBridge;
pub use most_recent::MostRecentBridge;
pub use next::NextBridge;

use terminal::{run_extract, Want};

/// Blocking pull adapters over any observable.
pub trait BlockingExt: Observable + Sized {
  /// Enumerate the stream: every value, in order, buffered without bound.
  /// The upstream subscription is established lazily on the first pull.
  fn blocking_iter(self) -> BlockingIter<Self>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    BlockingIter::new(self)
  }

  /// Pull the most recent undelivered value, blocking until one arrives.
  /// Values produced while the consumer was busy are coalesced away; a value
  /// is never delivered twice.
  fn blocking_latest(self) -> LatestBridge<Self::Item, Self::Err, Self::Unsub>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    LatestBridge::new(self)
  }

  /// Pull every value in lock-step with the producer: the producer-side
  /// callback is held while a value awaits consumption, so nothing is lost
  /// and the producer runs at the consumer's pace.
  fn blocking_next(self) -> NextBridge<Self::Item, Self::Err, Self::Unsub>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    NextBridge::new(self)
  }

  /// Poll the latest value without ever blocking, seeded with `initial`
  /// until the first push arrives. The same value may be returned
  /// repeatedly.
  fn blocking_most_recent(
    self,
    initial: Self::Item,
  ) -> MostRecentBridge<Self::Item, Self::Err, Self::Unsub>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    MostRecentBridge::new(self, initial)
  }

  /// The first value, blocking until it arrives; unsubscribes immediately
  /// after.
  fn blocking_first(self) -> Result<Self::Item, BlockingError<Self::Err>>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::First, |_| true)?.ok_or(BlockingError::Empty)
  }

  /// The first value matching `predicate`.
  fn blocking_first_where<P>(self, predicate: P) -> Result<Self::Item, BlockingError<Self::Err>>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::First, predicate)?.ok_or(BlockingError::Empty)
  }

  /// The first value, or `None` for an empty sequence.
  fn blocking_first_or_default(self) -> Result<Option<Self::Item>, BlockingError<Self::Err>>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::First, |_| true)
  }

  /// The first matching value, or `None`.
  fn blocking_first_or_default_where<P>(
    self,
    predicate: P,
  ) -> Result<Option<Self::Item>, BlockingError<Self::Err>>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::First, predicate)
  }

  /// The last value before completion, blocking until the source terminates.
  fn blocking_last(self) -> Result<Self::Item, BlockingError<Self::Err>>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Last, |_| true)?.ok_or(BlockingError::Empty)
  }

  /// The last value matching `predicate`.
  fn blocking_last_where<P>(self, predicate: P) -> Result<Self::Item, BlockingError<Self::Err>>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Last, predicate)?.ok_or(BlockingError::Empty)
  }

  /// The last value, or `None` for an empty sequence.
  fn blocking_last_or_default(self) -> Result<Option<Self::Item>, BlockingError<Self::Err>>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Last, |_| true)
  }

  /// The last matching value, or `None`.
  fn blocking_last_or_default_where<P>(
    self,
    predicate: P,
  ) -> Result<Option<Self::Item>, BlockingError<Self::Err>>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Last, predicate)
  }

  /// The only value of the sequence. Fails with
  /// [`TooMany`](BlockingError::TooMany) as soon as a second value arrives,
  /// with [`Empty`](BlockingError::Empty) on completion without one.
  fn blocking_single(self) -> Result<Self::Item, BlockingError<Self::Err>>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Single, |_| true)?.ok_or(BlockingError::Empty)
  }

  /// The only value matching `predicate`.
  fn blocking_single_where<P>(self, predicate: P) -> Result<Self::Item, BlockingError<Self::Err>>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Single, predicate)?.ok_or(BlockingError::Empty)
  }

  /// The only value, or `None` for an empty sequence; still fails on a
  /// second value.
  fn blocking_single_or_default(self) -> Result<Option<Self::Item>, BlockingError<Self::Err>>
  where
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Single, |_| true)
  }

  /// The only matching value, or `None`.
  fn blocking_single_or_default_where<P>(
    self,
    predicate: P,
  ) -> Result<Option<Self::Item>, BlockingError<Self::Err>>
  where
    P: FnMut(&Self::Item) -> bool + Send + 'static,
    Self::Item: Send + 'static,
    Self::Err: Send + 'static,
  {
    run_extract(self, Want::Single, predicate)
  }
}

impl<T: Observable> BlockingExt for T {}
