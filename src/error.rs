//! Failures surfaced by blocking consumers.

use thiserror::Error;

/// Raised only on the pull side: relays and connectables forward source
/// errors verbatim, while a blocking consumer rethrows them as
/// [`Source`](BlockingError::Source) and reports its own local conditions
/// with the other variants.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum BlockingError<Err> {
  /// The upstream source pushed an error.
  #[error("the source emitted an error")]
  Source(Err),
  /// The sequence terminated without a qualifying element.
  #[error("the sequence contains no qualifying element")]
  Empty,
  /// A second qualifying element arrived before completion.
  #[error("the sequence contains more than one qualifying element")]
  TooMany,
}

impl<Err> BlockingError<Err> {
  /// The upstream error, if that is what this is.
  pub fn into_source(self) -> Option<Err> {
    match self {
      BlockingError::Source(err) => Some(err),
      _ => None,
    }
  }
}
