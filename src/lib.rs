//! # rxcast: multicast event streams with blocking pull bridges
//!
//! Producers push values to registered observers, which may be added and
//! removed at runtime, from any thread. The crate centers on the two places
//! where that model needs real concurrency discipline:
//!
//! - **Sharing one upstream subscription** among many downstream observers:
//!   [`Subject`] relays and their buffering variants, wrapped by
//!   [`ConnectableObservable`] with [`connect`](ConnectableObservable::connect)
//!   / ref-count / auto-connect policies.
//! - **Bridging push back to blocking pull**: [`BlockingIter`],
//!   [`LatestBridge`], [`NextBridge`], [`MostRecentBridge`] and the
//!   `blocking_first` / `blocking_last` / `blocking_single` terminal queries.
//!
//! ## Quick start
//!
//! ```rust
//! use rxcast::prelude::*;
//!
//! let published = from_iter::<_, ()>(1..=3).publish();
//! let seen = std::sync::Arc::new(std::sync::Mutex::new(vec![]));
//!
//! let c_seen = seen.clone();
//! published.fork().subscribe(move |v| c_seen.lock().unwrap().push(v));
//!
//! // Nothing is emitted until the shared upstream is connected.
//! assert!(seen.lock().unwrap().is_empty());
//! let mut connection = published.connect();
//! assert_eq!(*seen.lock().unwrap(), vec![1, 2, 3]);
//! connection.unsubscribe();
//! ```
//!
//! | Type | Description |
//! |------|-------------|
//! | [`Observable`] / [`Observer`] | The push-stream producer/consumer traits |
//! | [`Subject`] | A relay that is both observer and observable |
//! | [`ConnectableObservable`] | Multicast with an explicit shared connection |
//! | [`Subscription`] | Handle to cancel an active registration |
//!
//! [`Subject`]: subject::Subject
//! [`ConnectableObservable`]: observable::ConnectableObservable
//! [`Observable`]: observable::Observable
//! [`Observer`]: observer::Observer
//! [`Subscription`]: subscription::Subscription
//! [`BlockingIter`]: blocking::BlockingIter
//! [`LatestBridge`]: blocking::LatestBridge
//! [`NextBridge`]: blocking::NextBridge
//! [`MostRecentBridge`]: blocking::MostRecentBridge

pub mod blocking;
pub mod error;
pub mod observable;
pub mod observer;
pub mod ops;
pub mod prelude;
pub mod scheduler;
pub mod subject;
pub mod subscription;

pub use prelude::*;
