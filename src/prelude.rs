//! Convenient re-export of the crate surface.

pub use crate::blocking::{BlockingExt, BlockingIter, LatestBridge, MostRecentBridge, NextBridge};
pub use crate::error::BlockingError;
pub use crate::observable::{
  create, empty, from_iter, never, of, throw, ConnectableObservable, ConnectionHandle, Create,
  Feeder, MulticastExt, MulticastOp, Observable, ObservableEmpty, ObservableFromIter,
  ObservableNever, ObservableOf, ObservableThrow, SubscribeExt,
};
pub use crate::observer::{BoxObserver, Observer, ObserverAll};
pub use crate::ops::auto_connect::AutoConnectObservable;
pub use crate::ops::publish::Publish;
pub use crate::ops::ref_count::{RefCountObservable, RefCountSubscription};
pub use crate::scheduler::{
  default_scheduler, Scheduler, TaskHandle, TestScheduler, ThreadScheduler,
};
pub use crate::subject::{BehaviorSubject, LastSubject, ReplaySubject, Subject, SubjectSubscription};
pub use crate::subscription::{
  BoxSubscription, PairedSubscription, SerialSubscription, SharedSubscription, Subscription,
  Teardown,
};
