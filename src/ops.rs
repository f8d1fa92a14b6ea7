//! Policies layered over connectable observables.

pub mod auto_connect;
pub mod publish;
pub mod ref_count;

pub use auto_connect::AutoConnectObservable;
pub use publish::Publish;
pub use ref_count::{RefCountObservable, RefCountSubscription};
