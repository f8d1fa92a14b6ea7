//! Subjects: relays that are both observer and observable.
//!
//! All four variants serialize their own notifications and multicast one
//! upstream stream to a dynamic set of downstream observers; they differ only
//! in what they buffer for late subscribers.

mod behavior_subject;
mod core;
mod last_subject;
mod publish_subject;
mod replay_subject;

pub use behavior_subject::BehaviorSubject;
pub use self::core::SubjectSubscription;
pub use last_subject::LastSubject;
pub use publish_subject::Subject;
pub use replay_subject::ReplaySubject;
