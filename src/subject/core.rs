//! Shared machinery behind the four subject variants.
//!
//! A [`Hub`] owns the registry of observer slots, the sticky terminal state
//! and the buffering policy. The locking discipline is the load-bearing part:
//!
//! - `gate` is held across "record + snapshot + redistribute", so concurrent
//!   producers are serialized and every observer sees one FIFO order.
//! - `registry` covers list mutation, the terminal flag and the backlog in a
//!   single lock; broadcasts snapshot under it and deliver outside it.
//! - A new subscriber's backlog is delivered through its own slot lock before
//!   the slot is reachable by broadcasts, so backlog and live values cannot
//!   reorder, duplicate or gap.
//! - Unsubscribing flips the slot's active flag and removes the registry
//!   entry; it never takes the slot lock of a running callback, so disposing
//!   from inside any callback is safe. Emitting into the same hub from inside
//!   one of its callbacks is not supported.

use crate::observer::{BoxObserver, Observer};
use crate::subscription::Subscription;
use parking_lot::Mutex;
use smallvec::SmallVec;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// One registered observer. The `active` flag is the unsubscribe signal; the
/// slot mutex serializes delivery into the observer.
pub(crate) struct Slot<Item, Err> {
  active: AtomicBool,
  observer: Mutex<Option<BoxObserver<Item, Err>>>,
}

impl<Item, Err> Slot<Item, Err> {
  fn new(observer: BoxObserver<Item, Err>) -> Self {
    Slot { active: AtomicBool::new(true), observer: Mutex::new(Some(observer)) }
  }

  fn retire(&self) { self.active.store(false, Ordering::Release); }

  fn notify_next(&self, value: Item) {
    if !self.active.load(Ordering::Acquire) {
      return;
    }
    let mut guard = self.observer.lock();
    if !self.active.load(Ordering::Acquire) {
      return;
    }
    if let Some(observer) = guard.as_mut() {
      observer.next(value);
    }
  }

  fn notify_error(&self, err: Err) {
    let observer = {
      let mut guard = self.observer.lock();
      if !self.active.load(Ordering::Acquire) {
        return;
      }
      guard.take()
    };
    if let Some(mut observer) = observer {
      observer.error(err);
    }
  }

  /// Terminal completion; for the final-value policy the cached value is
  /// delivered immediately before it.
  fn notify_complete(&self, last: Option<Item>) {
    let observer = {
      let mut guard = self.observer.lock();
      if !self.active.load(Ordering::Acquire) {
        return;
      }
      guard.take()
    };
    if let Some(mut observer) = observer {
      if let Some(value) = last {
        observer.next(value);
      }
      observer.complete();
    }
  }
}

/// What a subject remembers about past values.
pub(crate) enum Buffering<Item> {
  /// Late subscribers see only future values.
  None,
  /// One current value, seeded at construction.
  Current(Item),
  /// Ordered backlog bounded by a maximum count and/or age.
  Backlog {
    buf: VecDeque<(Instant, Item)>,
    max_len: usize,
    max_age: Option<Duration>,
  },
  /// At most the final value, delivered on completion.
  Last(Option<Item>),
}

fn trim_expired<Item>(buf: &mut VecDeque<(Instant, Item)>, max_age: Option<Duration>) {
  if let Some(age) = max_age {
    let now = Instant::now();
    while buf.front().map_or(false, |(stamp, _)| now.duration_since(*stamp) > age) {
      buf.pop_front();
    }
  }
}

impl<Item: Clone> Buffering<Item> {
  fn record(&mut self, value: &Item) {
    match self {
      Buffering::None => {}
      Buffering::Current(current) => *current = value.clone(),
      Buffering::Backlog { buf, max_len, max_age } => {
        buf.push_back((Instant::now(), value.clone()));
        while buf.len() > *max_len {
          buf.pop_front();
        }
        trim_expired(buf, *max_age);
      }
      Buffering::Last(last) => *last = Some(value.clone()),
    }
  }

  /// Values a subscriber to a live subject receives before any future value.
  fn replay(&mut self) -> SmallVec<[Item; 2]> {
    match self {
      Buffering::None | Buffering::Last(_) => SmallVec::new(),
      Buffering::Current(current) => {
        let mut items = SmallVec::new();
        items.push(current.clone());
        items
      }
      Buffering::Backlog { buf, max_age, .. } => {
        trim_expired(buf, *max_age);
        buf.iter().map(|(_, value)| value.clone()).collect()
      }
    }
  }

  fn final_value(&self) -> Option<Item> {
    if let Buffering::Last(last) = self {
      last.clone()
    } else {
      None
    }
  }
}

pub(crate) enum Terminal<Err> {
  Live,
  Completed,
  Failed(Err),
}

impl<Err> Terminal<Err> {
  fn is_live(&self) -> bool { matches!(self, Terminal::Live) }
}

struct Registry<Item, Err> {
  slots: SmallVec<[(u64, Arc<Slot<Item, Err>>); 2]>,
  next_id: u64,
  terminal: Terminal<Err>,
  buffering: Buffering<Item>,
}

impl<Item, Err> Registry<Item, Err> {
  fn add(&mut self, slot: Arc<Slot<Item, Err>>) -> u64 {
    let id = self.next_id;
    self.next_id += 1;
    self.slots.push((id, slot));
    id
  }

  fn remove(&mut self, id: u64) -> Option<Arc<Slot<Item, Err>>> {
    self
      .slots
      .iter()
      .position(|(slot_id, _)| *slot_id == id)
      .map(|pos| self.slots.remove(pos).1)
  }

  fn snapshot(&self) -> SmallVec<[Arc<Slot<Item, Err>>; 2]> {
    self.slots.iter().map(|(_, slot)| slot.clone()).collect()
  }

  fn drain(&mut self) -> SmallVec<[Arc<Slot<Item, Err>>; 2]> {
    self.slots.drain(..).map(|(_, slot)| slot).collect()
  }
}

enum Staged<Item, Err> {
  Registered {
    id: u64,
    backlog: SmallVec<[Item; 2]>,
  },
  Stopped {
    backlog: SmallVec<[Item; 2]>,
    completion: Option<Item>,
  },
  StoppedWithError {
    backlog: SmallVec<[Item; 2]>,
    err: Err,
  },
}

pub(crate) struct Hub<Item, Err> {
  gate: Mutex<()>,
  registry: Mutex<Registry<Item, Err>>,
}

impl<Item, Err> Hub<Item, Err> {
  pub(crate) fn new(buffering: Buffering<Item>) -> Self {
    Hub {
      gate: Mutex::new(()),
      registry: Mutex::new(Registry {
        slots: SmallVec::new(),
        next_id: 0,
        terminal: Terminal::Live,
        buffering,
      }),
    }
  }

  pub(crate) fn subscriber_count(&self) -> usize { self.registry.lock().slots.len() }

  pub(crate) fn is_terminated(&self) -> bool { !self.registry.lock().terminal.is_live() }

  pub(crate) fn emit(&self, value: Item)
  where
    Item: Clone,
  {
    let _gate = self.gate.lock();
    let snapshot = {
      let mut registry = self.registry.lock();
      if !registry.terminal.is_live() {
        return;
      }
      registry.buffering.record(&value);
      if matches!(registry.buffering, Buffering::Last(_)) {
        // Final-value policy: nothing is broadcast until completion.
        return;
      }
      registry.snapshot()
    };
    let mut slots = snapshot.into_iter().peekable();
    while let Some(slot) = slots.next() {
      if slots.peek().is_some() {
        slot.notify_next(value.clone());
      } else {
        slot.notify_next(value);
        break;
      }
    }
  }

  pub(crate) fn fail(&self, err: Err)
  where
    Err: Clone,
  {
    let _gate = self.gate.lock();
    let drained = {
      let mut registry = self.registry.lock();
      if !registry.terminal.is_live() {
        return;
      }
      registry.terminal = Terminal::Failed(err.clone());
      registry.drain()
    };
    for slot in drained {
      slot.notify_error(err.clone());
    }
  }

  pub(crate) fn finish(&self)
  where
    Item: Clone,
  {
    let _gate = self.gate.lock();
    let (drained, last) = {
      let mut registry = self.registry.lock();
      if !registry.terminal.is_live() {
        return;
      }
      registry.terminal = Terminal::Completed;
      (registry.drain(), registry.buffering.final_value())
    };
    for slot in drained {
      slot.notify_complete(last.clone());
    }
  }

  pub(crate) fn subscribe(
    hub: &Arc<Hub<Item, Err>>,
    observer: BoxObserver<Item, Err>,
  ) -> SubjectSubscription<Item, Err>
  where
    Item: Clone,
    Err: Clone,
  {
    let slot = Arc::new(Slot::new(observer));
    // Exclusive hold on the new slot until its backlog is delivered; a
    // concurrent broadcast that snapshots the slot parks here until then.
    let mut pending = slot.observer.lock();

    let staged = {
      let mut registry = hub.registry.lock();
      if registry.terminal.is_live() {
        let backlog = registry.buffering.replay();
        let id = registry.add(slot.clone());
        Staged::Registered { id, backlog }
      } else {
        let backlog = match &mut registry.buffering {
          Buffering::Backlog { buf, max_age, .. } => {
            trim_expired(buf, *max_age);
            buf.iter().map(|(_, value)| value.clone()).collect()
          }
          _ => SmallVec::new(),
        };
        match &registry.terminal {
          Terminal::Failed(err) => Staged::StoppedWithError { backlog, err: err.clone() },
          _ => Staged::Stopped { backlog, completion: registry.buffering.final_value() },
        }
      }
    };

    match staged {
      Staged::Registered { id, backlog } => {
        if let Some(observer) = pending.as_mut() {
          for value in backlog {
            observer.next(value);
          }
        }
        drop(pending);
        SubjectSubscription { inner: Some(ActiveSubscription { hub: hub.clone(), id, slot }) }
      }
      Staged::Stopped { backlog, completion } => {
        let observer = pending.take();
        drop(pending);
        if let Some(mut observer) = observer {
          for value in backlog {
            observer.next(value);
          }
          if let Some(value) = completion {
            observer.next(value);
          }
          observer.complete();
        }
        SubjectSubscription { inner: None }
      }
      Staged::StoppedWithError { backlog, err } => {
        let observer = pending.take();
        drop(pending);
        if let Some(mut observer) = observer {
          for value in backlog {
            observer.next(value);
          }
          observer.error(err);
        }
        SubjectSubscription { inner: None }
      }
    }
  }
}

/// Handle for one registration with a subject.
pub struct SubjectSubscription<Item, Err> {
  inner: Option<ActiveSubscription<Item, Err>>,
}

struct ActiveSubscription<Item, Err> {
  hub: Arc<Hub<Item, Err>>,
  id: u64,
  slot: Arc<Slot<Item, Err>>,
}

impl<Item, Err> Subscription for SubjectSubscription<Item, Err> {
  fn unsubscribe(&mut self) {
    if let Some(active) = self.inner.take() {
      active.slot.retire();
      let removed = active.hub.registry.lock().remove(active.id);
      drop(removed);
      // Free the observer eagerly unless a broadcast is mid-delivery into
      // it; the last Arc drop frees it otherwise.
      if let Some(mut guard) = active.slot.observer.try_lock() {
        guard.take();
      }
    }
  }

  fn is_closed(&self) -> bool { self.inner.is_none() }
}
