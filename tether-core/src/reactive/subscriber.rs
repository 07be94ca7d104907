//! Subscriber types for the store.
//!
//! A Subscriber is one mounted observer of one slot: an id plus the rebuild
//! callback the store invokes when the slot changes. Each slot keeps its
//! subscribers in a [`Subscribers`] map keyed by id.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use indexmap::IndexMap;
use smallvec::SmallVec;

/// Unique identifier for a subscriber.
///
/// Each observer instance gets one id when it is created and keeps it across
/// re-renders. Registering again under the same id replaces the callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriberId(u64);

impl SubscriberId {
    /// Generate a new unique subscriber ID.
    ///
    /// Uses an atomic counter to ensure uniqueness across threads.
    pub fn new() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);
        Self(COUNTER.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for SubscriberId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SubscriberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// The zero-argument rebuild callback stored for each subscriber.
pub type Callback = Arc<dyn Fn() + Send + Sync>;

/// A subscriber to a slot.
#[derive(Clone)]
pub struct Subscriber {
    id: SubscriberId,
    notify: Callback,
}

impl Subscriber {
    /// Create a subscriber with a fresh id and the given callback.
    pub fn new<F>(notify: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        Self::with_id(SubscriberId::new(), Arc::new(notify))
    }

    pub(crate) fn with_id(id: SubscriberId, notify: Callback) -> Self {
        Self { id, notify }
    }

    /// Get the subscriber's unique ID.
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Invoke the subscriber's callback.
    pub fn notify(&self) {
        (self.notify)();
    }
}

impl fmt::Debug for Subscriber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscriber").field("id", &self.id).finish()
    }
}

/// Point-in-time copy of a slot's subscribers, taken before fan-out so the
/// live map can change while callbacks run.
pub(crate) type Snapshot = SmallVec<[Subscriber; 4]>;

/// Per-slot map from subscriber id to callback.
#[derive(Default)]
pub(crate) struct Subscribers {
    entries: IndexMap<SubscriberId, Callback>,
}

impl Subscribers {
    /// Returns the callback previously registered under `id`, if any.
    pub(crate) fn insert(&mut self, id: SubscriberId, notify: Callback) -> Option<Callback> {
        self.entries.insert(id, notify)
    }

    pub(crate) fn remove(&mut self, id: SubscriberId) -> Option<Callback> {
        self.entries.shift_remove(&id)
    }

    pub(crate) fn contains(&self, id: SubscriberId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Whether `subscriber` is still registered with the same callback.
    pub(crate) fn is_current(&self, subscriber: &Subscriber) -> bool {
        self.entries
            .get(&subscriber.id)
            .is_some_and(|live| Arc::ptr_eq(live, &subscriber.notify))
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }

    pub(crate) fn snapshot(&self) -> Snapshot {
        self.entries
            .iter()
            .map(|(id, notify)| Subscriber::with_id(*id, Arc::clone(notify)))
            .collect()
    }
}
