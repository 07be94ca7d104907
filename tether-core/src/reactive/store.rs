//! Store
//!
//! The store is the registry of named state slots. Each slot holds a current
//! value and the subscribers interested in it. Writes compare the old and new
//! value shallowly and, when they differ, synchronously invoke every
//! subscriber's callback before returning.
//!
//! # How It Works
//!
//! 1. A slot is created lazily by the first write or the first subscription.
//!    A subscription that arrives first leaves the slot without a value.
//!
//! 2. A write to a missing slot creates it and notifies nobody.
//!
//! 3. A write to an existing slot replaces the value if it is not shallow-equal
//!    to the stored one (or the writer forced a refresh), then fans out to a
//!    snapshot of the subscribers.
//!
//! 4. Unsubscribing never removes a slot. The value outlives its last
//!    observer, so a later observer sees it. Only `delete` and `clear` remove
//!    slots.
//!
//! # Locking
//!
//! The slot map sits behind a single mutex. It is released before any user
//! code runs (updaters, callbacks, drops of replaced values), so callbacks may
//! freely read, write, subscribe and unsubscribe. Nested writes from inside a
//! callback run to completion before the outer fan-out continues.

use std::any::{type_name, Any};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use tracing::{debug, trace, warn};

use super::equality::ShallowEq;
use super::subscriber::{Callback, Snapshot, SubscriberId, Subscribers};
use super::update::{Next, Update};
use crate::config::{DeletePolicy, SeedPolicy, StoreConfig};
use crate::error::{Result, StoreError};

/// Type-erased slot value.
type Value = Arc<dyn Any + Send + Sync>;

struct Slot {
    value: Option<Value>,
    subscribers: Subscribers,
}

impl Slot {
    fn new(value: Option<Value>) -> Self {
        Self {
            value,
            subscribers: Subscribers::default(),
        }
    }
}

struct StoreInner {
    config: StoreConfig,
    slots: Mutex<HashMap<String, Slot>>,
}

/// A registry of keyed state slots.
///
/// `Store` is a cheap handle: clones share the same slots. Construct one per
/// application (or per test) with [`Store::new`], or use the process-wide
/// [`Store::global`].
///
/// # Example
///
/// ```
/// use tether_core::{Next, Store};
///
/// let store = Store::new();
/// store.set("count", 1_i64);
/// store
///     .update("count", |n: Option<&i64>| Next::Value(n.copied().unwrap_or(0) + 1))
///     .unwrap();
///
/// assert_eq!(store.get::<i64>("count").as_deref(), Some(&2));
/// assert!(store.get::<i64>("missing").is_none());
/// ```
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

static GLOBAL: OnceLock<Store> = OnceLock::new();

impl Store {
    /// Create an empty store with the default configuration.
    pub fn new() -> Self {
        Self::with_config(StoreConfig::default())
    }

    /// Create an empty store with the given configuration.
    pub fn with_config(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(StoreInner {
                config,
                slots: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// The process-wide store, created on first use.
    pub fn global() -> &'static Store {
        GLOBAL.get_or_init(|| Store::with_config(StoreConfig::default().with_name("global")))
    }

    pub fn config(&self) -> &StoreConfig {
        &self.inner.config
    }

    fn name(&self) -> &str {
        &self.inner.config.name
    }

    // ------------------------------------------------------------------
    // Reads
    // ------------------------------------------------------------------

    /// Current value of `key`, or `None` if the slot is absent or empty.
    ///
    /// A slot holding another type also reads as `None`; use
    /// [`try_get`](Self::try_get) to tell the two apart.
    pub fn get<T>(&self, key: &str) -> Option<Arc<T>>
    where
        T: Any + Send + Sync,
    {
        match self.try_get(key) {
            Ok(value) => value,
            Err(err) => {
                warn!(store = %self.name(), key, error = %err, "typed read of mismatched slot");
                None
            }
        }
    }

    /// Current value of `key`, failing if the slot holds another type.
    pub fn try_get<T>(&self, key: &str) -> Result<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        let raw = self
            .inner
            .slots
            .lock()
            .get(key)
            .and_then(|slot| slot.value.clone());

        match raw {
            None => Ok(None),
            Some(value) => value
                .downcast::<T>()
                .map(Some)
                .map_err(|_| StoreError::type_mismatch::<T>(key)),
        }
    }

    /// Whether a slot exists for `key`, with or without a value.
    pub fn contains(&self, key: &str) -> bool {
        self.inner.slots.lock().contains_key(key)
    }

    /// Whether the slot for `key` exists and holds a value.
    pub fn has_value(&self, key: &str) -> bool {
        self.inner
            .slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.value.is_some())
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.inner.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.slots.lock().is_empty()
    }

    /// Keys of all slots, in no particular order.
    pub fn keys(&self) -> Vec<String> {
        self.inner.slots.lock().keys().cloned().collect()
    }

    // ------------------------------------------------------------------
    // Writes
    // ------------------------------------------------------------------

    /// Write `value` to `key`.
    pub fn set<T>(&self, key: &str, value: T)
    where
        T: ShallowEq + Send + Sync + 'static,
    {
        self.commit(key, Arc::new(value), None);
    }

    /// Derive the next value of `key` from the current one.
    ///
    /// Fails without touching the slot if it holds a value of another type,
    /// or with [`StoreError::Conflict`] if the slot was written between the
    /// read handed to `f` and the commit. Updaters are not atomic across
    /// threads: the updater runs without the store lock held, so a concurrent
    /// writer (or a write made from inside `f`) wins and this update is
    /// rejected rather than applied on top of a stale value. Callers that
    /// need every update to land retry on `Conflict`.
    pub fn update<T, F>(&self, key: &str, f: F) -> Result<()>
    where
        T: ShallowEq + Send + Sync + 'static,
        F: FnOnce(Option<&T>) -> Next<T> + 'static,
    {
        self.apply(key, Update::with(f))
    }

    /// Like [`update`](Self::update), but the updater may fail.
    ///
    /// An updater error propagates to the caller and the slot keeps its
    /// previous value.
    pub fn try_update<T, E, F>(&self, key: &str, f: F) -> std::result::Result<(), E>
    where
        T: ShallowEq + Send + Sync + 'static,
        E: From<StoreError>,
        F: FnOnce(Option<&T>) -> std::result::Result<Next<T>, E>,
    {
        let prev = self.try_get::<T>(key)?;
        let next = f(prev.as_deref())?;
        self.resolve(key, prev, next)?;
        Ok(())
    }

    /// Apply an [`Update`] to `key`.
    pub fn apply<T>(&self, key: &str, update: Update<T>) -> Result<()>
    where
        T: ShallowEq + Send + Sync + 'static,
    {
        match update {
            Update::Direct(value) => {
                self.commit(key, Arc::new(value), None);
                Ok(())
            }
            Update::Updater(f) => {
                let prev = self.try_get::<T>(key)?;
                let next = f(prev.as_deref());
                self.resolve(key, prev, next)
            }
        }
    }

    /// Notify every subscriber of `key` without changing its value.
    ///
    /// Creates an empty slot if none exists.
    pub fn refresh(&self, key: &str) {
        let snapshot = {
            let mut slots = self.inner.slots.lock();
            match slots.get(key) {
                Some(slot) => slot.subscribers.snapshot(),
                None => {
                    slots.insert(key.to_string(), Slot::new(None));
                    return;
                }
            }
        };
        self.fan_out(key, snapshot);
    }

    /// Seed `key` with `init()` according to the configured [`SeedPolicy`].
    ///
    /// Returns whether a value was written. Under
    /// [`SeedPolicy::FirstWriterWins`] the check happens at the moment of the
    /// call: a slot that already holds a value is left alone, while a slot
    /// that only has subscribers is seeded (and they are notified).
    pub fn seed<T, F>(&self, key: &str, init: F) -> bool
    where
        T: ShallowEq + Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if self.inner.config.seed_policy == SeedPolicy::FirstWriterWins && self.has_value(key) {
            trace!(store = %self.name(), key, "slot already seeded");
            return false;
        }

        debug!(store = %self.name(), key, ty = type_name::<T>(), "seeding slot");
        self.set(key, init());
        true
    }

    /// Remove the slot for `key`. Returns whether it existed.
    ///
    /// Subscribers registered at that moment are notified once after the
    /// slot is gone (unless [`DeletePolicy::Silent`]), then dropped.
    pub fn delete(&self, key: &str) -> bool {
        let removed = self.inner.slots.lock().remove(key);
        let Some(slot) = removed else {
            return false;
        };

        debug!(
            store = %self.name(),
            key,
            subscribers = slot.subscribers.len(),
            "slot deleted"
        );
        self.release(slot);
        true
    }

    /// Remove every slot, notifying all of their subscribers.
    pub fn clear(&self) {
        let slots = std::mem::take(&mut *self.inner.slots.lock());
        debug!(store = %self.name(), slots = slots.len(), "store cleared");

        for slot in slots.into_values() {
            self.release(slot);
        }
    }

    fn resolve<T>(&self, key: &str, prev: Option<Arc<T>>, next: Next<T>) -> Result<()>
    where
        T: ShallowEq + Send + Sync + 'static,
    {
        match next {
            Next::Value(value) => {
                if !self.commit(key, Arc::new(value), Some(prev.as_ref())) {
                    debug!(store = %self.name(), key, "update lost to a concurrent write");
                    return Err(StoreError::Conflict {
                        key: key.to_string(),
                    });
                }
            }
            // Leaves whatever the slot holds now, including writes made
            // after `prev` was read.
            Next::Refresh => self.refresh(key),
        }
        Ok(())
    }

    /// Write `next` to `key` and fan out if it differs from the stored value.
    ///
    /// With `base`, the write applies only if the slot still holds exactly
    /// that value (by pointer); returns `false` otherwise.
    fn commit<T>(&self, key: &str, next: Arc<T>, base: Option<Option<&Arc<T>>>) -> bool
    where
        T: ShallowEq + Send + Sync + 'static,
    {
        // The replaced value is dropped after the lock is released.
        let (snapshot, _replaced) = {
            let mut slots = self.inner.slots.lock();
            let stored = slots.get(key).and_then(|slot| slot.value.as_ref());
            if base.is_some_and(|base| !same_ref(stored, base)) {
                return false;
            }

            let Some(slot) = slots.get_mut(key) else {
                debug!(store = %self.name(), key, ty = type_name::<T>(), "slot created");
                slots.insert(key.to_string(), Slot::new(Some(next as Value)));
                return true;
            };

            if same_value(slot.value.as_ref(), Some(&*next)) {
                trace!(store = %self.name(), key, "value unchanged");
                return true;
            }

            let replaced = slot.value.replace(next as Value);
            (slot.subscribers.snapshot(), replaced)
        };

        self.fan_out(key, snapshot);
        true
    }

    // ------------------------------------------------------------------
    // Subscriptions
    // ------------------------------------------------------------------

    /// Register `notify` for `key` under `id`, replacing any callback already
    /// registered under that id. Creates an empty slot if none exists.
    pub fn subscribe<F>(&self, key: &str, id: SubscriberId, notify: F)
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe_callback(key, id, Arc::new(notify));
    }

    pub(crate) fn subscribe_callback(&self, key: &str, id: SubscriberId, notify: Callback) {
        let replaced = self
            .inner
            .slots
            .lock()
            .entry(key.to_string())
            .or_insert_with(|| Slot::new(None))
            .subscribers
            .insert(id, notify);
        drop(replaced);
        trace!(store = %self.name(), key, %id, "subscribed");
    }

    /// Like [`subscribe`](Self::subscribe), returning a guard that
    /// unsubscribes when dropped.
    pub fn subscription<F>(&self, key: &str, id: SubscriberId, notify: F) -> Subscription
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.subscribe(key, id, notify);
        Subscription {
            store: self.clone(),
            key: key.to_string(),
            id,
        }
    }

    /// Remove the subscriber `id` from `key`. The slot itself stays.
    pub fn unsubscribe(&self, key: &str, id: SubscriberId) -> bool {
        // The callback is dropped after the lock is released.
        let removed = self
            .inner
            .slots
            .lock()
            .get_mut(key)
            .and_then(|slot| slot.subscribers.remove(id));

        let Some(_callback) = removed else {
            return false;
        };
        trace!(store = %self.name(), key, %id, "unsubscribed");
        true
    }

    /// Whether `id` is currently subscribed to `key`.
    pub fn is_subscribed(&self, key: &str, id: SubscriberId) -> bool {
        self.inner
            .slots
            .lock()
            .get(key)
            .is_some_and(|slot| slot.subscribers.contains(id))
    }

    /// Number of subscribers of `key`.
    pub fn subscriber_count(&self, key: &str) -> usize {
        self.inner
            .slots
            .lock()
            .get(key)
            .map_or(0, |slot| slot.subscribers.len())
    }

    /// Invoke every callback registered for `key`.
    pub fn notify(&self, key: &str) {
        let snapshot = match self.inner.slots.lock().get(key) {
            Some(slot) => slot.subscribers.snapshot(),
            None => return,
        };
        self.fan_out(key, snapshot);
    }

    fn fan_out(&self, key: &str, snapshot: Snapshot) {
        trace!(store = %self.name(), key, subscribers = snapshot.len(), "notifying subscribers");

        for subscriber in snapshot {
            // Skip subscribers removed or re-registered by an earlier
            // callback in this pass.
            let current = self
                .inner
                .slots
                .lock()
                .get(key)
                .is_some_and(|slot| slot.subscribers.is_current(&subscriber));
            if current {
                subscriber.notify();
            }
        }
    }

    fn release(&self, slot: Slot) {
        if self.inner.config.delete_policy == DeletePolicy::Silent {
            return;
        }
        for subscriber in slot.subscribers.snapshot() {
            subscriber.notify();
        }
    }
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Store {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Store")
            .field("name", &self.name())
            .field("slots", &self.len())
            .finish()
    }
}

/// Compare a stored value with a candidate of type `T`.
///
/// A stored value of another type never equals the candidate.
fn same_value<T: ShallowEq + 'static>(stored: Option<&Value>, next: Option<&T>) -> bool {
    match (stored, next) {
        (None, None) => true,
        (Some(stored), Some(next)) => (**stored)
            .downcast_ref::<T>()
            .is_some_and(|stored| stored.shallow_eq(next)),
        _ => false,
    }
}

/// Whether the stored value is the very allocation `base` (both absent
/// counts as the same).
fn same_ref<T>(stored: Option<&Value>, base: Option<&Arc<T>>) -> bool {
    match (stored, base) {
        (None, None) => true,
        (Some(stored), Some(base)) => {
            Arc::as_ptr(stored).cast::<()>() == Arc::as_ptr(base).cast::<()>()
        }
        _ => false,
    }
}

/// Handle to a registered subscriber.
///
/// Dropping this handle unsubscribes it from the store.
#[must_use = "dropping a Subscription unsubscribes it immediately"]
pub struct Subscription {
    store: Store,
    key: String,
    id: SubscriberId,
}

impl Subscription {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.store.unsubscribe(&self.key, self.id);
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("key", &self.key)
            .field("id", &self.id)
            .finish()
    }
}
