//! Keyed state handles.
//!
//! A [`StateManager`] bundles a store, a key and an initial value so call
//! sites can read, write and bind to the slot without repeating them.

use std::fmt;
use std::sync::Arc;

use super::consumer::{Children, Consumer};
use super::hook::{SharedState, UseOptions};
use super::host::Host;
use super::provider::Initial;
use crate::error::Result;
use crate::reactive::{Next, Selector, ShallowEq, Store};

type Initializer<T> = Arc<dyn Fn() -> T + Send + Sync>;

/// Handle to one slot of a store.
pub struct StateManager<T> {
    store: Store,
    key: String,
    initial: Option<Initializer<T>>,
}

impl<T> StateManager<T>
where
    T: ShallowEq + Send + Sync + 'static,
{
    /// A handle whose bindings seed the slot with a clone of `initial`.
    pub fn new(store: &Store, key: impl Into<String>, initial: T) -> Self
    where
        T: Clone,
    {
        Self::with_initializer(store, key, move || initial.clone())
    }

    /// A handle whose bindings seed the slot with `f()`.
    pub fn with_initializer<F>(store: &Store, key: impl Into<String>, f: F) -> Self
    where
        F: Fn() -> T + Send + Sync + 'static,
    {
        Self {
            store: store.clone(),
            key: key.into(),
            initial: Some(Arc::new(f)),
        }
    }

    /// A handle that never seeds the slot.
    pub fn without_initial(store: &Store, key: impl Into<String>) -> Self {
        Self {
            store: store.clone(),
            key: key.into(),
            initial: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn get_state(&self) -> Option<Arc<T>> {
        self.store.get(&self.key)
    }

    pub fn set_state(&self, value: T) {
        self.store.set(&self.key, value);
    }

    pub fn update_state<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(Option<&T>) -> Next<T> + 'static,
    {
        self.store.update(&self.key, f)
    }

    /// Remove the slot. Returns whether it existed.
    pub fn delete_state(&self) -> bool {
        self.store.delete(&self.key)
    }

    /// Seed the slot with the initial value, subject to the store's seed
    /// policy. Returns whether a value was written.
    pub fn seed(&self) -> bool {
        match &self.initial {
            Some(initial) => self.store.seed(&self.key, || initial()),
            None => false,
        }
    }

    pub fn use_state<H: Host>(&self, host: H) -> SharedState<T> {
        self.use_state_with(host, None)
    }

    pub fn use_state_with<H: Host>(
        &self,
        host: H,
        selector: Option<Selector<T>>,
    ) -> SharedState<T> {
        let options = UseOptions::new()
            .with_initial(self.initial_value())
            .with_selector(selector);
        SharedState::new(&self.store, self.key.clone(), host, options)
    }

    /// Build a [`Consumer`] of this slot.
    pub fn consumer<H, R>(
        &self,
        host: H,
        selector: Option<Selector<T>>,
        children: Children<T, R>,
    ) -> Consumer<T, R>
    where
        H: Host,
        R: Clone + Send + Sync + 'static,
    {
        Consumer::new(&self.store, self.key.clone(), host, selector, children)
    }

    fn initial_value(&self) -> Option<Initial<T>> {
        self.initial.clone().map(|f| Initial::lazy(move || f()))
    }
}

impl<T> Clone for StateManager<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            initial: self.initial.clone(),
        }
    }
}

impl<T> fmt::Debug for StateManager<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateManager")
            .field("key", &self.key)
            .field("has_initial", &self.initial.is_some())
            .finish()
    }
}
