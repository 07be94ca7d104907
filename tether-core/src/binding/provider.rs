//! Slot seeding for one mounted instance.
//!
//! A [`Provider`] seeds a slot with an initial value the first time its
//! instance renders. Later renders of the same instance never seed again.
//! Whether the seed actually writes is decided by the store's
//! [`SeedPolicy`](crate::SeedPolicy) at the moment of the call, so two
//! instances mounting on the same empty key resolve deterministically.

use std::fmt;

use super::init::InitCell;
use crate::reactive::{ShallowEq, Store};

/// An initial slot value, given directly or computed on demand.
pub enum Initial<T> {
    Value(T),
    Lazy(Box<dyn FnOnce() -> T + Send>),
}

impl<T> Initial<T> {
    /// An initializer that runs only if the slot is actually seeded.
    pub fn lazy<F>(f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        Initial::Lazy(Box::new(f))
    }

    pub fn resolve(self) -> T {
        match self {
            Initial::Value(value) => value,
            Initial::Lazy(f) => f(),
        }
    }
}

impl<T> From<T> for Initial<T> {
    fn from(value: T) -> Self {
        Initial::Value(value)
    }
}

impl<T: fmt::Debug> fmt::Debug for Initial<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Initial::Value(value) => f.debug_tuple("Value").field(value).finish(),
            Initial::Lazy(_) => f.write_str("Lazy(..)"),
        }
    }
}

/// Seeds one slot, at most once per mounted instance.
pub struct Provider<T> {
    store: Store,
    key: String,
    initial: Option<Initial<T>>,
    init: InitCell<bool>,
}

impl<T> Provider<T>
where
    T: ShallowEq + Send + Sync + 'static,
{
    pub fn new(store: &Store, key: impl Into<String>, initial: Option<Initial<T>>) -> Self {
        Self {
            store: store.clone(),
            key: key.into(),
            initial,
            init: InitCell::new(),
        }
    }

    /// Seed the slot on the first call; later calls do nothing.
    pub fn provide(&mut self) {
        let Self {
            store,
            key,
            initial,
            init,
        } = self;

        init.get_or_init((), || match initial.take() {
            Some(initial) => store.seed(key, || initial.resolve()),
            None => false,
        });
    }

    /// Whether this instance's seed wrote to the slot.
    pub fn seeded(&self) -> bool {
        self.init.get().copied().unwrap_or(false)
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> fmt::Debug for Provider<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provider")
            .field("key", &self.key)
            .field("provided", &self.init.is_initialized())
            .finish()
    }
}
