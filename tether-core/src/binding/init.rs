//! Per-instance initialization.
//!
//! [`InitCell`] is the "run once per mount" primitive: it lives in the
//! binding instance (so it survives re-renders), runs its initializer on the
//! first call, and runs it again only when the dependencies passed in are no
//! longer shallow-equal to the previous ones.

use crate::reactive::ShallowEq;

/// Instance-scoped cell holding data computed from dependencies `D`.
#[derive(Debug)]
pub struct InitCell<T, D = ()> {
    state: Option<(T, D)>,
}

impl<T, D> InitCell<T, D> {
    pub fn new() -> Self {
        Self { state: None }
    }

    pub fn is_initialized(&self) -> bool {
        self.state.is_some()
    }

    /// The data from the last initialization, if any.
    pub fn get(&self) -> Option<&T> {
        self.state.as_ref().map(|(data, _)| data)
    }
}

impl<T, D: ShallowEq> InitCell<T, D> {
    /// Return the cached data, running `init` first if this is the first call
    /// or `deps` changed.
    pub fn get_or_init<F>(&mut self, deps: D, init: F) -> &T
    where
        F: FnOnce() -> T,
    {
        let fresh = self
            .state
            .as_ref()
            .is_some_and(|(_, prev)| prev.shallow_eq(&deps));
        if !fresh {
            self.state = None;
        }

        let (data, _) = self.state.get_or_insert_with(|| (init(), deps));
        data
    }
}

impl<T, D> Default for InitCell<T, D> {
    fn default() -> Self {
        Self::new()
    }
}
