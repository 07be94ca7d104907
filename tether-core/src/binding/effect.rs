//! Effect Implementation
//!
//! An Effect is a side effect a binding runs after mount and again whenever
//! its dependencies change, mirroring the framework's after-render hook.
//!
//! # How Effects Work
//!
//! 1. `sync(deps)` runs the effect if it has not run yet, or if `deps` is not
//!    shallow-equal to the dependencies of the previous run.
//!
//! 2. The effect may return a cleanup. The cleanup runs before the next run,
//!    on `reset` and when the effect is dropped.
//!
//! # Use Cases
//!
//! Bindings use an effect keyed on the slot key to hold their store
//! subscription: subscribing is the effect, unsubscribing is its cleanup.

use std::fmt;

use crate::reactive::ShallowEq;

/// Cleanup returned by an effect run.
pub type Cleanup = Box<dyn FnOnce() + Send>;

/// A side effect keyed on dependencies of type `D`.
pub struct Effect<D> {
    /// The effect function.
    run: Box<dyn FnMut(&D) -> Option<Cleanup> + Send>,

    /// Dependencies of the last run.
    deps: Option<D>,

    /// Cleanup returned by the last run.
    cleanup: Option<Cleanup>,

    /// Number of times the effect has run.
    run_count: usize,
}

impl<D: ShallowEq> Effect<D> {
    /// Create an effect. It does not run until the first `sync`.
    pub fn new<F>(run: F) -> Self
    where
        F: FnMut(&D) -> Option<Cleanup> + Send + 'static,
    {
        Self {
            run: Box::new(run),
            deps: None,
            cleanup: None,
            run_count: 0,
        }
    }

    /// Run the effect if it never ran or `deps` changed. Returns whether it ran.
    pub fn sync(&mut self, deps: D) -> bool {
        if self
            .deps
            .as_ref()
            .is_some_and(|prev| prev.shallow_eq(&deps))
        {
            return false;
        }

        self.run_cleanup();
        self.cleanup = (self.run)(&deps);
        self.deps = Some(deps);
        self.run_count += 1;
        true
    }
}

impl<D> Effect<D> {
    /// Run the pending cleanup and forget the last dependencies, so the next
    /// `sync` runs again.
    pub fn reset(&mut self) {
        self.run_cleanup();
        self.deps = None;
    }

    /// Whether the effect has run and its cleanup is still pending.
    pub fn is_active(&self) -> bool {
        self.deps.is_some()
    }

    /// Get the number of times the effect has run.
    pub fn run_count(&self) -> usize {
        self.run_count
    }

    fn run_cleanup(&mut self) {
        if let Some(cleanup) = self.cleanup.take() {
            cleanup();
        }
    }
}

impl<D> Drop for Effect<D> {
    fn drop(&mut self) {
        self.run_cleanup();
    }
}

impl<D> fmt::Debug for Effect<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Effect")
            .field("run_count", &self.run_count)
            .field("active", &self.is_active())
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
