//! Update requests.
//!
//! A write to a slot is either a literal replacement value or an updater that
//! derives the next value from the current one. An updater may also answer
//! [`Next::Refresh`]: keep the stored value but notify every observer anyway.

use std::fmt;

/// Result of an updater function.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Next<T> {
    /// Replace the slot value with this one.
    Value(T),
    /// Keep the current value and force a notification.
    Refresh,
}

impl<T> Next<T> {
    /// Returns true for [`Next::Refresh`].
    pub fn is_refresh(&self) -> bool {
        matches!(self, Next::Refresh)
    }
}

/// Boxed updater: receives the current value, or `None` if the slot is
/// absent or empty.
pub type Updater<T> = Box<dyn FnOnce(Option<&T>) -> Next<T>>;

/// A write to a slot.
pub enum Update<T> {
    /// Write this value.
    Direct(T),
    /// Compute the next value from the current one.
    Updater(Updater<T>),
}

impl<T> Update<T> {
    /// Wrap an updater closure.
    pub fn with<F>(f: F) -> Self
    where
        F: FnOnce(Option<&T>) -> Next<T> + 'static,
    {
        Update::Updater(Box::new(f))
    }
}

impl<T: fmt::Debug> fmt::Debug for Update<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Update::Direct(value) => f.debug_tuple("Direct").field(value).finish(),
            Update::Updater(_) => f.write_str("Updater(..)"),
        }
    }
}
