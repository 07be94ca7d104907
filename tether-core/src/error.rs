//! Error types for the store.
//!
//! The store itself has very few failure modes: reading an absent key is not
//! an error (it yields `None`), and updaters that fail simply leave the slot
//! untouched. What remains is typed access to a slot that holds a value of a
//! different type, an updater racing another write to its slot, and malformed
//! configuration.

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

/// Errors produced by the store.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum StoreError {
    /// A slot was accessed as `expected`, but it holds a value of another type.
    #[error("slot `{key}` does not hold a value of type {expected}")]
    TypeMismatch {
        /// The slot key.
        key: String,
        /// Name of the type the caller asked for.
        expected: &'static str,
    },

    /// An updater's result was discarded because the slot was written after
    /// the updater read it.
    #[error("slot `{key}` changed while its updater ran")]
    Conflict {
        /// The slot key.
        key: String,
    },

    /// Configuration could not be parsed.
    #[error("invalid store configuration: {0}")]
    InvalidConfig(#[from] serde_json::Error),
}

impl StoreError {
    /// Returns a short stable label (snake_case) for use in logs.
    pub fn as_label(&self) -> &'static str {
        match self {
            StoreError::TypeMismatch { .. } => "store_type_mismatch",
            StoreError::Conflict { .. } => "store_update_conflict",
            StoreError::InvalidConfig(_) => "store_invalid_config",
        }
    }

    pub(crate) fn type_mismatch<T>(key: &str) -> Self {
        StoreError::TypeMismatch {
            key: key.to_string(),
            expected: std::any::type_name::<T>(),
        }
    }
}
