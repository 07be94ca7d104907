//! Store configuration.
//!
//! [`StoreConfig`] names a store (the name shows up in log fields) and picks
//! the two policies the store leaves open: how competing seeds of the same
//! slot are resolved, and whether deleting a slot notifies its observers.
//!
//! # Example
//! ```
//! use tether_core::{DeletePolicy, SeedPolicy, StoreConfig};
//!
//! let cfg = StoreConfig::from_json(r#"{ "name": "ui", "seed_policy": "last_writer_wins" }"#)
//!     .unwrap();
//!
//! assert_eq!(cfg.name, "ui");
//! assert_eq!(cfg.seed_policy, SeedPolicy::LastWriterWins);
//! assert_eq!(cfg.delete_policy, DeletePolicy::Notify);
//! ```

use serde::Deserialize;

use crate::error::Result;

/// How a seed interacts with a slot that may already be populated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Seed only if the slot holds no value when the seed runs.
    #[default]
    FirstWriterWins,
    /// Every seed writes through `set`, so the latest mount wins.
    LastWriterWins,
}

/// What `delete` and `clear` do with the observers of a removed slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeletePolicy {
    /// Notify each observer once so it can observe the value going away.
    #[default]
    Notify,
    /// Drop observers without notifying them.
    Silent,
}

/// Configuration for a [`Store`](crate::Store).
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Name attached to log events emitted by the store.
    pub name: String,
    /// Seeding policy, see [`SeedPolicy`].
    pub seed_policy: SeedPolicy,
    /// Delete policy, see [`DeletePolicy`].
    pub delete_policy: DeletePolicy,
}

impl Default for StoreConfig {
    /// `name = "default"`, first writer wins, deletes notify.
    fn default() -> Self {
        Self {
            name: "default".to_string(),
            seed_policy: SeedPolicy::default(),
            delete_policy: DeletePolicy::default(),
        }
    }
}

impl StoreConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_seed_policy(mut self, policy: SeedPolicy) -> Self {
        self.seed_policy = policy;
        self
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }
}
