//! Tether Core
//!
//! This crate provides keyed global state for component-based UIs.
//! It implements:
//!
//! - A store of named slots with shallow-equality change detection
//! - Per-slot subscriptions with synchronous notification
//! - Selector-based memoization, so observers react only to what they read
//! - Framework bindings: a shared-state hook, a consumer and a state manager
//!
//! The rendering framework itself is an external collaborator reached only
//! through [`Host`] and [`Lifecycle`].
//!
//! # Architecture
//!
//! - `reactive`: the store, subscribers, updates and memos
//! - `binding`: hook instances driven by a framework adapter
//! - `config`: store configuration
//! - `error`: the crate error type
//!
//! # Example
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! use tether_core::{Next, Store, SubscriberId};
//!
//! let store = Store::new();
//! let hits = Arc::new(AtomicUsize::new(0));
//!
//! let counter = hits.clone();
//! let _guard = store.subscription("count", SubscriberId::new(), move || {
//!     counter.fetch_add(1, Ordering::SeqCst);
//! });
//!
//! store.set("count", 1_i64);
//! store.set("count", 1_i64); // unchanged, no notification
//! store.update("count", |n: Option<&i64>| Next::Value(n.copied().unwrap_or(0) + 1))?;
//!
//! assert_eq!(store.get::<i64>("count").as_deref(), Some(&2));
//! assert_eq!(hits.load(Ordering::SeqCst), 2);
//! # Ok::<(), tether_core::StoreError>(())
//! ```

pub mod binding;
pub mod config;
pub mod error;
pub mod reactive;

pub use binding::{
    use_consumer, use_shared_state, Children, Consumer, Host, Initial, Lifecycle, Setter,
    SharedState, StateManager, StateView, UseOptions,
};
pub use config::{DeletePolicy, SeedPolicy, StoreConfig};
pub use error::{Result, StoreError};
pub use reactive::{
    shallow_equal, Identical, Next, Selector, ShallowEq, Store, SubscriberId, Subscription, Update,
};
