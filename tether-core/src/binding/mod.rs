//! Framework Binding Layer
//!
//! Connects component instances of a rendering framework to a [`Store`].
//! The framework is reached only through [`Host`], and its lifecycle is
//! delivered through [`Lifecycle`].
//!
//! - [`SharedState`] / [`use_shared_state`]: the hook, returning a
//!   `(value, setter)` [`StateView`] per render pass
//! - [`Consumer`]: declarative form with static or render-function children
//! - [`StateManager`]: a key, initial value and store bundled into one handle
//!
//! [`Store`]: crate::reactive::Store

mod consumer;
mod effect;
mod hook;
mod host;
mod init;
mod manager;
mod provider;

pub use consumer::{Children, Consumer};
pub use effect::{Cleanup, Effect};
pub use hook::{use_consumer, use_shared_state, Setter, SharedState, StateView, UseOptions};
pub use host::{Host, Lifecycle};
pub use init::InitCell;
pub use manager::StateManager;
pub use provider::{Initial, Provider};
