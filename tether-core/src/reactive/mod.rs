//! Store Primitives
//!
//! This module implements the subscription and notification engine: the
//! store of keyed slots, the subscribers attached to each slot, and the memo
//! layer that lets an observer react only to the part of a slot it selected.
//!
//! # Concepts
//!
//! ## Slots
//!
//! A slot is a named, globally addressable value. Any part of the application
//! holding the same [`Store`] can read or write it by key. Writing a value
//! that is shallow-equal to the current one does nothing; writing a different
//! value notifies every subscriber of the slot.
//!
//! ## Subscribers
//!
//! A subscriber is a rebuild callback registered under a [`SubscriberId`].
//! Subscribers are notified synchronously, before the write returns.
//!
//! ## Memos and selectors
//!
//! A [`Memo`] sits between a slot and an observer. It caches the observer's
//! output and, when given a [`Selector`], recomputes only if the selected
//! projection changed.

mod equality;
mod memo;
mod store;
mod subscriber;
mod update;

pub use equality::{shallow_equal, Identical, ShallowEq};
pub use memo::{Diff, Memo, Projection, Selector};
pub use store::{Store, Subscription};
pub use subscriber::{Callback, Subscriber, SubscriberId};
pub use update::{Next, Update, Updater};
