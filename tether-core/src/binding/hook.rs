//! Shared-state hook.
//!
//! [`SharedState`] is one mounted component's binding to one slot. It is
//! created on the instance's first render and kept by the framework adapter
//! for the instance's lifetime:
//!
//! 1. On creation it seeds the slot (once per instance, see [`Provider`]),
//!    draws a fresh [`SubscriberId`], and builds a [`Memo`] of the
//!    `(value, setter)` view.
//!
//! 2. `render` returns the memoized view. Observers with a selector keep
//!    returning the view from the last projection change.
//!
//! 3. `on_mount` subscribes to the slot; every notification runs the memo's
//!    `diff_changes` and asks the host to re-render only if it reports a
//!    change. `on_unmount` (or dropping the binding) unsubscribes.

use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

use super::effect::{Cleanup, Effect};
use super::host::{Host, Lifecycle};
use super::provider::{Initial, Provider};
use crate::error::Result;
use crate::reactive::{Memo, Next, Selector, ShallowEq, Store, SubscriberId, Update};

/// Writes to one slot.
pub struct Setter<T> {
    store: Store,
    key: String,
    _value: PhantomData<fn(T)>,
}

impl<T> Setter<T>
where
    T: ShallowEq + Send + Sync + 'static,
{
    pub(crate) fn new(store: &Store, key: &str) -> Self {
        Self {
            store: store.clone(),
            key: key.to_string(),
            _value: PhantomData,
        }
    }

    pub fn set(&self, value: T) {
        self.store.set(&self.key, value);
    }

    pub fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(Option<&T>) -> Next<T> + 'static,
    {
        self.store.update(&self.key, f)
    }

    pub fn apply(&self, update: Update<T>) -> Result<()> {
        self.store.apply(&self.key, update)
    }

    /// Notify every observer of the slot without changing it.
    pub fn refresh(&self) {
        self.store.refresh(&self.key);
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl<T> Clone for Setter<T> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            key: self.key.clone(),
            _value: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Setter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Setter").field("key", &self.key).finish()
    }
}

/// The value a hook hands to its component, plus the means to change it.
pub struct StateView<T> {
    value: Option<Arc<T>>,
    setter: Setter<T>,
    store: Store,
}

impl<T> StateView<T>
where
    T: ShallowEq + Send + Sync + 'static,
{
    fn capture(store: &Store, key: &str) -> Self {
        Self {
            value: store.get(key),
            setter: Setter::new(store, key),
            store: store.clone(),
        }
    }

    /// The value as of the last time this view was computed.
    pub fn value(&self) -> Option<&T> {
        self.value.as_deref()
    }

    pub fn value_arc(&self) -> Option<Arc<T>> {
        self.value.clone()
    }

    pub fn setter(&self) -> &Setter<T> {
        &self.setter
    }

    /// Read the slot now, bypassing the memoized value.
    pub fn get(&self) -> Option<Arc<T>> {
        self.store.get(self.setter.key())
    }

    pub fn into_parts(self) -> (Option<Arc<T>>, Setter<T>) {
        (self.value, self.setter)
    }
}

impl<T> Clone for StateView<T> {
    fn clone(&self) -> Self {
        Self {
            value: self.value.clone(),
            setter: self.setter.clone(),
            store: self.store.clone(),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for StateView<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateView")
            .field("key", &self.setter.key)
            .field("value", &self.value)
            .finish()
    }
}

/// Options for [`use_shared_state`].
pub struct UseOptions<T> {
    initial: Option<Initial<T>>,
    selector: Option<Selector<T>>,
}

impl<T> UseOptions<T> {
    pub fn new() -> Self {
        Self {
            initial: None,
            selector: None,
        }
    }

    /// Seed the slot with `value` if it is empty when the instance mounts.
    pub fn initial(mut self, value: T) -> Self {
        self.initial = Some(Initial::Value(value));
        self
    }

    /// Like [`initial`](Self::initial), computing the value only if needed.
    pub fn initial_with<F>(mut self, f: F) -> Self
    where
        F: FnOnce() -> T + Send + 'static,
    {
        self.initial = Some(Initial::lazy(f));
        self
    }

    pub fn with_initial(mut self, initial: Option<Initial<T>>) -> Self {
        self.initial = initial;
        self
    }

    /// Re-render only when `f`'s projection of the slot changes.
    pub fn selector<P, F>(mut self, f: F) -> Self
    where
        P: ShallowEq + Send + Sync + 'static,
        F: Fn(Option<&T>) -> P + Send + Sync + 'static,
    {
        self.selector = Some(Selector::new(f));
        self
    }

    pub fn with_selector(mut self, selector: Option<Selector<T>>) -> Self {
        self.selector = selector;
        self
    }
}

impl<T> Default for UseOptions<T> {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) type ViewMemo<T> = Arc<Mutex<Memo<StateView<T>, T>>>;

/// One mounted instance's binding to a slot.
pub struct SharedState<T> {
    store: Store,
    key: String,
    id: SubscriberId,
    selector: Option<Selector<T>>,
    provider: Provider<T>,
    memo: ViewMemo<T>,
    effect: Effect<String>,
}

impl<T> SharedState<T>
where
    T: ShallowEq + Send + Sync + 'static,
{
    /// Create the binding during the instance's first render.
    pub fn new<H: Host>(
        store: &Store,
        key: impl Into<String>,
        host: H,
        options: UseOptions<T>,
    ) -> Self {
        Self::with_shared_host(store, key, Arc::new(host), options)
    }

    pub(crate) fn with_shared_host(
        store: &Store,
        key: impl Into<String>,
        host: Arc<dyn Host>,
        options: UseOptions<T>,
    ) -> Self {
        let key = key.into();
        let id = SubscriberId::new();

        let mut provider = Provider::new(store, key.clone(), options.initial);
        provider.provide();

        let memo = Arc::new(Mutex::new(view_memo(store, &key, options.selector.clone())));
        let effect = subscription_effect(store.clone(), id, Arc::clone(&memo), host);

        Self {
            store: store.clone(),
            key,
            id,
            selector: options.selector,
            provider,
            memo,
            effect,
        }
    }

    /// The view for this render pass.
    pub fn render(&mut self) -> StateView<T> {
        self.provider.provide();
        self.memo.lock().output().clone()
    }

    /// Point the binding at another slot.
    ///
    /// The view is rebuilt immediately; the subscription moves on the next
    /// [`Lifecycle::on_dependency_change`]. The new slot is not seeded.
    pub fn rebind(&mut self, key: impl Into<String>) {
        let key = key.into();
        if key == self.key {
            return;
        }
        *self.memo.lock() = view_memo(&self.store, &key, self.selector.clone());
        self.key = key;
    }

    pub fn id(&self) -> SubscriberId {
        self.id
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Whether the binding currently holds a store subscription.
    pub fn is_subscribed(&self) -> bool {
        self.effect.is_active()
    }

    pub(crate) fn view_memo(&self) -> ViewMemo<T> {
        Arc::clone(&self.memo)
    }
}

impl<T> Lifecycle for SharedState<T>
where
    T: ShallowEq + Send + Sync + 'static,
{
    fn on_mount(&mut self) {
        self.effect.sync(self.key.clone());
    }

    fn on_dependency_change(&mut self) {
        self.effect.sync(self.key.clone());
    }

    fn on_unmount(&mut self) {
        self.effect.reset();
    }
}

impl<T> fmt::Debug for SharedState<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SharedState")
            .field("key", &self.key)
            .field("id", &self.id)
            .field("effect", &self.effect)
            .finish()
    }
}

/// Create a [`SharedState`] binding for `key`.
///
/// # Example
///
/// ```
/// use tether_core::{use_shared_state, Lifecycle, Store, UseOptions};
///
/// let store = Store::new();
/// let mut counter = use_shared_state(&store, "count", || {}, UseOptions::new().initial(0_i64));
/// counter.on_mount();
///
/// let view = counter.render();
/// assert_eq!(view.value(), Some(&0));
/// view.setter().set(1);
/// assert_eq!(counter.render().value(), Some(&1));
/// ```
pub fn use_shared_state<T, H>(
    store: &Store,
    key: impl Into<String>,
    host: H,
    options: UseOptions<T>,
) -> SharedState<T>
where
    T: ShallowEq + Send + Sync + 'static,
    H: Host,
{
    SharedState::new(store, key, host, options)
}

/// Create a read-mostly binding for `key` with no initial value.
pub fn use_consumer<T, H>(
    store: &Store,
    key: impl Into<String>,
    host: H,
    selector: Option<Selector<T>>,
) -> SharedState<T>
where
    T: ShallowEq + Send + Sync + 'static,
    H: Host,
{
    SharedState::new(store, key, host, UseOptions::new().with_selector(selector))
}

fn view_memo<T>(store: &Store, key: &str, selector: Option<Selector<T>>) -> Memo<StateView<T>, T>
where
    T: ShallowEq + Send + Sync + 'static,
{
    let (view_store, view_key) = (store.clone(), key.to_string());
    let (dep_store, dep_key) = (store.clone(), key.to_string());

    Memo::new(
        move || StateView::capture(&view_store, &view_key),
        move || dep_store.get::<T>(&dep_key),
        selector,
    )
}

fn subscription_effect<T>(
    store: Store,
    id: SubscriberId,
    memo: ViewMemo<T>,
    host: Arc<dyn Host>,
) -> Effect<String>
where
    T: ShallowEq + Send + Sync + 'static,
{
    Effect::new(move |key: &String| {
        let (memo, host) = (Arc::clone(&memo), Arc::clone(&host));
        let subscription = store.subscription(key, id, move || {
            // The memo lock is released before the host runs.
            let diff = memo.lock().diff_changes();
            if diff.is_changed() {
                host.schedule_rerender();
            }
        });
        Some(Box::new(move || drop(subscription)) as Cleanup)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::impl_shallow_eq;
    use std::sync::atomic::{AtomicI32, Ordering};

    #[derive(Debug, Clone, PartialEq)]
    struct Doc {
        count: i64,
        text: String,
    }
    impl_shallow_eq!(Doc { count, text });

    fn doc(count: i64, text: &str) -> Doc {
        Doc {
            count,
            text: text.to_string(),
        }
    }

    fn counting_host() -> (impl Host, Arc<AtomicI32>) {
        let renders = Arc::new(AtomicI32::new(0));
        let renders_clone = renders.clone();
        let host = move || {
            renders_clone.fetch_add(1, Ordering::SeqCst);
        };
        (host, renders)
    }

    #[test]
    fn first_render_seeds_and_returns_value() {
        let store = Store::new();
        let (host, _) = counting_host();
        let mut state =
            use_shared_state(&store, "doc", host, UseOptions::new().initial(doc(0, "a")));

        let view = state.render();
        assert_eq!(view.value(), Some(&doc(0, "a")));
        assert_eq!(store.get::<Doc>("doc").as_deref(), Some(&doc(0, "a")));
    }

    #[test]
    fn rerender_does_not_reseed() {
        let store = Store::new();
        let (host, _) = counting_host();
        let mut state = use_shared_state(&store, "n", host, UseOptions::new().initial(1_i32));
        state.on_mount();

        store.delete("n");
        state.render();
        assert!(store.get::<i32>("n").is_none());
    }

    #[test]
    fn subscription_follows_mount_and_unmount() {
        let store = Store::new();
        let (host, _) = counting_host();
        let mut state = use_shared_state(&store, "n", host, UseOptions::new().initial(1_i32));

        assert!(!state.is_subscribed());
        assert_eq!(store.subscriber_count("n"), 0);

        state.on_mount();
        assert!(state.is_subscribed());
        assert!(store.is_subscribed("n", state.id()));

        state.on_unmount();
        assert!(!store.is_subscribed("n", state.id()));
        assert_eq!(store.get::<i32>("n").as_deref(), Some(&1));
    }

    #[test]
    fn drop_unsubscribes() {
        let store = Store::new();
        let (host, _) = counting_host();
        let mut state = use_shared_state(&store, "n", host, UseOptions::new().initial(1_i32));
        state.on_mount();
        let id = state.id();

        drop(state);
        assert!(!store.is_subscribed("n", id));
    }

    #[test]
    fn write_rerenders_host_and_updates_view() {
        let store = Store::new();
        let (host, renders) = counting_host();
        let mut state = use_shared_state(&store, "n", host, UseOptions::new().initial(1_i32));
        state.on_mount();

        state.render().setter().set(2);
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(state.render().value(), Some(&2));

        state.render().setter().set(2);
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn selector_isolates_rerenders() {
        let store = Store::new();
        store.set("doc", doc(0, "a"));

        let (host, renders) = counting_host();
        let mut state = use_shared_state(
            &store,
            "doc",
            host,
            UseOptions::new().selector(|d: Option<&Doc>| d.map(|d| d.text.clone())),
        );
        state.on_mount();

        store.set("doc", doc(1, "a"));
        assert_eq!(renders.load(Ordering::SeqCst), 0);
        // The memoized view is still the one from the last projection change.
        assert_eq!(state.render().value(), Some(&doc(0, "a")));
        assert_eq!(state.render().get().as_deref(), Some(&doc(1, "a")));

        store.set("doc", doc(1, "b"));
        assert_eq!(renders.load(Ordering::SeqCst), 1);
        assert_eq!(state.render().value(), Some(&doc(1, "b")));
    }

    #[test]
    fn rebind_moves_subscription() {
        let store = Store::new();
        store.set("a", 1_i32);
        store.set("b", 2_i32);

        let (host, renders) = counting_host();
        let mut state: SharedState<i32> = use_consumer(&store, "a", host, None);
        state.on_mount();

        state.rebind("b");
        assert_eq!(state.render().value(), Some(&2));
        state.on_dependency_change();

        assert!(!store.is_subscribed("a", state.id()));
        assert!(store.is_subscribed("b", state.id()));

        store.set("a", 10_i32);
        assert_eq!(renders.load(Ordering::SeqCst), 0);
        store.set("b", 20_i32);
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn remount_after_unmount_resubscribes() {
        let store = Store::new();
        let (host, renders) = counting_host();
        let mut state = use_shared_state(&store, "n", host, UseOptions::new().initial(0_i32));

        state.on_mount();
        state.on_unmount();
        state.on_mount();

        store.set("n", 1_i32);
        assert_eq!(renders.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn setter_updates_and_refreshes() {
        let store = Store::new();
        let (host, renders) = counting_host();
        let mut state = use_shared_state(&store, "n", host, UseOptions::new().initial(1_i32));
        state.on_mount();

        let (_, setter) = state.render().into_parts();
        setter
            .update(|prev: Option<&i32>| Next::Value(prev.copied().unwrap_or(0) + 1))
            .unwrap();
        setter.refresh();

        assert_eq!(store.get::<i32>("n").as_deref(), Some(&2));
        assert_eq!(renders.load(Ordering::SeqCst), 2);
    }
}
