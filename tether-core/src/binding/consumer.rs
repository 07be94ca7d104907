//! Declarative consumer.
//!
//! A [`Consumer`] is the component form of [`use_consumer`]: it binds to one
//! slot and produces its children either as a fixed value or by calling a
//! render function with the slot's value. Children are cached in a [`Memo`]
//! that shares the binding's selector, so a render pass only rebuilds them
//! when the selected part of the slot changed.

use std::fmt;
use std::sync::Arc;

use super::hook::{use_consumer, SharedState};
use super::host::{Host, Lifecycle};
use crate::reactive::{Memo, Selector, ShallowEq, Store};

type RenderFn<T, R> = Box<dyn Fn(Option<&T>) -> R + Send + Sync>;

/// What a [`Consumer`] renders.
pub enum Children<T, R> {
    /// Fixed content, independent of the slot value.
    Static(R),

    /// Content computed from the slot value (`None` while the slot is empty).
    Render(RenderFn<T, R>),
}

impl<T, R: Clone> Children<T, R> {
    pub fn render<F>(f: F) -> Self
    where
        F: Fn(Option<&T>) -> R + Send + Sync + 'static,
    {
        Children::Render(Box::new(f))
    }

    fn produce(&self, value: Option<&T>) -> R {
        match self {
            Children::Static(content) => content.clone(),
            Children::Render(f) => f(value),
        }
    }
}

impl<T, R: fmt::Debug> fmt::Debug for Children<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Children::Static(content) => f.debug_tuple("Static").field(content).finish(),
            Children::Render(_) => f.write_str("Render(..)"),
        }
    }
}

/// A mounted consumer of one slot.
pub struct Consumer<T, R> {
    state: SharedState<T>,
    children: Memo<R, T>,
}

impl<T, R> Consumer<T, R>
where
    T: ShallowEq + Send + Sync + 'static,
    R: Clone + Send + Sync + 'static,
{
    pub fn new<H: Host>(
        store: &Store,
        key: impl Into<String>,
        host: H,
        selector: Option<Selector<T>>,
        children: Children<T, R>,
    ) -> Self {
        let state = use_consumer(store, key, host, selector.clone());

        let children = Arc::new(children);
        let (view, dep_view) = (state.view_memo(), state.view_memo());
        let children = Memo::new(
            move || children.produce(view.lock().output().value()),
            move || dep_view.lock().output().value_arc(),
            selector,
        );

        Self { state, children }
    }

    /// Produce the children for this render pass.
    pub fn render(&mut self) -> R {
        self.state.render();
        self.children.diff_changes();
        self.children.output().clone()
    }

    pub fn key(&self) -> &str {
        self.state.key()
    }

    pub fn is_subscribed(&self) -> bool {
        self.state.is_subscribed()
    }

    /// Number of times the children were rebuilt after the first render.
    pub fn rebuild_count(&self) -> usize {
        self.children.recompute_count()
    }
}

impl<T, R> Lifecycle for Consumer<T, R>
where
    T: ShallowEq + Send + Sync + 'static,
{
    fn on_mount(&mut self) {
        self.state.on_mount();
    }

    fn on_dependency_change(&mut self) {
        self.state.on_dependency_change();
    }

    fn on_unmount(&mut self) {
        self.state.on_unmount();
    }
}

impl<T, R: fmt::Debug> fmt::Debug for Consumer<T, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Consumer")
            .field("state", &self.state)
            .field("children", &self.children.output())
            .finish()
    }
}
