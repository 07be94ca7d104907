//! Memo Implementation
//!
//! A Memo caches an observer's computed output and decides, on each
//! notification, whether that output must be recomputed.
//!
//! # How Memos Work
//!
//! 1. On construction, the memo computes its output and, if it has a
//!    selector, the projection of the current dependency value.
//!
//! 2. On `diff_changes`, a memo without a selector always recomputes.
//!
//! 3. A memo with a selector projects the dependency again and compares the
//!    new projection with the cached one using [`ShallowEq`]. Only if they
//!    differ does it recompute the output and report a change.
//!
//! # Why This Matters
//!
//! Many observers can watch one large slot and each re-renders only when
//! the part it selected changed:
//!
//! - A slot holds `{ count, text }`
//! - Observer A selects `text`, observer B selects `count`
//! - Writing a new `count` recomputes B only; A's memo reports no change

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use super::equality::ShallowEq;

/// A type-erased selector projection.
///
/// Implemented for every `ShallowEq + Send + Sync + 'static` type, so any
/// such value can be returned from a selector.
pub trait Projection: Any + Send + Sync {
    /// Shallow comparison against another projection. Projections of
    /// different types are never equal.
    fn same_as(&self, other: &dyn Projection) -> bool;

    #[doc(hidden)]
    fn as_any(&self) -> &dyn Any;
}

impl<P> Projection for P
where
    P: ShallowEq + Send + Sync + 'static,
{
    fn same_as(&self, other: &dyn Projection) -> bool {
        other
            .as_any()
            .downcast_ref::<P>()
            .is_some_and(|other| self.shallow_eq(other))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// A pure function narrowing a value of type `D` to the part an observer
/// cares about.
///
/// The selector receives `None` when the slot is absent or empty.
pub struct Selector<D: ?Sized> {
    project: Arc<dyn Fn(Option<&D>) -> Box<dyn Projection> + Send + Sync>,
}

impl<D: ?Sized> Selector<D> {
    /// Wrap a projection function.
    pub fn new<P, F>(f: F) -> Self
    where
        P: ShallowEq + Send + Sync + 'static,
        F: Fn(Option<&D>) -> P + Send + Sync + 'static,
    {
        Self {
            project: Arc::new(move |value| Box::new(f(value)) as Box<dyn Projection>),
        }
    }

    /// Project `value`.
    pub fn project(&self, value: Option<&D>) -> Box<dyn Projection> {
        (self.project)(value)
    }
}

impl<D: ?Sized> Clone for Selector<D> {
    fn clone(&self) -> Self {
        Self {
            project: Arc::clone(&self.project),
        }
    }
}

impl<D: ?Sized> fmt::Debug for Selector<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Selector(..)")
    }
}

/// Outcome of [`Memo::diff_changes`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Diff {
    /// The output was recomputed.
    Changed,

    /// The projection was unchanged; the cached output stands.
    Unchanged,
}

impl Diff {
    pub fn is_changed(self) -> bool {
        self == Diff::Changed
    }
}

type Producer<O> = Box<dyn Fn() -> O + Send + Sync>;
type DependencySource<D> = Box<dyn Fn() -> Option<Arc<D>> + Send + Sync>;
type ChangeHook<O> = Box<dyn Fn(&O, &O) + Send + Sync>;

/// Cached observer output with selector-based change detection.
///
/// # Type Parameters
///
/// - `O`: the computed output, e.g. a `(value, setter)` view or rendered
///   content.
/// - `D`: the dependency value the selector projects, usually the slot value.
pub struct Memo<O, D> {
    /// Computes the full output.
    current: Producer<O>,

    /// Reads the value the selector projects.
    dependency: DependencySource<D>,

    selector: Option<Selector<D>>,

    /// Called with `(old, new)` whenever the output is recomputed.
    on_change: Option<ChangeHook<O>>,

    /// The cached output.
    output: O,

    /// The cached projection (None without a selector).
    projection: Option<Box<dyn Projection>>,

    /// Number of recomputations after construction.
    recompute_count: usize,
}

impl<O, D> Memo<O, D> {
    /// Create a memo, computing its output and priming its projection.
    pub fn new<C, S>(current: C, dependency: S, selector: Option<Selector<D>>) -> Self
    where
        C: Fn() -> O + Send + Sync + 'static,
        S: Fn() -> Option<Arc<D>> + Send + Sync + 'static,
    {
        let projection = selector
            .as_ref()
            .map(|selector| selector.project(dependency().as_deref()));
        let output = current();

        Self {
            current: Box::new(current),
            dependency: Box::new(dependency),
            selector,
            on_change: None,
            output,
            projection,
            recompute_count: 0,
        }
    }

    /// Register a callback invoked with `(old, new)` on every recomputation.
    pub fn on_change<F>(mut self, f: F) -> Self
    where
        F: Fn(&O, &O) + Send + Sync + 'static,
    {
        self.on_change = Some(Box::new(f));
        self
    }

    /// Re-evaluate after a notification.
    ///
    /// Without a selector the output is always recomputed. With one, it is
    /// recomputed only if the new projection is not shallow-equal to the
    /// cached one.
    pub fn diff_changes(&mut self) -> Diff {
        if let Some(selector) = &self.selector {
            let next = selector.project((self.dependency)().as_deref());
            let unchanged = self
                .projection
                .as_deref()
                .is_some_and(|prev| prev.same_as(next.as_ref()));
            self.projection = Some(next);

            if unchanged {
                return Diff::Unchanged;
            }
        }

        let next = (self.current)();
        if let Some(on_change) = &self.on_change {
            on_change(&self.output, &next);
        }
        self.output = next;
        self.recompute_count += 1;
        Diff::Changed
    }

    /// The cached output.
    pub fn output(&self) -> &O {
        &self.output
    }

    pub fn has_selector(&self) -> bool {
        self.selector.is_some()
    }

    /// Number of recomputations since construction.
    pub fn recompute_count(&self) -> usize {
        self.recompute_count
    }
}

impl<O: fmt::Debug, D> fmt::Debug for Memo<O, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Memo")
            .field("output", &self.output)
            .field("has_selector", &self.has_selector())
            .field("recompute_count", &self.recompute_count)
            .finish()
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
