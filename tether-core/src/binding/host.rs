//! Host Capabilities
//!
//! The rendering framework is an external collaborator. Bindings need two
//! things from it:
//!
//! - a way to ask for the current component instance to be rendered again
//!   ([`Host::schedule_rerender`]), and
//! - lifecycle calls at the right moments, which the framework adapter makes
//!   on the binding through [`Lifecycle`].
//!
//! Anything that can run `Fn()` is a host, so a closure that flips a flag or
//! pushes onto an update queue is enough to drive the bindings in tests.

/// The framework primitive that re-renders one component instance.
pub trait Host: Send + Sync + 'static {
    /// Request a render pass for this instance.
    ///
    /// May run synchronously or defer; bindings never hold locks across it.
    fn schedule_rerender(&self);
}

impl<F> Host for F
where
    F: Fn() + Send + Sync + 'static,
{
    fn schedule_rerender(&self) {
        self()
    }
}

/// Lifecycle calls the framework adapter makes on a binding.
pub trait Lifecycle {
    /// The instance finished mounting.
    fn on_mount(&mut self);

    /// A render pass finished and the binding's dependencies may differ from
    /// the previous pass.
    fn on_dependency_change(&mut self);

    /// The instance is about to unmount.
    fn on_unmount(&mut self);
}
