//! Lifecycle interface - The fixed set of user-overridable hooks.
//!
//! Components implement [`Lifecycle`] and override the subset of hooks they
//! need; everything except `render` has a default no-op (or true-returning)
//! implementation. Dispatch is static over this known interface - there is
//! no dynamic method lookup.
//!
//! # Hook order
//!
//! For one instance over its lifetime:
//!
//! ```text
//! default_props / initial_state      (construction)
//! render                             (first view evaluation)
//! will_mount -> did_mount            (first config-hook invocation;
//!                                     did_mount is deferred past the pass)
//! will_receive_props                 (each set_props call)
//! should_update                      (each staging call, notification only;
//!                                     each update evaluation, gating)
//! will_update -> render              (approved update evaluations)
//! did_update                         (deferred past the consuming pass)
//! will_unmount                       (unload notification, exactly once)
//! ```

use crate::renderer::Vnode;
use crate::types::Bag;

use super::Component;

/// The fixed lifecycle-hook interface.
///
/// `render` is the only mandatory method: a component without output is a
/// definition error, and the compiler rejects it up front.
pub trait Lifecycle {
    /// Declared default props, merged under caller-supplied values at
    /// construction.
    fn default_props(&self) -> Bag {
        Bag::new()
    }

    /// Declared initial state. Receives the already-merged committed props.
    fn initial_state(&self, _props: &Bag) -> Bag {
        Bag::new()
    }

    /// Produce the output node for the current committed props/state.
    fn render(&self, cx: &Component) -> Vnode;

    /// Update-approval hook: decide whether a pending update re-renders.
    ///
    /// Invoked with the effective pending props and state. During staging
    /// the return value is ignored (pure notification); during an update
    /// evaluation `false` retains the previous subtree. The commit happens
    /// either way.
    fn should_update(&self, _props: &Bag, _state: &Bag) -> bool {
        true
    }

    /// About to mount: fires inside the first config-hook invocation,
    /// before the mounted flag is set.
    fn will_mount(&self, _cx: &Component) {}

    /// Mounted: deferred until after the pass that mounted the output.
    fn did_mount(&self, _cx: &Component) {}

    /// New props were staged via `set_props`; receives the merged pending
    /// candidate.
    fn will_receive_props(&self, _cx: &Component, _next: &Bag) {}

    /// An approved update evaluation is about to commit and re-render;
    /// receives the effective pending props and state.
    fn will_update(&self, _cx: &Component, _props: &Bag, _state: &Bag) {}

    /// A staged update was committed; receives the committed values as they
    /// were immediately before the staging call that triggered the update.
    /// Deferred until after the consuming pass.
    fn did_update(&self, _cx: &Component, _prev_props: &Bag, _prev_state: &Bag) {}

    /// The output node is leaving the tree. Fires exactly once.
    fn will_unmount(&self, _cx: &Component) {}

    /// Context mapping handed to descendants built through
    /// [`Component::child`], merged over the instance's own context.
    fn child_context(&self, _cx: &Component) -> Bag {
        Bag::new()
    }
}

// =============================================================================
// Component Specifications
// =============================================================================

/// A descendant component specification: something that can manufacture a
/// fresh behavior instance each time the host mounts the node.
pub trait ComponentSpec {
    fn instantiate(&self) -> Box<dyn Lifecycle>;
}

impl<F> ComponentSpec for F
where
    F: Fn() -> Box<dyn Lifecycle>,
{
    fn instantiate(&self) -> Box<dyn Lifecycle> {
        self()
    }
}

/// Specification for a behavior type constructible via `Default`.
pub fn spec_of<C>() -> std::rc::Rc<dyn ComponentSpec>
where
    C: Lifecycle + Default + 'static,
{
    std::rc::Rc::new(|| Box::new(C::default()) as Box<dyn Lifecycle>)
}
