//! Stateful component instances.
//!
//! A [`Component`] is the persistent identity the host renderer lacks: the
//! host re-invokes a stateless view function every redraw pass, and this
//! handle carries the committed props/state, the staged updates, and the
//! lifecycle sequencing across those passes.
//!
//! The handle is cheaply clonable; clones share one instance. All per-
//! instance data lives in the module-private instance store - nothing of
//! the staging machinery leaks through the public surface.
//!
//! # Modules
//!
//! - `lifecycle` - the fixed hook interface components implement
//! - `staging` - the set_state/set_props staging protocol
//! - `view` - the per-redraw view evaluation state machine
//! - `store` - private per-instance storage

mod lifecycle;
mod staging;
mod store;
mod view;

pub use lifecycle::{spec_of, ComponentSpec, Lifecycle};
pub use staging::StageInput;

use std::cell::RefCell;
use std::rc::Rc;

use crate::pipeline::Runtime;
use crate::renderer::{ComponentNode, DomHandle, Vnode};
use crate::types::{merge_into, merged, Bag};

use store::{InstanceFlags, InstanceStore};

/// Handle to a stateful component instance.
#[derive(Clone)]
pub struct Component {
    inner: Rc<Inner>,
}

struct Inner {
    behavior: Box<dyn Lifecycle>,
    store: RefCell<InstanceStore>,
    runtime: Runtime,
}

impl Component {
    /// Construct an instance with caller-supplied props.
    ///
    /// Committed props are the behavior's declared defaults shallow-merged
    /// with `props` (overlapping keys win); committed state is exactly
    /// `initial_state`.
    pub fn new(behavior: Box<dyn Lifecycle>, props: Bag, runtime: &Runtime) -> Self {
        Self::with_options(behavior, props, Bag::new(), Vec::new(), runtime)
    }

    /// Construct an instance with an inherited child-context mapping and
    /// child content.
    pub fn with_options(
        behavior: Box<dyn Lifecycle>,
        props: Bag,
        context: Bag,
        children: Vec<Vnode>,
        runtime: &Runtime,
    ) -> Self {
        let mut committed = behavior.default_props();
        merge_into(&mut committed, &props);
        let state = behavior.initial_state(&committed);
        Self {
            inner: Rc::new(Inner {
                store: RefCell::new(InstanceStore::new(committed, state, context, children)),
                behavior,
                runtime: runtime.clone(),
            }),
        }
    }

    // =========================================================================
    // Committed Values
    // =========================================================================

    /// The committed props. The returned `Rc` is a stable snapshot: later
    /// commits replace the instance's mapping instead of mutating it.
    pub fn props(&self) -> Rc<Bag> {
        Rc::clone(&self.inner.store.borrow().props)
    }

    /// The committed state. Same snapshot semantics as [`Component::props`].
    pub fn state(&self) -> Rc<Bag> {
        Rc::clone(&self.inner.store.borrow().state)
    }

    /// Copy of the child-context mapping this instance was constructed with.
    pub fn context(&self) -> Bag {
        self.inner.store.borrow().context.clone()
    }

    /// Copy of the child content this instance was constructed with.
    pub fn children(&self) -> Vec<Vnode> {
        self.inner.store.borrow().children.clone()
    }

    // =========================================================================
    // Imperative Surface
    // =========================================================================

    /// Request an unconditional re-render of the entire tree. The update-
    /// approval hook is bypassed for every instance evaluated in that pass.
    pub fn force_update(&self) {
        self.inner.runtime.request_redraw(true);
    }

    /// Whether the instance is currently mounted: its output has been
    /// attached and the unload notification has not fired yet.
    pub fn is_mounted(&self) -> bool {
        let flags = self.inner.store.borrow().flags;
        flags.contains(InstanceFlags::HAS_MOUNTED) && !flags.contains(InstanceFlags::UNMOUNTED)
    }

    /// Host handle of the mounted output, or `None` before first mount.
    pub fn dom_node(&self) -> Option<DomHandle> {
        self.inner.store.borrow().root.clone()
    }

    /// Build a descendant component node.
    ///
    /// The node carries a copy of this instance's context merged with its
    /// `child_context` hook, plus the given props - descendants never hold
    /// references into the parent's live objects.
    pub fn child(&self, spec: Rc<dyn ComponentSpec>, props: Bag) -> Vnode {
        let context = self.inner.store.borrow().context.clone();
        let context = merged(&context, &self.inner.behavior.child_context(self));
        Vnode::Component(ComponentNode {
            spec,
            props,
            context,
        })
    }

    /// The runtime this instance schedules through.
    pub fn runtime(&self) -> &Runtime {
        &self.inner.runtime
    }

    // =========================================================================
    // Internal
    // =========================================================================

    fn has_mounted(&self) -> bool {
        self.inner
            .store
            .borrow()
            .flags
            .contains(InstanceFlags::HAS_MOUNTED)
    }

    fn mark_mounted(&self) {
        self.inner
            .store
            .borrow_mut()
            .flags
            .insert(InstanceFlags::HAS_MOUNTED);
    }

    fn record_root(&self, handle: DomHandle) {
        self.inner.store.borrow_mut().root = Some(handle);
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::renderer::{HostContext, RendererHandle};
    use serde_json::json;
    use std::cell::Cell;
    use std::io;

    // =========================================================================
    // Probe Behavior
    // =========================================================================

    /// Lifecycle implementation that counts every hook invocation. Clones
    /// share their counters, so a clone handed to `Component::new` stays
    /// observable from the test.
    #[derive(Clone, Default)]
    pub(crate) struct Probe {
        pub(crate) renders: Rc<Cell<usize>>,
        pub(crate) approvals: Rc<Cell<usize>>,
        pub(crate) approve: Rc<Cell<bool>>,
        pub(crate) will_mounts: Rc<Cell<usize>>,
        pub(crate) did_mounts: Rc<Cell<usize>>,
        pub(crate) will_updates: Rc<Cell<usize>>,
        pub(crate) did_updates: Rc<Cell<usize>>,
        pub(crate) will_unmounts: Rc<Cell<usize>>,
        pub(crate) received_props: Rc<RefCell<Option<Bag>>>,
        pub(crate) prev_props: Rc<RefCell<Option<Bag>>>,
        pub(crate) prev_state: Rc<RefCell<Option<Bag>>>,
    }

    impl Probe {
        pub(crate) fn new() -> Self {
            let probe = Self::default();
            probe.approve.set(true);
            probe
        }
    }

    fn bump(cell: &Cell<usize>) {
        cell.set(cell.get() + 1);
    }

    impl Lifecycle for Probe {
        fn render(&self, _cx: &Component) -> Vnode {
            bump(&self.renders);
            Vnode::element("box").into()
        }

        fn should_update(&self, _props: &Bag, _state: &Bag) -> bool {
            bump(&self.approvals);
            self.approve.get()
        }

        fn will_mount(&self, _cx: &Component) {
            bump(&self.will_mounts);
        }

        fn did_mount(&self, _cx: &Component) {
            bump(&self.did_mounts);
        }

        fn will_receive_props(&self, _cx: &Component, next: &Bag) {
            *self.received_props.borrow_mut() = Some(next.clone());
        }

        fn will_update(&self, _cx: &Component, _props: &Bag, _state: &Bag) {
            bump(&self.will_updates);
        }

        fn did_update(&self, _cx: &Component, prev_props: &Bag, prev_state: &Bag) {
            bump(&self.did_updates);
            *self.prev_props.borrow_mut() = Some(prev_props.clone());
            *self.prev_state.borrow_mut() = Some(prev_state.clone());
        }

        fn will_unmount(&self, _cx: &Component) {
            bump(&self.will_unmounts);
        }
    }

    /// Probe with a custom render function.
    struct RenderProbe<F> {
        probe: Probe,
        render: F,
    }

    impl<F: Fn(&Component) -> Vnode> Lifecycle for RenderProbe<F> {
        fn render(&self, cx: &Component) -> Vnode {
            bump(&self.probe.renders);
            (self.render)(cx)
        }

        fn should_update(&self, props: &Bag, state: &Bag) -> bool {
            self.probe.should_update(props, state)
        }
    }

    // =========================================================================
    // Harness Helpers
    // =========================================================================

    /// Runtime whose renderer is already gone: redraw requests degrade to
    /// no-ops and tests drive `view()` by hand.
    pub(crate) fn offline_runtime() -> Runtime {
        struct Null;
        impl RendererHandle for Null {
            fn redraw(&self, _force: bool) -> io::Result<()> {
                Ok(())
            }
        }
        let renderer = Rc::new(Null);
        Runtime::new(&renderer)
    }

    pub(crate) fn probe_component(runtime: &Runtime, props: Bag) -> (Component, Probe) {
        let probe = Probe::new();
        let component = Component::new(Box::new(probe.clone()), props, runtime);
        (component, probe)
    }

    pub(crate) fn probe_component_with_render(
        runtime: &Runtime,
        props: Bag,
        render: impl Fn(&Component) -> Vnode + 'static,
    ) -> (Component, Probe) {
        let probe = Probe::new();
        let behavior = RenderProbe {
            probe: probe.clone(),
            render,
        };
        let component = Component::new(Box::new(behavior), props, runtime);
        (component, probe)
    }

    /// Simulate the host mounting one view evaluation: call `view()` and
    /// invoke the wired config hook. Returns the host context so tests can
    /// fire the unload channel.
    pub(crate) fn mount(cx: &Component) -> Rc<HostContext> {
        let node = cx.view();
        let host = Rc::new(HostContext::new());
        let handle = DomHandle::new(0u32);
        if let Some(hook) = node.config_hook() {
            hook(&handle, false, &host, &node);
        }
        host
    }

    /// Minimal single-root host renderer: every redraw evaluates the root's
    /// view and invokes its config hook with a stable node identity.
    pub(crate) struct ViewDriver {
        root: RefCell<Option<Component>>,
        host: Rc<HostContext>,
        handle: DomHandle,
        initialized: Cell<bool>,
    }

    impl ViewDriver {
        pub(crate) fn set_root(&self, component: Component) {
            *self.root.borrow_mut() = Some(component);
        }
    }

    impl RendererHandle for ViewDriver {
        fn redraw(&self, _force: bool) -> io::Result<()> {
            let Some(component) = self.root.borrow().clone() else {
                return Ok(());
            };
            let node = component.view();
            if let Some(hook) = node.config_hook() {
                hook(&self.handle, self.initialized.replace(true), &self.host, &node);
            }
            Ok(())
        }
    }

    pub(crate) fn driver() -> (Runtime, Rc<ViewDriver>) {
        let renderer = Rc::new(ViewDriver {
            root: RefCell::new(None),
            host: Rc::new(HostContext::new()),
            handle: DomHandle::new(0u32),
            initialized: Cell::new(false),
        });
        let runtime = Runtime::new(&renderer);
        (runtime, renderer)
    }

    // =========================================================================
    // Construction Tests
    // =========================================================================

    struct Defaults;

    impl Lifecycle for Defaults {
        fn default_props(&self) -> Bag {
            crate::types::as_bag(json!({"x": 1, "kept": true}))
        }

        fn initial_state(&self, props: &Bag) -> Bag {
            crate::types::as_bag(json!({"from_props": props["x"]}))
        }

        fn render(&self, _cx: &Component) -> Vnode {
            Vnode::element("box").into()
        }
    }

    #[test]
    fn test_construction_merges_defaults() {
        let runtime = offline_runtime();
        let props = crate::types::as_bag(json!({"x": 7, "y": 2}));
        let cx = Component::new(Box::new(Defaults), props, &runtime);

        // Overlapping keys override, the rest of the defaults survive
        assert_eq!(*cx.props(), crate::types::as_bag(json!({"x": 7, "kept": true, "y": 2})));
        // Initial state sees the merged props and is committed exactly
        assert_eq!(*cx.state(), crate::types::as_bag(json!({"from_props": 7})));
    }

    #[test]
    fn test_construction_without_explicit_values() {
        let runtime = offline_runtime();
        let cx = Component::new(Box::new(Defaults), Bag::new(), &runtime);
        assert_eq!(*cx.props(), crate::types::as_bag(json!({"x": 1, "kept": true})));
        assert_eq!(*cx.state(), crate::types::as_bag(json!({"from_props": 1})));
    }

    #[test]
    fn test_committed_snapshots_never_observe_later_commits() {
        let runtime = offline_runtime();
        let (cx, _probe) = probe_component(&runtime, Bag::new());
        mount(&cx);

        let before = cx.state();
        cx.set_state(json!({"a": 1}));
        let _ = cx.view();

        assert!(before.is_empty());
        assert_eq!(cx.state()["a"], json!(1));
    }

    #[test]
    fn test_dom_node_is_none_before_mount() {
        let runtime = offline_runtime();
        let (cx, _probe) = probe_component(&runtime, Bag::new());
        assert!(cx.dom_node().is_none());
        assert!(!cx.is_mounted());
        mount(&cx);
        assert!(cx.dom_node().is_some());
        assert!(cx.is_mounted());
    }

    #[test]
    fn test_child_nodes_carry_context_copies() {
        let runtime = offline_runtime();

        struct Parent;
        impl Lifecycle for Parent {
            fn render(&self, _cx: &Component) -> Vnode {
                Vnode::element("box").into()
            }
            fn child_context(&self, _cx: &Component) -> Bag {
                crate::types::as_bag(json!({"theme": "dark"}))
            }
        }

        let inherited = crate::types::as_bag(json!({"locale": "en", "theme": "light"}));
        let cx = Component::with_options(
            Box::new(Parent),
            Bag::new(),
            inherited,
            Vec::new(),
            &runtime,
        );

        let node = cx.child(spec_of::<Probe>(), crate::types::as_bag(json!({"p": 1})));
        let Vnode::Component(child) = node else {
            panic!("expected component node");
        };
        // Hook output wins over inherited context; props travel as given
        assert_eq!(child.context, crate::types::as_bag(json!({"locale": "en", "theme": "dark"})));
        assert_eq!(child.props, crate::types::as_bag(json!({"p": 1})));
        // The parent's own context is untouched
        assert_eq!(cx.context()["theme"], json!("light"));
    }
}
