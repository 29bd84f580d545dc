//! Headless renderer - An in-memory host for tests and examples.
//!
//! Implements the host side of the boundary without any output device:
//! a node arena keyed by tree path, persistent per-path component instances
//! and host contexts (node identity), config-hook invocation with a correct
//! `already_initialized` flag, and the unload channel fired for nodes that
//! disappear between passes.
//!
//! This is deliberately *not* a rendering engine: every pass re-walks the
//! whole tree, and "diffing" is nothing more than path identity.
//! [`Vnode::Retain`] is honored by keeping the previous subtree's entries
//! alive without touching them.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::io;
use std::rc::{Rc, Weak};

use tracing::{debug, trace};

use crate::component::{Component, ComponentSpec};
use crate::error::{Error, Result};
use crate::pipeline::Runtime;
use crate::types::{merged, Bag};

use super::handle::RendererHandle;
use super::vnode::{ComponentNode, DomHandle, HostContext, Vnode};

/// Payload behind every [`DomHandle`] this renderer hands out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeadlessNode {
    pub id: u64,
    pub tag: String,
}

/// Per-path bookkeeping: the node identity the host preserves across passes.
struct Entry {
    handle: DomHandle,
    host: Rc<HostContext>,
    initialized: bool,
    component: Option<Component>,
    live: bool,
}

/// In-memory host renderer.
pub struct Headless {
    runtime: Runtime,
    root: RefCell<Option<Component>>,
    entries: RefCell<HashMap<String, Entry>>,
    next_id: Cell<u64>,
    passes: Cell<u64>,
}

impl Headless {
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Headless>| Headless {
            runtime: Runtime::from_weak(weak.clone()),
            root: RefCell::new(None),
            entries: RefCell::new(HashMap::new()),
            next_id: Cell::new(0),
            passes: Cell::new(0),
        })
    }

    /// The runtime driving this renderer.
    pub fn runtime(&self) -> Runtime {
        self.runtime.clone()
    }

    /// Mount a root component and run the initial pass.
    pub fn mount(&self, spec: Rc<dyn ComponentSpec>, props: Bag) -> Result<Component> {
        if self.root.borrow().is_some() {
            return Err(Error::AlreadyMounted);
        }
        let component = Component::new(spec.instantiate(), props, &self.runtime);
        *self.root.borrow_mut() = Some(component.clone());
        debug!("mounting root");
        self.runtime.request_redraw(false);
        self.runtime.flush();
        Ok(component)
    }

    /// Tear the tree down, firing every claimed unload hook (deepest paths
    /// first), and drain whatever the unload callbacks deferred.
    pub fn unmount(&self) -> Result<()> {
        if self.root.borrow_mut().take().is_none() {
            return Err(Error::NotMounted);
        }
        debug!("unmounting root");
        let mut removed: Vec<(String, Rc<HostContext>)> = self
            .entries
            .borrow_mut()
            .drain()
            .map(|(path, entry)| (path, entry.host))
            .collect();
        removed.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        for (path, host) in removed {
            if let Some(unload) = host.take_onunload() {
                trace!(%path, "unload");
                unload();
            }
        }
        self.runtime.flush();
        Ok(())
    }

    /// Number of redraw passes performed so far.
    pub fn passes(&self) -> u64 {
        self.passes.get()
    }

    /// Number of node identities currently alive.
    pub fn live_nodes(&self) -> usize {
        self.entries.borrow().len()
    }

    // =========================================================================
    // Pass
    // =========================================================================

    fn perform_pass(&self) -> io::Result<()> {
        let Some(root) = self.root.borrow().clone() else {
            return Ok(());
        };
        self.passes.set(self.passes.get() + 1);
        trace!(pass = self.passes.get(), "redraw pass");

        for entry in self.entries.borrow_mut().values_mut() {
            entry.live = false;
        }

        let node = root.view();
        self.place(&node, "0");
        self.sweep();
        Ok(())
    }

    /// Walk one vnode into the arena at `path`.
    fn place(&self, node: &Vnode, path: &str) {
        match node {
            Vnode::Element(element) => {
                let (handle, host, initialized) = self.ensure_node(path, &element.tag);
                if let Some(hook) = &element.config {
                    hook(&handle, initialized, &host, node);
                }
                for (index, child) in element.children.iter().enumerate() {
                    self.place(child, &format!("{path}/{index}"));
                }
            }
            Vnode::Text(_) => {}
            Vnode::Component(component) => {
                let instance = self.ensure_component(path, component);
                let output = instance.view();
                if matches!(output, Vnode::Retain) {
                    self.keep_subtree(path);
                } else {
                    self.place(&output, &format!("{path}/c"));
                }
            }
            Vnode::Retain => {
                self.keep_subtree(path);
            }
        }
    }

    /// Entry for an element node: reuse the path's identity or allocate one.
    /// Returns the handle, the host context, and whether the identity was
    /// already initialized before this call.
    fn ensure_node(&self, path: &str, tag: &str) -> (DomHandle, Rc<HostContext>, bool) {
        let mut entries = self.entries.borrow_mut();
        let entry = entries.entry(path.to_string()).or_insert_with(|| {
            let id = self.next_id.get();
            self.next_id.set(id + 1);
            Entry {
                handle: DomHandle::new(HeadlessNode {
                    id,
                    tag: tag.to_string(),
                }),
                host: Rc::new(HostContext::new()),
                initialized: false,
                component: None,
                live: false,
            }
        });
        entry.live = true;
        let initialized = entry.initialized;
        entry.initialized = true;
        (entry.handle.clone(), Rc::clone(&entry.host), initialized)
    }

    /// Instance for a component node: reuse the path's instance or build it
    /// from the node's specification. Changed props on an existing instance
    /// are staged through the regular protocol.
    fn ensure_component(&self, path: &str, node: &ComponentNode) -> Component {
        let existing = {
            let mut entries = self.entries.borrow_mut();
            match entries.get_mut(path) {
                Some(entry) => {
                    entry.live = true;
                    entry.component.clone()
                }
                None => None,
            }
        };
        if let Some(instance) = existing {
            let current = instance.props();
            if merged(&current, &node.props) != *current {
                instance.set_props(node.props.clone());
            }
            return instance;
        }

        let instance = Component::with_options(
            node.spec.instantiate(),
            node.props.clone(),
            node.context.clone(),
            Vec::new(),
            &self.runtime,
        );
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        self.entries.borrow_mut().insert(
            path.to_string(),
            Entry {
                handle: DomHandle::new(HeadlessNode {
                    id,
                    tag: "#component".to_string(),
                }),
                host: Rc::new(HostContext::new()),
                initialized: true,
                component: Some(instance.clone()),
                live: true,
            },
        );
        instance
    }

    /// Keep a retained subtree's identities alive without touching them.
    fn keep_subtree(&self, path: &str) {
        let prefix = format!("{path}/");
        for (key, entry) in self.entries.borrow_mut().iter_mut() {
            if key == path || key.starts_with(&prefix) {
                entry.live = true;
            }
        }
    }

    /// Remove every identity the walk did not visit, firing unload hooks
    /// deepest-first.
    fn sweep(&self) {
        let mut removed: Vec<(String, Rc<HostContext>)> = Vec::new();
        self.entries.borrow_mut().retain(|path, entry| {
            if entry.live {
                true
            } else {
                removed.push((path.clone(), Rc::clone(&entry.host)));
                false
            }
        });
        removed.sort_by(|a, b| b.0.len().cmp(&a.0.len()));
        for (path, host) in removed {
            if let Some(unload) = host.take_onunload() {
                trace!(%path, "unload");
                unload();
            }
        }
    }
}

impl RendererHandle for Headless {
    fn redraw(&self, _force: bool) -> io::Result<()> {
        self.perform_pass()
    }
}

// =============================================================================
// Tests
// =============================================================================
