//! Virtual nodes - The currency exchanged with the host renderer.
//!
//! The core never interprets a vnode tree. It produces nodes from user
//! `render` implementations, reads and augments the `config` slot on element
//! nodes, and hands everything else through untouched. Diffing and output
//! mutation belong to the host renderer.
//!
//! # Node identity
//!
//! The host calls a node's config hook once when the node is first mounted
//! (`already_initialized == false`) and again on every subsequent patch of
//! the same node identity (`already_initialized == true`). Mount-only
//! effects must therefore be gated by the component's own mounted flag, not
//! by the host's flag - the two are related but not identical.

use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use crate::component::ComponentSpec;
use crate::types::{Bag, Value};

// =============================================================================
// Host Handles
// =============================================================================

/// Opaque handle to a mounted output node in the host environment.
///
/// The host decides the concrete payload; the core only stores and returns
/// it. Cloning is cheap (reference-counted).
#[derive(Clone)]
pub struct DomHandle(Rc<dyn Any>);

impl DomHandle {
    /// Wrap a host-side payload.
    pub fn new<T: 'static>(payload: T) -> Self {
        Self(Rc::new(payload))
    }

    /// Borrow the payload as a concrete type, if it is one.
    pub fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        self.0.downcast_ref()
    }
}

impl fmt::Debug for DomHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("DomHandle(..)")
    }
}

/// Callback fired by the host when a node leaves the tree.
pub type UnloadHook = Box<dyn FnOnce()>;

/// Per-node-identity host object handed to config hooks.
///
/// Exposes the single-slot unload channel: assigning a new unload hook
/// replaces the previous one, and the host takes and fires the hook exactly
/// once when the node is removed.
#[derive(Default)]
pub struct HostContext {
    onunload: RefCell<Option<UnloadHook>>,
}

impl HostContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Assign the unload hook, replacing any previous assignment.
    pub fn set_onunload(&self, hook: impl FnOnce() + 'static) {
        *self.onunload.borrow_mut() = Some(Box::new(hook));
    }

    /// Take the unload hook out of the slot (host side, at teardown).
    pub fn take_onunload(&self) -> Option<UnloadHook> {
        self.onunload.borrow_mut().take()
    }

    /// Whether an unload hook is currently assigned.
    pub fn has_onunload(&self) -> bool {
        self.onunload.borrow().is_some()
    }
}

// =============================================================================
// Config Hook
// =============================================================================

/// Hook the host invokes at mount and at every subsequent patch of the same
/// node identity: `(dom_handle, already_initialized, host_context, node)`.
pub type ConfigHook = Rc<dyn Fn(&DomHandle, bool, &HostContext, &Vnode)>;

// =============================================================================
// Vnode
// =============================================================================

/// A virtual node handed to the host renderer.
#[derive(Clone)]
pub enum Vnode {
    /// An element: tag, attrs, children, and an optional config hook.
    Element(ElementNode),
    /// Plain text content.
    Text(String),
    /// A nested component to be instantiated and driven by the host.
    Component(ComponentNode),
    /// Sentinel: retain the previously rendered subtree unchanged. The host
    /// must not re-diff the retained subtree.
    Retain,
}

impl Vnode {
    /// Start building an element node.
    pub fn element(tag: impl Into<String>) -> ElementNode {
        ElementNode::new(tag)
    }

    /// Build a text node.
    pub fn text(content: impl Into<String>) -> Vnode {
        Vnode::Text(content.into())
    }

    /// The element config hook, if this node is an element and has one.
    pub fn config_hook(&self) -> Option<&ConfigHook> {
        match self {
            Vnode::Element(element) => element.config.as_ref(),
            _ => None,
        }
    }
}

impl fmt::Debug for Vnode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Vnode::Element(element) => f
                .debug_struct("Element")
                .field("tag", &element.tag)
                .field("children", &element.children.len())
                .finish(),
            Vnode::Text(content) => f.debug_tuple("Text").field(content).finish(),
            Vnode::Component(_) => f.write_str("Component(..)"),
            Vnode::Retain => f.write_str("Retain"),
        }
    }
}

/// An element vnode: `{tag, attrs, children, config}`.
#[derive(Clone)]
pub struct ElementNode {
    pub tag: String,
    pub attrs: Bag,
    pub children: Vec<Vnode>,
    pub config: Option<ConfigHook>,
}

impl ElementNode {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            attrs: Bag::new(),
            children: Vec::new(),
            config: None,
        }
    }

    /// Set an attr (builder pattern).
    pub fn attr(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attrs.insert(key.into(), value.into());
        self
    }

    /// Add a child (builder pattern).
    pub fn child(mut self, child: impl Into<Vnode>) -> Self {
        self.children.push(child.into());
        self
    }

    /// Add children (builder pattern).
    pub fn children<I>(mut self, children: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<Vnode>,
    {
        self.children.extend(children.into_iter().map(Into::into));
        self
    }

    /// Attach a config hook (builder pattern).
    pub fn config(mut self, hook: impl Fn(&DomHandle, bool, &HostContext, &Vnode) + 'static) -> Self {
        self.config = Some(Rc::new(hook));
        self
    }
}

impl From<ElementNode> for Vnode {
    fn from(element: ElementNode) -> Self {
        Vnode::Element(element)
    }
}

impl From<&str> for Vnode {
    fn from(content: &str) -> Self {
        Vnode::Text(content.to_string())
    }
}

/// A nested component node: the descendant specification plus copies of the
/// props and child-context it is constructed with. The copies guarantee a
/// descendant can never mutate its parent's live objects.
#[derive(Clone)]
pub struct ComponentNode {
    pub spec: Rc<dyn ComponentSpec>,
    pub props: Bag,
    pub context: Bag,
}

// =============================================================================
// Tests
// =============================================================================
