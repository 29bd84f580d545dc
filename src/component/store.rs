//! Instance store - Private per-instance storage.
//!
//! Everything an instance carries between redraw passes lives here, behind
//! module visibility: committed and pending props/state, the previous-value
//! snapshots, the root output handle, and the status flags. Nothing in this
//! file is reachable through the public surface - consumers only ever see
//! `Rc` clones of the committed values.

use std::rc::Rc;

use bitflags::bitflags;

use crate::renderer::{DomHandle, Vnode};
use crate::types::Bag;

bitflags! {
    /// Per-instance status bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub(super) struct InstanceFlags: u8 {
        /// Set on the first config-hook invocation, never cleared.
        /// Distinguishes the initial-render path from the update path and
        /// gates mount-only callbacks.
        const HAS_MOUNTED = 1 << 0;
        /// Set when the unload notification fires.
        const UNMOUNTED = 1 << 1;
    }
}

pub(super) struct InstanceStore {
    /// Committed props. Replaced wholesale on commit, never mutated through
    /// the `Rc`, so clones handed out earlier never observe later commits.
    pub(super) props: Rc<Bag>,
    /// Committed state. Same replacement discipline as `props`.
    pub(super) state: Rc<Bag>,
    /// Staged props; `None` means nothing staged (absent, not empty).
    pub(super) pending_props: Option<Bag>,
    /// Staged state; `None` means nothing staged.
    pub(super) pending_state: Option<Bag>,
    /// Committed props as of the most recent staging call.
    pub(super) prev_props: Rc<Bag>,
    /// Committed state as of the most recent staging call.
    pub(super) prev_state: Rc<Bag>,
    /// Host handle of the mounted output; `None` before first mount.
    pub(super) root: Option<DomHandle>,
    pub(super) flags: InstanceFlags,
    /// Opaque child-context mapping, passed through to descendants.
    pub(super) context: Bag,
    /// Child content given at construction.
    pub(super) children: Vec<Vnode>,
}

impl InstanceStore {
    pub(super) fn new(props: Bag, state: Bag, context: Bag, children: Vec<Vnode>) -> Self {
        let props = Rc::new(props);
        let state = Rc::new(state);
        Self {
            prev_props: Rc::clone(&props),
            prev_state: Rc::clone(&state),
            props,
            state,
            pending_props: None,
            pending_state: None,
            root: None,
            flags: InstanceFlags::empty(),
            context,
            children,
        }
    }

    /// Effective pending props: pending if present, else a copy of committed.
    pub(super) fn effective_props(&self) -> Bag {
        self.pending_props
            .clone()
            .unwrap_or_else(|| (*self.props).clone())
    }

    /// Effective pending state: pending if present, else a copy of committed.
    pub(super) fn effective_state(&self) -> Bag {
        self.pending_state
            .clone()
            .unwrap_or_else(|| (*self.state).clone())
    }
}
