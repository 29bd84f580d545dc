//! View evaluation - The per-redraw state machine.
//!
//! The host renderer invokes [`Component::view`] once per redraw pass per
//! live instance. The instance is in one of two states:
//!
//! - **First render** (`HAS_MOUNTED` unset): render unconditionally, wire
//!   the output node, return it. Pending values and the approval hook are
//!   not consulted.
//! - **Update** (`HAS_MOUNTED` set): read the effective pending values,
//!   consult the approval hook (bypassed on a forced pass), commit, then
//!   either re-render or return [`Vnode::Retain`]. The commit happens in
//!   both cases - gating only decides whether `render` runs again.
//!
//! Wiring wraps the output element's config hook. The wrapper records the
//! host handle, drives the mount-once sequencing, claims the unload
//! channel, and then delegates to whatever hook the user's `render` already
//! attached.

use std::rc::Rc;

use tracing::{debug, trace};

use crate::renderer::{DomHandle, HostContext, Vnode};
use crate::types::merge_into;

use super::store::InstanceFlags;
use super::Component;

impl Component {
    /// One view evaluation. Called by the host renderer.
    pub fn view(&self) -> Vnode {
        if !self.has_mounted() {
            trace!("first render");
            let mut node = self.inner.behavior.render(self);
            self.wire(&mut node);
            return node;
        }

        // Update path. Even with nothing staged the approval hook and the
        // commit are exercised: redraws can be forced externally.
        let (effective_props, effective_state, had_pending) = {
            let store = self.inner.store.borrow();
            (
                store.effective_props(),
                store.effective_state(),
                store.pending_props.is_some() || store.pending_state.is_some(),
            )
        };

        let forced = self.inner.runtime.pass_forced();
        let approved = forced
            || self
                .inner
                .behavior
                .should_update(&effective_props, &effective_state);

        if approved {
            self.inner
                .behavior
                .will_update(self, &effective_props, &effective_state);
        }

        // Commit: replace the committed mappings, clear the staged ones.
        {
            let mut store = self.inner.store.borrow_mut();
            let mut props = (*store.props).clone();
            merge_into(&mut props, &effective_props);
            store.props = Rc::new(props);
            let mut state = (*store.state).clone();
            merge_into(&mut state, &effective_state);
            store.state = Rc::new(state);
            store.pending_props = None;
            store.pending_state = None;
        }

        // One post-update notification per consuming evaluation, however
        // many staging calls coalesced into it. The snapshot captured here
        // predates the commit, so the callback sees true before/after.
        if had_pending {
            let (prev_props, prev_state) = {
                let store = self.inner.store.borrow();
                (Rc::clone(&store.prev_props), Rc::clone(&store.prev_state))
            };
            let cx = self.clone();
            self.inner.runtime.defer(move || {
                cx.inner.behavior.did_update(&cx, &prev_props, &prev_state);
            });
        }

        if approved {
            let mut node = self.inner.behavior.render(self);
            self.wire(&mut node);
            node
        } else {
            trace!("update gated; retaining previous subtree");
            Vnode::Retain
        }
    }

    // =========================================================================
    // Output-Node Wiring
    // =========================================================================

    /// Wrap the output node's config hook with the lifecycle sequencing.
    ///
    /// Runs for every fresh output node, in both view states. The wrapper
    /// delegates to the previously attached hook with the original
    /// arguments, so wiring composes with config hooks set by `render`.
    fn wire(&self, node: &mut Vnode) {
        let Vnode::Element(element) = node else {
            trace!("output node has no config slot; skipping lifecycle wiring");
            return;
        };
        let previous = element.config.take();
        let cx = self.clone();
        element.config = Some(Rc::new(move |handle: &DomHandle,
                                            initialized: bool,
                                            host: &HostContext,
                                            node: &Vnode| {
            cx.record_root(handle.clone());

            // Mount-once sequencing gates on our own flag, never on the
            // host's `initialized` flag.
            if !cx.has_mounted() {
                cx.inner.behavior.will_mount(&cx);
                if !cx.has_mounted() {
                    cx.mark_mounted();
                    debug!("mounted");
                    let mounted = cx.clone();
                    cx.inner.runtime.defer(move || {
                        mounted.inner.behavior.did_mount(&mounted);
                    });
                }
            }

            // Claim the single-slot unload channel on every invocation; the
            // notifier itself fires at most once.
            let unload = cx.clone();
            host.set_onunload(move || unload.notify_unmount());

            if let Some(previous) = &previous {
                previous(handle, initialized, host, node);
            }
        }));
    }

    /// The pre-unmount notification. Fires `will_unmount` exactly once and
    /// marks the instance unmounted.
    fn notify_unmount(&self) {
        if self
            .inner
            .store
            .borrow()
            .flags
            .contains(InstanceFlags::UNMOUNTED)
        {
            return;
        }
        debug!("unmounting");
        self.inner.behavior.will_unmount(self);
        self.inner
            .store
            .borrow_mut()
            .flags
            .insert(InstanceFlags::UNMOUNTED);
    }
}

// =============================================================================
// Tests
// =============================================================================
