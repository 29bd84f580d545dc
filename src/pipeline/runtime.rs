//! Runtime - The explicit link between components and their renderer.
//!
//! The source of truth for "request a redraw" is not a process-wide global:
//! every component instance carries a [`Runtime`] handle, and tests can
//! build one around a fake renderer. The runtime owns the deferred task
//! queue and the redraw coalescing state.
//!
//! # Redraw flow
//!
//! 1. A staging call (or `force_update`) asks for a redraw.
//! 2. At most one redraw task is queued at a time; further requests before
//!    it runs coalesce into it. A `force` request is sticky across
//!    coalescing.
//! 3. When the task runs it clears the queued flag *first* (staging during
//!    the pass schedules the next pass), raises the forced-pass flag for the
//!    duration of the host call, and invokes the host's redraw trigger.
//! 4. The host synchronously re-evaluates live component views; callbacks
//!    those evaluations defer run after the pass, in FIFO order.
//!
//! The renderer is held weakly: the embedding application owns it, and
//! redraw requests after it is gone degrade to logged no-ops.

use std::cell::Cell;
use std::rc::{Rc, Weak};

use tracing::{trace, warn};

use crate::renderer::RendererHandle;

use super::scheduler::Scheduler;

/// Cheaply clonable handle to the shared runtime.
#[derive(Clone)]
pub struct Runtime {
    inner: Rc<RuntimeInner>,
}

struct RuntimeInner {
    renderer: Weak<dyn RendererHandle>,
    scheduler: Scheduler,
    redraw_queued: Cell<bool>,
    force_pending: Cell<bool>,
    pass_forced: Cell<bool>,
}

impl Runtime {
    /// Build a runtime around a host renderer.
    ///
    /// The renderer is downgraded to a weak reference; the caller keeps
    /// ownership.
    pub fn new<R: RendererHandle + 'static>(renderer: &Rc<R>) -> Self {
        Self::from_weak(Rc::downgrade(renderer))
    }

    /// Build a runtime from an already-weak renderer reference. Lets a
    /// renderer that owns its runtime construct both in one cycle-free step.
    pub(crate) fn from_weak<R: RendererHandle + 'static>(renderer: Weak<R>) -> Self {
        let renderer: Weak<dyn RendererHandle> = renderer;
        Self {
            inner: Rc::new(RuntimeInner {
                renderer,
                scheduler: Scheduler::new(),
                redraw_queued: Cell::new(false),
                force_pending: Cell::new(false),
                pass_forced: Cell::new(false),
            }),
        }
    }

    /// Queue a deferred task behind everything already queued.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.inner.scheduler.defer(task);
    }

    /// Drain the deferred queue (one tick of the cooperative loop).
    ///
    /// Runs any queued redraw pass and every callback scheduled alongside
    /// or during it, in order.
    pub fn flush(&self) {
        self.inner.scheduler.flush();
    }

    /// Request a (deferred, coalesced) redraw pass from the host renderer.
    pub fn request_redraw(&self, force: bool) {
        if force {
            self.inner.force_pending.set(true);
        }
        if self.inner.redraw_queued.replace(true) {
            trace!(force, "redraw request coalesced");
            return;
        }
        let inner = Rc::clone(&self.inner);
        self.inner.scheduler.defer(move || {
            inner.redraw_queued.set(false);
            let forced = inner.force_pending.replace(false);
            let Some(renderer) = inner.renderer.upgrade() else {
                warn!("redraw requested after the renderer was dropped");
                return;
            };
            inner.pass_forced.set(forced);
            if let Err(err) = renderer.redraw(forced) {
                warn!(%err, "host renderer failed to redraw");
            }
            inner.pass_forced.set(false);
        });
    }

    /// Whether the redraw pass currently executing is a forced pass.
    ///
    /// True only while the host is inside `RendererHandle::redraw(true)`;
    /// view evaluations consult this to bypass the update-approval hook.
    pub fn pass_forced(&self) -> bool {
        self.inner.pass_forced.get()
    }

    /// Number of deferred tasks currently queued.
    pub fn queued_tasks(&self) -> usize {
        self.inner.scheduler.len()
    }
}

// =============================================================================
// Tests
// =============================================================================
