//! Renderer handle - The redraw trigger boundary.
//!
//! The component system never talks to a concrete renderer. It holds a
//! [`RendererHandle`] through the runtime and asks it to re-evaluate all
//! live component views; the host decides when and how the pass actually
//! happens. Tests substitute a fake (see [`super::headless`]).

use std::io;

/// The host renderer's redraw trigger.
///
/// `redraw(force)` asks the host to re-evaluate every live component view.
/// A forced pass additionally bypasses each instance's update-approval hook
/// for the duration of the pass.
///
/// Redraw is idempotent: re-evaluating all live instances is always safe to
/// repeat, so callers may coalesce or repeat requests freely.
pub trait RendererHandle {
    fn redraw(&self, force: bool) -> io::Result<()>;
}
