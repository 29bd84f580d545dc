//! Scheduling pipeline.
//!
//! Connects staging calls to the host renderer's redraw trigger:
//!
//! ```text
//! set_state/set_props -> Runtime.request_redraw -> deferred queue
//!                         -> host redraw pass -> deferred callbacks
//! ```
//!
//! Everything here is single-threaded and cooperative: "concurrency" means
//! interleaving of deferred callbacks across redraw passes, never threads.

pub mod runtime;
pub mod scheduler;

pub use runtime::Runtime;
pub use scheduler::{Scheduler, Task};
