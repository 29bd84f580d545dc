//! # spark-components
//!
//! Stateful components for immediate-mode renderers.
//!
//! An immediate-mode virtual-node renderer re-invokes a stateless view
//! function on every redraw pass. This crate layers persistent identity on
//! top of that model: each component instance keeps committed props/state
//! across passes, stages updates through a merge/approve/commit protocol,
//! and announces its life through a fixed, exactly-once hook sequence.
//!
//! The host renderer stays external - it owns diffing, output mutation,
//! and redraw scheduling, and is reached only through the boundary types in
//! [`renderer`].
//!
//! ## Architecture
//!
//! ```text
//! host renderer → Component::view → (staging protocol commits) → render()
//!      ↑                                                            │
//!      │ Runtime.request_redraw (deferred, coalesced)               ▼
//! set_state/set_props ← application code          output node (config hook
//!                                                  wired for mount/unmount)
//! ```
//!
//! ## Modules
//!
//! - [`component`] - instances, lifecycle hooks, update staging, view
//!   evaluation
//! - [`pipeline`] - deferred task queue and the runtime linking components
//!   to their renderer
//! - [`renderer`] - vnodes, the host boundary contracts, and a headless
//!   test host
//! - [`types`] - dynamic mappings and shallow-merge semantics
//!
//! ## Example
//!
//! ```
//! use serde_json::json;
//! use spark_components::{as_bag, spec_of, Bag, Component, Headless, Lifecycle, Vnode};
//!
//! #[derive(Default)]
//! struct Counter;
//!
//! impl Lifecycle for Counter {
//!     fn initial_state(&self, _props: &Bag) -> Bag {
//!         as_bag(json!({"count": 0}))
//!     }
//!
//!     fn render(&self, cx: &Component) -> Vnode {
//!         let count = cx.state()["count"].clone();
//!         Vnode::element("box")
//!             .child(Vnode::text(format!("clicked {count} times")))
//!             .into()
//!     }
//! }
//!
//! let renderer = Headless::new();
//! let counter = renderer.mount(spec_of::<Counter>(), Bag::new()).unwrap();
//!
//! counter.set_state(json!({"count": 1}));
//! renderer.runtime().flush();
//! assert_eq!(counter.state()["count"], json!(1));
//! ```

pub mod component;
pub mod error;
pub mod pipeline;
pub mod renderer;
pub mod types;

// Re-export commonly used items
pub use component::{spec_of, Component, ComponentSpec, Lifecycle, StageInput};
pub use error::{Error, Result};
pub use pipeline::{Runtime, Scheduler};
pub use renderer::{
    ComponentNode, ConfigHook, DomHandle, ElementNode, Headless, HeadlessNode, HostContext,
    RendererHandle, UnloadHook, Vnode,
};
pub use types::{as_bag, merge_into, merged, Bag, Value};
