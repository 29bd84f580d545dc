//! Update staging - The merge/stage/notify/schedule pipeline.
//!
//! `set_state` and `set_props` never apply anything directly. They merge
//! the input onto the staged value, notify the approval hook, and defer a
//! coalesced redraw; the commit happens in the next view evaluation (see
//! [`Component::view`]). This lets any number of synchronously-following
//! staging calls collapse into one commit and one re-render.
//!
//! Staging is total: inputs that are not mappings (and function inputs that
//! do not return mappings) degrade to the empty partial mapping.

use std::rc::Rc;

use tracing::trace;

use crate::types::{as_bag, merge_into, Bag, Value};

use super::Component;

// =============================================================================
// Stage Input
// =============================================================================

/// Input to a staging call: a literal partial mapping, or a function of the
/// current values producing one.
pub enum StageInput {
    /// Literal partial mapping. Non-object values degrade to empty.
    Map(Value),
    /// `(current_state, current_props) -> partial`. The arguments are the
    /// effective values: staged-but-uncommitted data is visible, so staged
    /// updates compose. A non-object return degrades to empty.
    With(Box<dyn FnOnce(&Bag, &Bag) -> Value>),
}

impl StageInput {
    /// Function-form input.
    pub fn with(f: impl FnOnce(&Bag, &Bag) -> Value + 'static) -> Self {
        StageInput::With(Box::new(f))
    }

    fn resolve(self, state: &Bag, props: &Bag) -> Bag {
        let value = match self {
            StageInput::Map(value) => value,
            StageInput::With(f) => f(state, props),
        };
        if !value.is_object() && !value.is_null() {
            trace!("staging input is not a mapping; degrading to empty");
        }
        as_bag(value)
    }
}

impl From<Value> for StageInput {
    fn from(value: Value) -> Self {
        StageInput::Map(value)
    }
}

impl From<Bag> for StageInput {
    fn from(bag: Bag) -> Self {
        StageInput::Map(Value::Object(bag))
    }
}

/// Which of the two staged mappings a call targets.
#[derive(Clone, Copy, Debug)]
enum Field {
    Props,
    State,
}

// =============================================================================
// Staging Entry Points
// =============================================================================

impl Component {
    /// Stage a state update. Applied at the next view evaluation.
    pub fn set_state(&self, input: impl Into<StageInput>) {
        self.stage(Field::State, input.into(), None);
    }

    /// Stage a state update with a completion callback. The callback runs
    /// after the redraw pass the update was scheduled with, bound to this
    /// instance.
    pub fn set_state_then(
        &self,
        input: impl Into<StageInput>,
        done: impl FnOnce(&Component) + 'static,
    ) {
        self.stage(Field::State, input.into(), Some(Box::new(done)));
    }

    /// Stage a props update. Applied at the next view evaluation.
    pub fn set_props(&self, input: impl Into<StageInput>) {
        self.stage(Field::Props, input.into(), None);
    }

    /// Stage a props update with a completion callback.
    pub fn set_props_then(
        &self,
        input: impl Into<StageInput>,
        done: impl FnOnce(&Component) + 'static,
    ) {
        self.stage(Field::Props, input.into(), Some(Box::new(done)));
    }

    // =========================================================================
    // Protocol
    // =========================================================================

    /// The staging pipeline, identical shape for props and state:
    /// snapshot, resolve, merge, stage, notify, schedule.
    fn stage(&self, field: Field, input: StageInput, done: Option<Box<dyn FnOnce(&Component)>>) {
        if self.inner.store.borrow().flags.contains(super::store::InstanceFlags::UNMOUNTED) {
            trace!(?field, "staging on an unmounted instance");
        }

        // 1. Snapshot the committed value; read the effective values the
        //    input resolves against. The store borrow must not be held while
        //    user code runs.
        let (effective_state, effective_props) = {
            let mut store = self.inner.store.borrow_mut();
            match field {
                Field::Props => store.prev_props = Rc::clone(&store.props),
                Field::State => store.prev_state = Rc::clone(&store.state),
            }
            (store.effective_state(), store.effective_props())
        };

        // 2. Resolve the input (may invoke a user closure).
        let partial = input.resolve(&effective_state, &effective_props);
        trace!(?field, keys = partial.len(), "staged update");

        // 3-5. Merge onto the still-pending value (or a copy of committed)
        //      and store the candidate; read back the joint effective pair.
        let (effective_props, effective_state) = {
            let mut store = self.inner.store.borrow_mut();
            match field {
                Field::Props => {
                    let mut candidate = store.effective_props();
                    merge_into(&mut candidate, &partial);
                    store.pending_props = Some(candidate);
                }
                Field::State => {
                    let mut candidate = store.effective_state();
                    merge_into(&mut candidate, &partial);
                    store.pending_state = Some(candidate);
                }
            }
            (store.effective_props(), store.effective_state())
        };

        // 6. Notify. New props announce themselves first; the approval hook
        //    is a pure notification here - its return value only matters
        //    during view evaluation.
        if let Field::Props = field {
            self.inner
                .behavior
                .will_receive_props(self, &effective_props);
        }
        let _ = self
            .inner
            .behavior
            .should_update(&effective_props, &effective_state);

        // 7-8. Defer the redraw request and the completion callback, in that
        //      order, so the callback observes the pass it was staged with.
        self.inner.runtime.request_redraw(false);
        if let Some(done) = done {
            let cx = self.clone();
            self.inner.runtime.defer(move || done(&cx));
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::super::tests::{mount, offline_runtime, probe_component};
    use super::*;
    use serde_json::json;

    #[test]
    fn test_double_staging_merges_onto_pending() {
        let runtime = offline_runtime();
        let (cx, probe) = probe_component(&runtime, Bag::new());
        mount(&cx);

        cx.set_state(json!({"a": 1}));
        cx.set_state(json!({"b": 2}));

        // Nothing committed yet
        assert!(cx.state().is_empty());
        // One view evaluation commits both keys at once
        let _ = cx.view();
        assert_eq!(cx.state()["a"], json!(1));
        assert_eq!(cx.state()["b"], json!(2));
        runtime.flush();
        assert_eq!(probe.did_updates.get(), 1);
    }

    #[test]
    fn test_function_input_sees_staged_values() {
        let runtime = offline_runtime();
        let (cx, _probe) = probe_component(&runtime, Bag::new());
        mount(&cx);

        cx.set_state(json!({"c": 3}));
        cx.set_state(StageInput::with(|state, _props| {
            json!({"c": state["c"].as_i64().unwrap() + 1})
        }));

        let _ = cx.view();
        assert_eq!(cx.state()["c"], json!(4));
    }

    #[test]
    fn test_malformed_input_degrades() {
        let runtime = offline_runtime();
        let (cx, _probe) = probe_component(&runtime, Bag::new());
        mount(&cx);

        cx.set_state(json!(42));
        cx.set_state(StageInput::with(|_, _| json!("not a mapping")));

        let _ = cx.view();
        assert!(cx.state().is_empty());
    }

    #[test]
    fn test_staging_notifies_approval_hook() {
        let runtime = offline_runtime();
        let (cx, probe) = probe_component(&runtime, Bag::new());

        cx.set_state(json!({"a": 1}));
        // Notification happened at staging time, before any evaluation
        assert_eq!(probe.approvals.get(), 1);
    }

    #[test]
    fn test_set_props_fires_will_receive_props() {
        let runtime = offline_runtime();
        let (cx, probe) = probe_component(&runtime, Bag::new());

        cx.set_props(json!({"x": 9}));
        assert_eq!(probe.received_props.borrow().as_ref().unwrap()["x"], json!(9));
        // State staging does not fire it
        cx.set_state(json!({"a": 1}));
        assert_eq!(probe.approvals.get(), 2);
    }

    #[test]
    fn test_completion_callback_runs_after_redraw_task() {
        let runtime = offline_runtime();
        let (cx, probe) = probe_component(&runtime, Bag::new());

        let seen = std::rc::Rc::new(std::cell::Cell::new(usize::MAX));
        {
            let seen = seen.clone();
            let probe = probe.clone();
            cx.set_state_then(json!({"a": 1}), move |_cx| {
                seen.set(probe.renders.get());
            });
        }
        // Without a renderer the redraw task is a no-op, but the callback
        // still runs in queue order after it.
        runtime.flush();
        assert_eq!(seen.get(), 0);
    }
}
