//! Core types - Dynamic mappings and merge semantics.
//!
//! Props, state, attrs, and the child-context are all string-keyed dynamic
//! mappings ([`Bag`]). The whole update model is built on *shallow* merge:
//! per-key replacement where the right-hand side wins, never a deep merge.

use serde_json::Map;

pub use serde_json::Value;

/// A string-keyed dynamic mapping.
///
/// Used for committed and pending props/state, vnode attrs, and the
/// child-context. Values are [`serde_json::Value`], so anything a host
/// environment can express crosses the boundary unchanged.
pub type Bag = Map<String, Value>;

// =============================================================================
// Shallow Merge
// =============================================================================

/// Shallow-merge `overlay` into `target`, per key, right-hand side wins.
pub fn merge_into(target: &mut Bag, overlay: &Bag) {
    for (key, value) in overlay {
        target.insert(key.clone(), value.clone());
    }
}

/// Return a new mapping: `base` shallow-merged with `overlay`.
pub fn merged(base: &Bag, overlay: &Bag) -> Bag {
    let mut result = base.clone();
    merge_into(&mut result, overlay);
    result
}

/// Interpret a value as a partial mapping.
///
/// Anything that is not an object degrades to the empty mapping, so staging
/// inputs never fail.
pub fn as_bag(value: Value) -> Bag {
    match value {
        Value::Object(map) => map,
        _ => Bag::new(),
    }
}

// =============================================================================
// Tests
// =============================================================================
