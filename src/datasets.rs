//! Dataset normalizer — canonical name→rows mapping from a loose payload.
//!
//! DESIGN
//! ======
//! The model's data payload has no fixed shape: a bare array for the common
//! single-table case, a mapping of named arrays for multi-source layouts, or
//! an object with one nested array buried among scalar entries. All of that
//! ambiguity is absorbed here, as one pure function with a documented
//! precedence order, so the interpreter can always do an exact-name lookup
//! and never sees a missing entry.

use std::collections::BTreeMap;

use serde_json::Value;
use tracing::warn;

use crate::layout::LayoutNode;

/// Key used for payloads that arrive without a source name.
pub const DEFAULT_SOURCE: &str = "data";

/// Canonical form: source name → ordered rows. Every source name referenced
/// by the layout tree has an entry (possibly empty) after [`normalize`].
pub type NormalizedDatasets = BTreeMap<String, Vec<Value>>;

/// Resolve a raw dataset bundle against the sources a layout tree references.
///
/// Precedence:
/// 1. a bare array bundle is keyed under `"data"`; an object bundle is
///    copied entry by entry, each value coerced with [`coerce_rows`];
/// 2. if a `"data"` entry exists and the tree references exactly one source
///    that has no entry yet, the entry is aliased to that source;
/// 3. a non-empty `legacy_fallback` array fills `"data"` when no sources are
///    referenced, fills the single referenced source when it has no entry
///    yet, or fills `"data"` when the mapping is otherwise completely empty;
/// 4. every referenced source still missing gets an empty vec;
/// 5. an entirely empty mapping defaults to `{"data": []}`.
#[must_use]
pub fn normalize(
    tree: Option<&LayoutNode>,
    bundle: Option<&Value>,
    legacy_fallback: Option<&Value>,
) -> NormalizedDatasets {
    let mut datasets = NormalizedDatasets::new();

    match bundle {
        Some(Value::Array(rows)) => {
            datasets.insert(DEFAULT_SOURCE.to_string(), rows.clone());
        }
        Some(Value::Object(map)) => {
            for (name, value) in map {
                datasets.insert(name.clone(), coerce_rows(value));
            }
        }
        _ => {}
    }

    let sources = tree.map(LayoutNode::collect_sources).unwrap_or_default();

    // Single-source aliasing: a bare "data" payload binds to the one source
    // the tree actually asks for.
    if sources.len() == 1 {
        let name = sources.iter().next().cloned().unwrap_or_default();
        if !datasets.contains_key(&name) {
            if let Some(rows) = datasets.get(DEFAULT_SOURCE) {
                let rows = rows.clone();
                datasets.insert(name, rows);
            }
        }
    }

    // Legacy fallback payloads (the older single-array `data` field).
    if let Some(Value::Array(fallback)) = legacy_fallback {
        if !fallback.is_empty() {
            if sources.is_empty() {
                datasets
                    .entry(DEFAULT_SOURCE.to_string())
                    .or_insert_with(|| fallback.clone());
            } else if sources.len() == 1 {
                let name = sources.iter().next().cloned().unwrap_or_default();
                datasets.entry(name).or_insert_with(|| fallback.clone());
            } else if datasets.is_empty() {
                datasets.insert(DEFAULT_SOURCE.to_string(), fallback.clone());
            }
        }
    }

    // Every referenced source resolves, even if only to an empty sequence.
    for name in sources {
        datasets.entry(name).or_default();
    }

    if datasets.is_empty() {
        datasets.insert(DEFAULT_SOURCE.to_string(), Vec::new());
    }

    datasets
}

/// Coerce one bundle value into an ordered row sequence.
///
/// Arrays pass through unchanged. Non-array objects use the first array
/// entry found in a forward scan of their values (later arrays are ignored);
/// objects without a nested array flatten to their own values. Anything else
/// yields an empty sequence.
#[must_use]
pub fn coerce_rows(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(rows) => rows.clone(),
        Value::Object(map) => {
            let mut arrays = map.values().filter(|v| v.is_array());
            if let Some(Value::Array(rows)) = arrays.next() {
                if arrays.next().is_some() {
                    warn!("dataset object has multiple nested arrays; using the first");
                }
                rows.clone()
            } else {
                map.values().cloned().collect()
            }
        }
        _ => Vec::new(),
    }
}

#[cfg(test)]
#[path = "datasets_test.rs"]
mod tests;
