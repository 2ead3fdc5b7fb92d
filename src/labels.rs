//! Shared row-key and column-label helpers for rendered views.
//!
//! Field names arrive in whatever casing the dataset uses (`unit_price`,
//! `orderId`); headers shown to the user are derived here. Row keys are
//! never shown — they only give each rendered row a stable identity.

use serde_json::Value;

/// Placeholder shown for missing or null cell values.
pub const EMPTY_CELL: &str = "—";

/// Row fields checked, in order, when deriving a row identity key.
const KEY_FIELDS: [&str; 3] = ["id", "sku", "key"];

/// Derive a display label from a raw field name.
///
/// Underscores become spaces, a space is inserted at each lowercase→uppercase
/// boundary, and every word is capitalized: `unit_price` → `Unit Price`,
/// `orderId` → `Order Id`.
#[must_use]
pub fn column_label(field: &str) -> String {
    let mut spaced = String::with_capacity(field.len() + 4);
    let mut prev_lower = false;
    for ch in field.chars() {
        if ch == '_' {
            spaced.push(' ');
            prev_lower = false;
        } else {
            if prev_lower && ch.is_uppercase() {
                spaced.push(' ');
            }
            prev_lower = ch.is_lowercase();
            spaced.push(ch);
        }
    }

    spaced
        .split_whitespace()
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Stable identity key for a row: prefer `id`, then `sku`, then `key`,
/// falling back to the row's position (`row-{index}`).
#[must_use]
pub fn row_key(row: &Value, index: usize) -> String {
    if let Some(obj) = row.as_object() {
        for field in KEY_FIELDS {
            match obj.get(field) {
                Some(Value::String(s)) if !s.is_empty() => return s.clone(),
                Some(Value::Number(n)) => return n.to_string(),
                _ => {}
            }
        }
    }
    format!("row-{index}")
}

/// Format a cell value for display. Missing and null values render as an
/// em-dash placeholder, not an empty string.
#[must_use]
pub fn format_cell(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => EMPTY_CELL.to_string(),
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(other) => other.to_string(),
    }
}

#[cfg(test)]
#[path = "labels_test.rs"]
mod tests;
