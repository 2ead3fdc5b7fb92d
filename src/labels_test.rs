use super::*;
use serde_json::json;

// =========================================================================
// column_label
// =========================================================================

#[test]
fn label_splits_underscores() {
    assert_eq!(column_label("unit_price"), "Unit Price");
}

#[test]
fn label_splits_camel_case() {
    assert_eq!(column_label("orderId"), "Order Id");
}

#[test]
fn label_capitalizes_single_word() {
    assert_eq!(column_label("name"), "Name");
    assert_eq!(column_label("sku"), "Sku");
}

#[test]
fn label_handles_mixed_separators() {
    assert_eq!(column_label("avg_order_value"), "Avg Order Value");
    assert_eq!(column_label("lifetimeValue_usd"), "Lifetime Value Usd");
}

#[test]
fn label_empty_field_is_empty() {
    assert_eq!(column_label(""), "");
}

// =========================================================================
// row_key
// =========================================================================

#[test]
fn row_key_prefers_id() {
    let row = json!({"id": "SO-1001", "sku": "X1"});
    assert_eq!(row_key(&row, 0), "SO-1001");
}

#[test]
fn row_key_numeric_id() {
    let row = json!({"id": 42, "name": "A"});
    assert_eq!(row_key(&row, 0), "42");
}

#[test]
fn row_key_falls_back_to_sku() {
    let row = json!({"sku": "X1", "price": 3});
    assert_eq!(row_key(&row, 0), "X1");
}

#[test]
fn row_key_falls_back_to_key_field() {
    let row = json!({"key": "k-9", "price": 3});
    assert_eq!(row_key(&row, 5), "k-9");
}

#[test]
fn row_key_positional_fallback() {
    let row = json!({"price": 3});
    assert_eq!(row_key(&row, 2), "row-2");
}

#[test]
fn row_key_non_object_row_is_positional() {
    assert_eq!(row_key(&json!("scalar"), 7), "row-7");
}

// =========================================================================
// format_cell
// =========================================================================

#[test]
fn cell_missing_renders_dash() {
    assert_eq!(format_cell(None), EMPTY_CELL);
}

#[test]
fn cell_null_renders_dash() {
    assert_eq!(format_cell(Some(&Value::Null)), EMPTY_CELL);
}

#[test]
fn cell_string_is_verbatim() {
    assert_eq!(format_cell(Some(&json!("Lunar Lamp"))), "Lunar Lamp");
}

#[test]
fn cell_number_and_bool() {
    assert_eq!(format_cell(Some(&json!(49.0))), "49.0");
    assert_eq!(format_cell(Some(&json!(125))), "125");
    assert_eq!(format_cell(Some(&json!(true))), "true");
}
