//! Tool catalog offered to the model by the layout agent.
//!
//! Each tool returns a layout/datasets payload (or a Text layout for
//! errors) that the agent folds into its running result. Execution lives in
//! `services::agent`; this module only defines names and schemas.

use serde_json::json;

use super::types::Tool;

/// Sources the schema advertises for dataset-bound tools.
const SOURCE_NAMES: [&str; 5] = ["products", "sales", "customers", "orders", "order_items"];

/// Full tool set for the layout agent.
#[must_use]
pub fn layout_tools() -> Vec<Tool> {
    vec![
        Tool {
            name: "build_table_layout".into(),
            description: "Build a page with a table bound to a named dataset. Use for 'show', 'list' \
                          and overview requests."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "enum": SOURCE_NAMES, "description": "Dataset to display"},
                    "title": {"type": "string", "description": "Page heading"}
                },
                "required": ["source"]
            }),
        },
        Tool {
            name: "build_chart_layout".into(),
            description: "Build a page with a chart over the sales dataset (x-axis is the date field)."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "enum": SOURCE_NAMES, "description": "Dataset to plot"},
                    "chart_type": {"type": "string", "enum": ["bar", "line"], "description": "Chart style"},
                    "metric": {"type": "string", "description": "Numeric field to plot, default 'total'"},
                    "title": {"type": "string", "description": "Page heading"},
                    "days": {"type": "integer", "description": "Trailing day window for sales data"}
                },
                "required": ["source"]
            }),
        },
        Tool {
            name: "fetch_dataset".into(),
            description: "Fetch rows from a dataset without changing the layout. Supports a trailing \
                          day window for sales and an alias for the result name."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "enum": SOURCE_NAMES},
                    "days": {"type": "integer", "description": "Trailing day window (sales only)"},
                    "alias": {"type": "string", "description": "Name to publish the rows under"}
                },
                "required": ["source"]
            }),
        },
        Tool {
            name: "add_record".into(),
            description: "Insert a row into a dataset. All required fields of the dataset must be \
                          provided in 'values'."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "enum": SOURCE_NAMES},
                    "values": {"type": "object", "description": "Column values for the new row"}
                },
                "required": ["source", "values"]
            }),
        },
        Tool {
            name: "update_record".into(),
            description: "Update a row identified by its primary key. 'values' must include the key \
                          plus the fields to change."
                .into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "enum": SOURCE_NAMES},
                    "values": {"type": "object", "description": "Primary key plus updated fields"}
                },
                "required": ["source", "values"]
            }),
        },
        Tool {
            name: "remove_record".into(),
            description: "Delete a row identified by its primary key.".into(),
            input_schema: json!({
                "type": "object",
                "properties": {
                    "source": {"type": "string", "enum": SOURCE_NAMES},
                    "key": {"type": "object", "description": "Primary key of the row to delete"}
                },
                "required": ["source", "key"]
            }),
        },
        Tool {
            name: "describe_sources".into(),
            description: "List available datasets with their row counts and fields.".into(),
            input_schema: json!({"type": "object", "properties": {}}),
        },
    ]
}

#[cfg(test)]
#[path = "tools_test.rs"]
mod tests;
