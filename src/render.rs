//! Layout interpreter — recursive walk from layout nodes to a view model.
//!
//! DESIGN
//! ======
//! `render` is a pure function of `(node, datasets)`: no state is carried
//! between sibling or parent/child invocations, and every branch has a
//! defined placeholder fallback, so a malformed node degrades to a visible
//! view instead of failing the tree. Dataset lookup is exact-name only —
//! all shape heuristics live in [`crate::datasets`], not here.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::datasets::NormalizedDatasets;
use crate::labels::{column_label, format_cell, row_key};
use crate::layout::{DEFAULT_CHART_METRIC, DEFAULT_CHART_TYPE, LayoutNode};

/// Fixed x-axis field for chart views.
pub const CHART_X_FIELD: &str = "date";

const NO_TABLE_ROWS: &str = "No records to display.";
const NO_CHART_ROWS: &str = "No sales data available.";

// =============================================================================
// VIEW MODEL
// =============================================================================

/// A rendered view — the typed output of one interpreter pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "view", rename_all = "snake_case")]
pub enum View {
    /// Container with an optional heading and child views in layout order.
    Page {
        title: Option<String>,
        children: Vec<View>,
    },

    /// Row/column grid. Columns come from the first row of the dataset.
    Table {
        columns: Vec<Column>,
        rows: Vec<TableRow>,
    },

    /// Bar/line chart over the fixed `date` x-axis and a named metric.
    Chart {
        chart_type: String,
        x_field: String,
        metric: String,
        points: Vec<ChartPoint>,
    },

    /// Paragraph of literal text.
    Text { content: String },

    /// Explicit empty-state placeholder (empty table or chart dataset).
    Empty { message: String },

    /// Placeholder for a node kind this interpreter does not understand.
    Unknown { raw_type: String },
}

impl View {
    /// Message shown for an unknown layout node.
    #[must_use]
    pub fn unknown_message(&self) -> Option<String> {
        match self {
            View::Unknown { raw_type } => Some(format!("Unknown layout type: {raw_type}")),
            _ => None,
        }
    }
}

/// A table column: the raw dataset field plus its derived header label.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Column {
    pub field: String,
    pub label: String,
}

/// A rendered table row: stable identity key plus formatted cells in column
/// order. The key is never shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableRow {
    pub key: String,
    pub cells: Vec<String>,
}

/// One chart bar/point: the x-axis label and the metric value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: f64,
}

// =============================================================================
// INTERPRETER
// =============================================================================

/// Render one layout node against resolved datasets.
#[must_use]
pub fn render(node: &LayoutNode, datasets: &NormalizedDatasets) -> View {
    match node {
        LayoutNode::Page { title, children } => View::Page {
            title: title.clone(),
            // Siblings are independent: the same datasets mapping goes to
            // every child unchanged.
            children: children.iter().map(|child| render(child, datasets)).collect(),
        },
        LayoutNode::Table { source } => render_table(resolve(source, datasets)),
        LayoutNode::Chart { source, chart_type, metric } => {
            render_chart(resolve(source, datasets), chart_type.as_deref(), metric.as_deref())
        }
        LayoutNode::Text { content } => View::Text { content: content.clone() },
        LayoutNode::Unknown { raw_type } => View::Unknown { raw_type: raw_type.clone() },
    }
}

fn resolve<'a>(source: &Option<String>, datasets: &'a NormalizedDatasets) -> &'a [Value] {
    source
        .as_deref()
        .and_then(|name| datasets.get(name))
        .map_or(&[], Vec::as_slice)
}

fn render_table(rows: &[Value]) -> View {
    let Some(first) = rows.first().and_then(Value::as_object) else {
        return View::Empty { message: NO_TABLE_ROWS.to_string() };
    };

    // Column set comes from the first row only; later rows may be ragged.
    let columns: Vec<Column> = first
        .keys()
        .map(|field| Column { field: field.clone(), label: column_label(field) })
        .collect();

    let table_rows = rows
        .iter()
        .enumerate()
        .map(|(index, row)| TableRow {
            key: row_key(row, index),
            cells: columns
                .iter()
                .map(|column| format_cell(row.get(&column.field)))
                .collect(),
        })
        .collect();

    View::Table { columns, rows: table_rows }
}

fn render_chart(rows: &[Value], chart_type: Option<&str>, metric: Option<&str>) -> View {
    if rows.is_empty() {
        return View::Empty { message: NO_CHART_ROWS.to_string() };
    }

    let metric = metric.unwrap_or(DEFAULT_CHART_METRIC);
    let points = rows
        .iter()
        .map(|row| ChartPoint {
            label: row
                .get(CHART_X_FIELD)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            value: row.get(metric).and_then(Value::as_f64).unwrap_or(0.0),
        })
        .collect();

    View::Chart {
        chart_type: chart_type.unwrap_or(DEFAULT_CHART_TYPE).to_string(),
        x_field: CHART_X_FIELD.to_string(),
        metric: metric.to_string(),
        points,
    }
}

#[cfg(test)]
#[path = "render_test.rs"]
mod tests;
