//! Layout tree — the typed form of the AI-produced UI description.
//!
//! DESIGN
//! ======
//! The model returns a JSON tree of nodes tagged by `type`. Parsing is total:
//! any object with a `type` string becomes a node, and unrecognized tags are
//! preserved as [`LayoutNode::Unknown`] so rendering can degrade per node
//! instead of rejecting the whole tree. `null` or non-object input is simply
//! absent (`None`). The tree is immutable for the duration of a render pass.

use std::collections::BTreeSet;

use serde_json::Value;

/// Numeric field plotted by charts when the node names no metric.
pub const DEFAULT_CHART_METRIC: &str = "total";

/// Chart style used when the node carries no `chartType` hint.
pub const DEFAULT_CHART_TYPE: &str = "bar";

/// A node in the UI description tree.
#[derive(Debug, Clone, PartialEq)]
pub enum LayoutNode {
    /// Container with an optional heading and ordered children.
    Page {
        title: Option<String>,
        children: Vec<LayoutNode>,
    },

    /// Row/column grid bound to a named dataset.
    Table { source: Option<String> },

    /// Chart bound to a named dataset. `metric` names the numeric field to
    /// plot (default `"total"`); `chart_type` is a rendering hint.
    Chart {
        source: Option<String>,
        chart_type: Option<String>,
        metric: Option<String>,
    },

    /// Literal text shown verbatim.
    Text { content: String },

    /// A node kind this interpreter does not understand. The raw tag is kept
    /// for the placeholder view.
    Unknown { raw_type: String },
}

impl LayoutNode {
    /// Parse a layout node from loose JSON. Returns `None` for `null` or
    /// non-object input; never fails for an object carrying a `type` string.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let obj = value.as_object()?;
        let tag = obj.get("type").and_then(Value::as_str).unwrap_or("");

        let node = match tag {
            "Page" => LayoutNode::Page {
                title: str_field(value, "title"),
                children: obj
                    .get("children")
                    .and_then(Value::as_array)
                    .map(|items| items.iter().filter_map(Self::from_value).collect())
                    .unwrap_or_default(),
            },
            "Table" => LayoutNode::Table { source: str_field(value, "source") },
            "Chart" => LayoutNode::Chart {
                source: str_field(value, "source"),
                chart_type: str_field(value, "chartType"),
                metric: str_field(value, "metric"),
            },
            "Text" => LayoutNode::Text {
                content: str_field(value, "content").unwrap_or_default(),
            },
            other => LayoutNode::Unknown { raw_type: other.to_string() },
        };
        Some(node)
    }

    /// Distinct dataset names referenced by Table/Chart nodes anywhere in the
    /// tree, collected depth-first with set semantics.
    #[must_use]
    pub fn collect_sources(&self) -> BTreeSet<String> {
        let mut sources = BTreeSet::new();
        self.collect_sources_into(&mut sources);
        sources
    }

    fn collect_sources_into(&self, sources: &mut BTreeSet<String>) {
        match self {
            LayoutNode::Page { children, .. } => {
                for child in children {
                    child.collect_sources_into(sources);
                }
            }
            LayoutNode::Table { source }
            | LayoutNode::Chart { source, .. } => {
                if let Some(name) = source {
                    if !name.is_empty() {
                        sources.insert(name.clone());
                    }
                }
            }
            LayoutNode::Text { .. } | LayoutNode::Unknown { .. } => {}
        }
    }
}

fn str_field(value: &Value, field: &str) -> Option<String> {
    value
        .get(field)
        .and_then(Value::as_str)
        .map(ToString::to_string)
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
