use super::*;
use serde_json::json;

// =========================================================================
// from_value
// =========================================================================

#[test]
fn parses_page_with_children() {
    let value = json!({
        "type": "Page",
        "title": "Products",
        "children": [{"type": "Table", "source": "products"}]
    });

    let node = LayoutNode::from_value(&value).unwrap();
    match node {
        LayoutNode::Page { title, children } => {
            assert_eq!(title.as_deref(), Some("Products"));
            assert_eq!(children.len(), 1);
            assert_eq!(children[0], LayoutNode::Table { source: Some("products".into()) });
        }
        other => panic!("expected Page, got {other:?}"),
    }
}

#[test]
fn parses_chart_hints() {
    let value = json!({"type": "Chart", "source": "sales", "chartType": "line", "metric": "orders"});
    let node = LayoutNode::from_value(&value).unwrap();
    assert_eq!(
        node,
        LayoutNode::Chart {
            source: Some("sales".into()),
            chart_type: Some("line".into()),
            metric: Some("orders".into()),
        }
    );
}

#[test]
fn parses_text_content() {
    let value = json!({"type": "Text", "content": "hello"});
    assert_eq!(
        LayoutNode::from_value(&value).unwrap(),
        LayoutNode::Text { content: "hello".into() }
    );
}

#[test]
fn unknown_tag_is_preserved() {
    let value = json!({"type": "Carousel", "items": []});
    assert_eq!(
        LayoutNode::from_value(&value).unwrap(),
        LayoutNode::Unknown { raw_type: "Carousel".into() }
    );
}

#[test]
fn missing_type_is_unknown_not_error() {
    let value = json!({"title": "untagged"});
    assert_eq!(
        LayoutNode::from_value(&value).unwrap(),
        LayoutNode::Unknown { raw_type: String::new() }
    );
}

#[test]
fn null_and_scalars_are_absent() {
    assert_eq!(LayoutNode::from_value(&Value::Null), None);
    assert_eq!(LayoutNode::from_value(&json!("Table")), None);
    assert_eq!(LayoutNode::from_value(&json!([1, 2])), None);
}

#[test]
fn malformed_children_entries_are_skipped() {
    let value = json!({
        "type": "Page",
        "children": [{"type": "Text", "content": "a"}, null, 7]
    });
    let LayoutNode::Page { children, .. } = LayoutNode::from_value(&value).unwrap() else {
        panic!("expected Page");
    };
    assert_eq!(children.len(), 1);
}

// =========================================================================
// collect_sources
// =========================================================================

#[test]
fn collects_sources_depth_first_deduplicated() {
    let value = json!({
        "type": "Page",
        "children": [
            {"type": "Table", "source": "products"},
            {"type": "Chart", "source": "sales"},
            {"type": "Page", "children": [{"type": "Table", "source": "products"}]},
        ]
    });
    let node = LayoutNode::from_value(&value).unwrap();
    let sources: Vec<String> = node.collect_sources().into_iter().collect();
    assert_eq!(sources, vec!["products".to_string(), "sales".to_string()]);
}

#[test]
fn nodes_without_source_are_ignored() {
    let value = json!({
        "type": "Page",
        "children": [
            {"type": "Table"},
            {"type": "Chart", "source": ""},
            {"type": "Text", "content": "x"},
        ]
    });
    let node = LayoutNode::from_value(&value).unwrap();
    assert!(node.collect_sources().is_empty());
}
