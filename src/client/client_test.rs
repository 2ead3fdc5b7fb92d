use super::*;
use crate::render::View;
use serde_json::json;

fn products_body() -> Value {
    json!({
        "layout": {
            "type": "Page",
            "title": "Products",
            "children": [{"type": "Table", "source": "products"}],
        },
        "datasets": {"products": [{"id": 1, "name": "Desk", "price": 120}]},
    })
}

// =========================================================================
// FinalView
// =========================================================================

#[test]
fn final_view_from_named_datasets_body() {
    let view = FinalView::from_body(&products_body());
    assert_eq!(view.datasets["products"].len(), 1);

    let Some(View::Page { title, children }) = view.render() else {
        panic!("expected a page view");
    };
    assert_eq!(title.as_deref(), Some("Products"));
    assert!(matches!(children[0], View::Table { .. }));
}

#[test]
fn final_view_accepts_legacy_data_shape() {
    let body = json!({
        "layout": {"type": "Table", "source": "products"},
        "data": [{"id": 1}],
    });
    let view = FinalView::from_body(&body);
    // The bare array binds to the single referenced source.
    assert_eq!(view.datasets["products"].len(), 1);
}

#[test]
fn final_view_without_layout_renders_nothing() {
    let view = FinalView::from_body(&json!({"datasets": {}}));
    assert!(view.render().is_none());
    assert_eq!(view.datasets["data"], Vec::<Value>::new());
}

// =========================================================================
// RenderSlot — generation fencing
// =========================================================================

#[test]
fn slot_starts_idle_and_empty() {
    let slot = RenderSlot::new();
    assert_eq!(slot.state(), FetchState::Idle);
    assert!(slot.displayed().is_none());
}

#[test]
fn begin_then_apply_finalizes() {
    let slot = RenderSlot::new();
    let token = slot.begin();
    assert_eq!(slot.state(), FetchState::Streaming);

    assert!(slot.apply(token, FinalView::from_body(&products_body())));
    assert_eq!(slot.state(), FetchState::Finalized);
    assert!(slot.displayed().is_some());
}

#[test]
fn stale_token_never_overwrites_newer_state() {
    let slot = RenderSlot::new();
    let abandoned = slot.begin();
    let current = slot.begin();

    let newer = FinalView::from_body(&products_body());
    assert!(slot.apply(current, newer));

    // The abandoned attempt resolves late; its result must be discarded.
    let late = FinalView::from_body(&json!({"layout": {"type": "Text", "content": "stale"}}));
    assert!(!slot.apply(abandoned, late));

    let displayed = slot.displayed().unwrap();
    assert_eq!(displayed.layout["title"], "Products");
    assert_eq!(slot.state(), FetchState::Finalized);
}

#[test]
fn stale_failure_does_not_touch_lifecycle() {
    let slot = RenderSlot::new();
    let abandoned = slot.begin();
    let current = slot.begin();

    slot.mark_fallback_pending(abandoned);
    assert_eq!(slot.state(), FetchState::Streaming);
    slot.mark_failed(abandoned);
    assert_eq!(slot.state(), FetchState::Streaming);

    slot.mark_failed(current);
    assert_eq!(slot.state(), FetchState::Failed);
}

#[test]
fn failed_attempt_keeps_previous_view() {
    let slot = RenderSlot::new();
    let first = slot.begin();
    assert!(slot.apply(first, FinalView::from_body(&products_body())));

    let second = slot.begin();
    slot.mark_fallback_pending(second);
    slot.mark_failed(second);

    assert_eq!(slot.state(), FetchState::Failed);
    assert_eq!(slot.displayed().unwrap().layout["title"], "Products");
}

// =========================================================================
// process_stream_event
// =========================================================================

#[test]
fn progress_events_collect_notices_only() {
    let mut notices = Vec::new();
    let step = process_stream_event("thinking", r#"{"text": "working"}"#, &mut notices);
    assert!(matches!(step, StreamStep::Continue));
    assert_eq!(notices[0].category, "thinking");
    assert_eq!(notices[0].text, "working");
}

#[test]
fn malformed_event_payload_is_dropped_silently() {
    let mut notices = Vec::new();
    let step = process_stream_event("tool", "not json", &mut notices);
    assert!(matches!(step, StreamStep::Continue));
    assert!(notices.is_empty());
}

#[test]
fn final_event_carries_the_body() {
    let mut notices = Vec::new();
    let step = process_stream_event("final", &products_body().to_string(), &mut notices);
    let StreamStep::Final(body) = step else {
        panic!("expected a final step");
    };
    assert_eq!(body["layout"]["title"], "Products");
}

#[test]
fn final_event_without_layout_is_dropped() {
    let mut notices = Vec::new();
    let step = process_stream_event("final", r#"{"datasets": {}}"#, &mut notices);
    assert!(matches!(step, StreamStep::Continue));
}

#[test]
fn error_event_fails_the_stream_attempt() {
    let mut notices = Vec::new();
    let step = process_stream_event("error", r#"{"error": "LLM not configured"}"#, &mut notices);
    let StreamStep::Error(message) = step else {
        panic!("expected an error step");
    };
    assert_eq!(message, "LLM not configured");
}
