use super::*;
use crate::llm::types::{ChatResponse, LlmError, Tool};
use crate::state::test_helpers;
use std::sync::Mutex;

// =========================================================================
// MockLlm
// =========================================================================

struct MockLlm {
    responses: Mutex<Vec<ChatResponse>>,
}

impl MockLlm {
    fn new(responses: Vec<ChatResponse>) -> Self {
        Self { responses: Mutex::new(responses) }
    }
}

#[async_trait::async_trait]
impl LlmChat for MockLlm {
    async fn chat(
        &self,
        _max_tokens: u32,
        _system: &str,
        _messages: &[Message],
        _tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, LlmError> {
        let mut responses = self.responses.lock().unwrap();
        if responses.is_empty() {
            Ok(ChatResponse {
                content: vec![ContentBlock::Text { text: "done".into() }],
                model: "mock".into(),
                stop_reason: "end_turn".into(),
            })
        } else {
            Ok(responses.remove(0))
        }
    }
}

fn tool_use(id: &str, name: &str, input: Value) -> ChatResponse {
    ChatResponse {
        content: vec![ContentBlock::ToolUse { id: id.into(), name: name.into(), input }],
        model: "mock".into(),
        stop_reason: "tool_use".into(),
    }
}

fn text_response(text: &str) -> ChatResponse {
    ChatResponse {
        content: vec![ContentBlock::Text { text: text.into() }],
        model: "mock".into(),
        stop_reason: "end_turn".into(),
    }
}

// =========================================================================
// build_system_prompt
// =========================================================================

#[tokio::test]
async fn system_prompt_lists_sources() {
    let state = test_helpers::test_state(None);
    let prompt = build_system_prompt(&state.db.describe_sources().await);
    assert!(prompt.contains("products"));
    assert!(prompt.contains("sales"));
    assert!(prompt.contains("unit_price"));
    assert!(prompt.contains("build_chart_layout"));
}

// =========================================================================
// execute_tool
// =========================================================================

#[tokio::test]
async fn tool_build_table_layout() {
    let db = RuntimeDb::seeded();
    let payload = execute_tool(&db, "build_table_layout", &json!({"source": "products"})).await;

    assert_eq!(payload["layout"]["type"], "Page");
    assert_eq!(payload["layout"]["title"], "Products Overview");
    assert_eq!(payload["layout"]["children"][0]["type"], "Table");
    assert_eq!(payload["layout"]["children"][0]["source"], "products");
    assert_eq!(payload["datasets"]["products"].as_array().unwrap().len(), 10);
}

#[tokio::test]
async fn tool_build_chart_layout_with_days() {
    let db = RuntimeDb::seeded();
    let payload = execute_tool(
        &db,
        "build_chart_layout",
        &json!({"source": "sales", "chart_type": "line", "metric": "orders", "days": 7}),
    )
    .await;

    let chart = &payload["layout"]["children"][0];
    assert_eq!(chart["type"], "Chart");
    assert_eq!(chart["chartType"], "line");
    assert_eq!(chart["metric"], "orders");
    assert_eq!(payload["datasets"]["sales"].as_array().unwrap().len(), 7);
}

#[tokio::test]
async fn tool_fetch_dataset_honors_alias() {
    let db = RuntimeDb::seeded();
    let payload = execute_tool(
        &db,
        "fetch_dataset",
        &json!({"source": "customers", "alias": "vips"}),
    )
    .await;

    assert!(payload.get("layout").is_none());
    assert_eq!(payload["datasets"]["vips"].as_array().unwrap().len(), 6);
    assert_eq!(payload["meta"]["source"], "customers");
}

#[tokio::test]
async fn tool_fetch_dataset_unknown_source_reports_error_text() {
    let db = RuntimeDb::seeded();
    let payload = execute_tool(&db, "fetch_dataset", &json!({"source": "invoices"})).await;

    assert_eq!(payload["type"], "Text");
    let content = payload["content"].as_str().unwrap();
    assert!(content.contains("Unknown source 'invoices'"));
    assert!(content.contains("products"));
}

#[tokio::test]
async fn tool_add_record_missing_fields_reports_required() {
    let db = RuntimeDb::seeded();
    let payload = execute_tool(
        &db,
        "add_record",
        &json!({"source": "products", "values": {"name": "Widget"}}),
    )
    .await;

    assert_eq!(payload["type"], "Text");
    let content = payload["content"].as_str().unwrap();
    assert!(content.contains("Missing fields"));
    assert!(content.contains("sku"));
}

#[tokio::test]
async fn tool_add_record_returns_refreshed_dataset() {
    let db = RuntimeDb::seeded();
    let payload = execute_tool(
        &db,
        "add_record",
        &json!({
            "source": "products",
            "values": {
                "sku": "SKU-2001",
                "name": "Standing Mat",
                "category": "Accessories",
                "unit_price": 39.0,
                "inventory": 80,
                "status": "active"
            }
        }),
    )
    .await;

    assert_eq!(payload["meta"]["action"], "insert");
    assert_eq!(payload["datasets"]["products"].as_array().unwrap().len(), 11);
}

#[tokio::test]
async fn tool_unknown_name_is_reported_not_fatal() {
    let db = RuntimeDb::seeded();
    let payload = execute_tool(&db, "summon_dragon", &json!({})).await;
    assert_eq!(payload["type"], "Text");
    assert!(payload["content"].as_str().unwrap().contains("summon_dragon"));
}

// =========================================================================
// extract_layout_payload
// =========================================================================

#[test]
fn extract_prefers_layout_key() {
    let payload = json!({"layout": {"type": "Page", "title": "T"}, "datasets": {"products": []}});
    let extracted = extract_layout_payload(&payload);
    assert_eq!(extracted.layout.unwrap()["title"], "T");
    assert!(extracted.datasets.unwrap().contains_key("products"));
}

#[test]
fn extract_treats_typed_payload_as_layout() {
    let payload = json!({"type": "Text", "content": "oops"});
    let extracted = extract_layout_payload(&payload);
    assert_eq!(extracted.layout.unwrap()["content"], "oops");
}

#[test]
fn extract_ignores_untyped_payload() {
    let payload = json!({"meta": {"action": "describe"}});
    let extracted = extract_layout_payload(&payload);
    assert!(extracted.layout.is_none());
}

#[test]
fn extract_captures_legacy_data_array() {
    let payload = json!({"layout": {"type": "Table", "source": "products"}, "data": [{"id": 1}]});
    let extracted = extract_layout_payload(&payload);
    assert_eq!(extracted.data.unwrap().as_array().unwrap().len(), 1);
}

// =========================================================================
// run_agent
// =========================================================================

#[tokio::test]
async fn agent_tool_loop_produces_layout_and_datasets() {
    let llm = MockLlm::new(vec![
        tool_use("t1", "build_table_layout", json!({"source": "products", "title": "Catalog"})),
        text_response("All set."),
    ]);
    let state = test_helpers::test_state(None);

    let outcome = run_agent(&state, &llm, "s1", "show products", None).await.unwrap();

    assert_eq!(outcome.layout["title"], "Catalog");
    assert_eq!(outcome.datasets["products"].len(), 10);
    assert!(outcome.trace.iter().any(|line| line.contains("build_table_layout")));
}

#[tokio::test]
async fn agent_without_tool_calls_parses_direct_layout_json() {
    let llm = MockLlm::new(vec![text_response(
        r#"{"type": "Page", "title": "Sales", "children": [{"type": "Chart", "source": "sales"}]}"#,
    )]);
    let state = test_helpers::test_state(None);

    let outcome = run_agent(&state, &llm, "s1", "chart sales", None).await.unwrap();

    assert_eq!(outcome.layout["title"], "Sales");
    // Referenced source was never populated by a tool, so the store backfills it.
    assert_eq!(outcome.datasets["sales"].len(), 31);
}

#[tokio::test]
async fn agent_non_json_reply_falls_back_to_text_layout() {
    let llm = MockLlm::new(vec![text_response("I cannot help with that.")]);
    let state = test_helpers::test_state(None);

    let outcome = run_agent(&state, &llm, "s1", "hello", None).await.unwrap();

    assert_eq!(outcome.layout["type"], "Text");
    assert_eq!(outcome.layout["content"], "No layout generated");
    // No sources referenced, so the mapping collapses to the default entry.
    assert_eq!(outcome.datasets.len(), 1);
    assert!(outcome.datasets["data"].is_empty());
}

#[tokio::test]
async fn agent_stops_at_tool_step_limit() {
    let responses: Vec<ChatResponse> = (0..MAX_TOOL_STEPS + 4)
        .map(|i| tool_use(&format!("t{i}"), "describe_sources", json!({})))
        .collect();
    let llm = MockLlm::new(responses);
    let state = test_helpers::test_state(None);

    let outcome = run_agent(&state, &llm, "s1", "loop forever", None).await.unwrap();

    let model_calls = outcome
        .trace
        .iter()
        .filter(|line| line.contains("Calling model"))
        .count();
    assert_eq!(model_calls, MAX_TOOL_STEPS);
    assert!(outcome.trace.iter().any(|line| line.contains("step limit")));
}

#[tokio::test]
async fn agent_persists_user_assistant_and_view_records() {
    let llm = MockLlm::new(vec![
        tool_use("t1", "build_table_layout", json!({"source": "customers"})),
        text_response("done"),
    ]);
    let state = test_helpers::test_state(None);

    run_agent(&state, &llm, "s9", "list customers", None).await.unwrap();

    let records = state.history.get_session("s9");
    let roles: Vec<&str> = records.iter().map(|r| r.role.as_str()).collect();
    assert_eq!(roles, vec!["user", "assistant", "view"]);
    assert!(records[1].content.starts_with("Showing: "));
    assert_eq!(records[2].meta["layout"]["children"][0]["source"], "customers");

    let (layout, datasets) = state.history.last_view("s9").unwrap();
    assert_eq!(layout["children"][0]["type"], "Table");
    assert_eq!(datasets["customers"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn agent_streams_progress_notes_live() {
    let llm = MockLlm::new(vec![
        tool_use("t1", "fetch_dataset", json!({"source": "orders"})),
        text_response("done"),
    ]);
    let state = test_helpers::test_state(None);
    let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();

    run_agent(&state, &llm, "s1", "orders please", Some(&tx)).await.unwrap();
    drop(tx);

    let mut kinds = Vec::new();
    while let Some(note) = rx.recv().await {
        kinds.push(note.kind);
    }
    assert_eq!(kinds[0], ProgressKind::Thinking);
    assert!(kinds.contains(&ProgressKind::Tool));
    assert!(kinds.contains(&ProgressKind::Data));
}

#[test]
fn preview_truncates_long_text() {
    let long = "x".repeat(1000);
    let shortened = preview(&long);
    assert_eq!(shortened.chars().count(), PREVIEW_LEN);
    assert!(shortened.ends_with('…'));
    assert_eq!(preview("short"), "short");
}
