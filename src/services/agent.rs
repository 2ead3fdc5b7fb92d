//! Layout agent — chat message → tool calls → layout + datasets.
//!
//! DESIGN
//! ======
//! Drives a bounded tool-calling loop against the LLM: the model sees the
//! dataset catalog and the layout tools, requests tool calls, and the agent
//! executes them against the runtime store while tracking the most recent
//! layout and any datasets the tools produced. Progress notes stream out
//! through an optional channel so the SSE route can forward them live; the
//! single-shot route just keeps the collected trace/logs.

use serde_json::{Map, Value, json};
use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::datasets::{NormalizedDatasets, normalize};
use crate::db::{DbError, RuntimeDb};
use crate::layout::LayoutNode;
use crate::llm::LlmChat;
use crate::llm::tools::layout_tools;
use crate::llm::types::{Content, ContentBlock, Message};
use crate::state::AppState;

/// Cap on model round-trips per request, to stop runaway tool loops.
pub const MAX_TOOL_STEPS: usize = 8;

/// History window (records) included as multi-turn context.
pub const MAX_TURNS: usize = 20;

const MAX_TOKENS: u32 = 4096;
const PREVIEW_LEN: usize = 400;

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum AgentError {
    #[error("LLM error: {0}")]
    Llm(#[from] crate::llm::types::LlmError),
}

/// Category of a progress note, also the SSE event name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressKind {
    Thinking,
    Tool,
    ToolResult,
    Model,
    Data,
}

impl ProgressKind {
    #[must_use]
    pub fn event_name(self) -> &'static str {
        match self {
            ProgressKind::Thinking => "thinking",
            ProgressKind::Tool => "tool",
            ProgressKind::ToolResult => "tool_result",
            ProgressKind::Model => "model",
            ProgressKind::Data => "data",
        }
    }
}

/// One informational progress note emitted while the agent works.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ProgressNote {
    #[serde(rename = "type")]
    pub kind: ProgressKind,
    pub text: String,
}

/// Final result of one agent run: the layout to display, the resolved
/// datasets mapping, and the collected diagnostics.
#[derive(Debug)]
pub struct AgentOutcome {
    pub layout: Value,
    pub datasets: NormalizedDatasets,
    pub trace: Vec<String>,
    pub logs: Vec<ProgressNote>,
}

/// Collects trace/log entries and forwards them to an optional live channel.
struct Notes<'a> {
    trace: Vec<String>,
    logs: Vec<ProgressNote>,
    live: Option<&'a mpsc::UnboundedSender<ProgressNote>>,
}

impl Notes<'_> {
    fn push(&mut self, kind: ProgressKind, text: impl Into<String>) {
        let text = text.into();
        self.trace.push(text.clone());
        let note = ProgressNote { kind, text };
        if let Some(sender) = self.live {
            // The receiver may already be gone (client disconnected).
            let _ = sender.send(note.clone());
        }
        self.logs.push(note);
    }
}

// =============================================================================
// MAIN ENTRY POINT
// =============================================================================

/// Run the layout agent for one user message.
///
/// Persists the user message, the assistant summary, and a view snapshot to
/// the session history. Progress notes go to `progress` when provided.
///
/// # Errors
///
/// Returns [`AgentError::Llm`] if a model call fails; tool failures are
/// folded into the conversation, never raised.
pub async fn run_agent(
    state: &AppState,
    llm: &dyn LlmChat,
    session_id: &str,
    message: &str,
    progress: Option<&mpsc::UnboundedSender<ProgressNote>>,
) -> Result<AgentOutcome, AgentError> {
    let run_id = uuid::Uuid::new_v4();
    info!(%run_id, session_id, message_len = message.len(), "agent: message received");
    let mut notes = Notes { trace: Vec::new(), logs: Vec::new(), live: progress };
    notes.push(ProgressKind::Thinking, format!("Received query: {message}"));

    if let Err(e) = state.history.append(session_id, "user", message, Vec::new(), json!({})) {
        warn!(error = %e, "agent: failed to persist user message");
    }

    let system = build_system_prompt(&state.db.describe_sources().await);
    let tools = layout_tools();
    let mut messages = load_conversation(state, session_id);
    messages.push(Message::user(message));

    let mut last_layout: Option<Value> = None;
    let mut named_datasets: Map<String, Value> = Map::new();
    let mut legacy_data: Option<Value> = None;

    for step in 1..=MAX_TOOL_STEPS {
        notes.push(ProgressKind::Thinking, format!("Calling model with tool specs (step {step})"));
        let response = llm
            .chat(MAX_TOKENS, &system, &messages, Some(&tools))
            .await?;
        info!(%run_id, step, stop_reason = %response.stop_reason, "agent: model response");

        let text_parts: Vec<&str> = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                _ => None,
            })
            .collect();

        let tool_calls: Vec<(String, String, Value)> = response
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::ToolUse { id, name, input } => Some((id.clone(), name.clone(), input.clone())),
                _ => None,
            })
            .collect();

        if tool_calls.is_empty() {
            let content = text_parts.join("\n");
            if !content.is_empty() {
                notes.push(ProgressKind::Model, preview(&content));
                match serde_json::from_str::<Value>(&content) {
                    Ok(parsed) => {
                        let extracted = extract_layout_payload(&parsed);
                        if let Some(layout) = extracted.layout.clone() {
                            let title = layout_title(&layout).unwrap_or_default();
                            notes.push(ProgressKind::Thinking, format!("Parsed final layout: {title}"));
                            last_layout = Some(layout);
                        }
                        fold_datasets(extracted, &mut named_datasets, &mut legacy_data, &mut notes, "Model response");
                    }
                    Err(_) => {
                        notes.push(
                            ProgressKind::Thinking,
                            "Model returned non-JSON content; retaining last tool layout",
                        );
                    }
                }
            }
            break;
        }

        messages.push(Message { role: "assistant".into(), content: Content::Blocks(response.content.clone()) });

        let mut tool_results = Vec::new();
        for (tool_id, tool_name, input) in &tool_calls {
            let args = serde_json::to_string(input).unwrap_or_else(|_| "{}".into());
            notes.push(ProgressKind::Tool, format!("Model requested tool: {tool_name} with args: {args}"));

            let payload = execute_tool(&state.db, tool_name, input).await;
            let extracted = extract_layout_payload(&payload);
            if let Some(layout) = extracted.layout.clone() {
                let title = layout_title(&layout).unwrap_or_default();
                notes.push(ProgressKind::ToolResult, format!("Executed tool {tool_name}: layout {title}"));
                last_layout = Some(layout);
            }
            fold_datasets(extracted, &mut named_datasets, &mut legacy_data, &mut notes, "Tool");

            tool_results.push(ContentBlock::ToolResult {
                tool_use_id: tool_id.clone(),
                content: payload.to_string(),
                is_error: None,
            });
        }
        messages.push(Message { role: "user".into(), content: Content::Blocks(tool_results) });

        if response.stop_reason != "tool_use" {
            break;
        }
        if step == MAX_TOOL_STEPS {
            notes.push(ProgressKind::Thinking, "Reached tool step limit; using last known layout");
        }
    }

    let layout = last_layout.unwrap_or_else(|| json!({"type": "Text", "content": "No layout generated"}));
    let tree = LayoutNode::from_value(&layout);

    // Backfill: a layout that references a source no tool populated pulls
    // straight from the runtime store.
    if let Some(tree) = &tree {
        for source in tree.collect_sources() {
            if !named_datasets.contains_key(&source) && RuntimeDb::is_known_source(&source) {
                let rows = state.db.rows(&source, None).await;
                notes.push(
                    ProgressKind::Data,
                    format!("Prepared dataset for source '{source}' ({} rows)", rows.len()),
                );
                named_datasets.insert(source, Value::Array(rows));
            }
        }
    }

    let datasets = normalize(tree.as_ref(), Some(&Value::Object(named_datasets)), legacy_data.as_ref());

    let title = layout_title(&layout);
    let summary = title
        .as_deref()
        .map_or_else(|| "Updated the view.".to_string(), |t| format!("Showing: {t}"));
    let snapshot_datasets = datasets_to_value(&datasets);
    if let Err(e) = state.history.append(
        session_id,
        "assistant",
        &summary,
        notes.trace.clone(),
        json!({"logs": notes.logs, "datasets": snapshot_datasets}),
    ) {
        warn!(error = %e, "agent: failed to persist assistant message");
    }
    if let Err(e) = state.history.append(
        session_id,
        "view",
        "layout",
        Vec::new(),
        json!({"layout": layout, "datasets": snapshot_datasets}),
    ) {
        warn!(error = %e, "agent: failed to persist view snapshot");
    }

    info!(%run_id, session_id, sources = datasets.len(), "agent: run complete");
    Ok(AgentOutcome { layout, datasets, trace: notes.trace, logs: notes.logs })
}

/// Render a normalized mapping back to a JSON object for responses and
/// history snapshots.
#[must_use]
pub fn datasets_to_value(datasets: &NormalizedDatasets) -> Value {
    let mut map = Map::new();
    for (name, rows) in datasets {
        map.insert(name.clone(), Value::Array(rows.clone()));
    }
    Value::Object(map)
}

// =============================================================================
// CONVERSATION CONTEXT
// =============================================================================

fn load_conversation(state: &AppState, session_id: &str) -> Vec<Message> {
    let records = state.history.get_session(session_id);
    let start = records.len().saturating_sub(MAX_TURNS);
    records[start..]
        .iter()
        .filter(|record| {
            (record.role == "user" || record.role == "assistant") && !record.content.is_empty()
        })
        .map(|record| Message { role: record.role.clone(), content: Content::Text(record.content.clone()) })
        .collect()
}

fn build_system_prompt(sources: &Value) -> String {
    use std::fmt::Write;

    let mut prompt = String::from(
        "You are a UI agent for a commerce dashboard. Answer user requests by calling tools that \
         build layout JSON (pages with tables, charts and text) bound to the datasets below. \
         Prefer tools over free-form text; when you answer directly, return layout JSON only.\n\n\
         Available datasets:\n",
    );
    if let Some(map) = sources.as_object() {
        for (name, info) in map {
            let rows = info.get("rows").and_then(Value::as_i64).unwrap_or(0);
            let fields = info
                .get("fields")
                .and_then(Value::as_array)
                .map(|fields| {
                    fields
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                })
                .unwrap_or_default();
            let _ = writeln!(prompt, "- {name} ({rows} rows): {fields}");
        }
    }
    prompt.push_str(
        "\nFor sales questions use build_chart_layout (x-axis is always the date field). \
         For record changes use add_record/update_record/remove_record and show the refreshed \
         table afterwards.",
    );
    prompt
}

fn preview(text: &str) -> String {
    if text.chars().count() <= PREVIEW_LEN {
        return text.to_string();
    }
    let truncated: String = text.chars().take(PREVIEW_LEN - 1).collect();
    format!("{truncated}…")
}

fn layout_title(layout: &Value) -> Option<String> {
    layout
        .get("title")
        .and_then(Value::as_str)
        .or_else(|| layout.get("type").and_then(Value::as_str))
        .map(ToString::to_string)
}

// =============================================================================
// PAYLOAD EXTRACTION
// =============================================================================

struct ExtractedPayload {
    layout: Option<Value>,
    datasets: Option<Map<String, Value>>,
    data: Option<Value>,
}

/// Pull layout/dataset parts out of a tool or model payload. A payload with
/// no `layout` key but a `type` tag is itself a layout node (tools report
/// errors as Text nodes).
fn extract_layout_payload(payload: &Value) -> ExtractedPayload {
    let obj = payload.as_object();

    let layout = obj.and_then(|map| {
        map.get("layout").cloned().or_else(|| {
            if map.get("type").is_some_and(Value::is_string) {
                Some(payload.clone())
            } else {
                None
            }
        })
    });

    let datasets = obj
        .and_then(|map| map.get("datasets"))
        .and_then(Value::as_object)
        .cloned();

    let data = obj
        .and_then(|map| map.get("data"))
        .filter(|value| value.is_array())
        .cloned();

    ExtractedPayload { layout, datasets, data }
}

fn fold_datasets(
    extracted: ExtractedPayload,
    named: &mut Map<String, Value>,
    legacy: &mut Option<Value>,
    notes: &mut Notes<'_>,
    origin: &str,
) {
    if let Some(datasets) = extracted.datasets {
        for (name, rows) in datasets {
            let count = rows.as_array().map_or(0, Vec::len);
            notes.push(
                ProgressKind::Data,
                format!("{origin} provided dataset '{name}' with {count} rows"),
            );
            named.insert(name, rows);
        }
    }
    if let Some(data) = extracted.data {
        let count = data.as_array().map_or(0, Vec::len);
        notes.push(ProgressKind::Data, format!("{origin} provided dataset with {count} rows"));
        *legacy = Some(data);
    }
}

// =============================================================================
// TOOL EXECUTION
// =============================================================================

async fn execute_tool(db: &RuntimeDb, tool_name: &str, input: &Value) -> Value {
    match tool_name {
        "build_table_layout" => execute_build_table(db, input).await,
        "build_chart_layout" => execute_build_chart(db, input).await,
        "fetch_dataset" => execute_fetch_dataset(db, input).await,
        "add_record" => execute_mutation(db, input, MutationKind::Insert).await,
        "update_record" => execute_mutation(db, input, MutationKind::Update).await,
        "remove_record" => execute_mutation(db, input, MutationKind::Delete).await,
        "describe_sources" => json!({"meta": {"action": "describe"}, "sources": db.describe_sources().await}),
        other => text_payload(format!("Unknown tool: {other}")),
    }
}

fn text_payload(content: impl Into<String>) -> Value {
    json!({"type": "Text", "content": content.into()})
}

fn source_arg(input: &Value) -> String {
    input
        .get("source")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_lowercase()
}

fn days_arg(input: &Value) -> Option<usize> {
    input
        .get("days")
        .and_then(Value::as_u64)
        .and_then(|days| usize::try_from(days).ok())
        .filter(|days| *days > 0)
}

async fn execute_build_table(db: &RuntimeDb, input: &Value) -> Value {
    let source = source_arg(input);
    if !RuntimeDb::is_known_source(&source) {
        return text_payload(format!("Unknown source '{source}'"));
    }
    let title = input
        .get("title")
        .and_then(Value::as_str)
        .map_or_else(|| format!("{} Overview", crate::labels::column_label(&source)), ToString::to_string);
    let rows = db.rows(&source, None).await;
    json!({
        "layout": {
            "type": "Page",
            "title": title,
            "children": [{"type": "Table", "source": source}],
        },
        "datasets": {source: rows},
    })
}

async fn execute_build_chart(db: &RuntimeDb, input: &Value) -> Value {
    let source = source_arg(input);
    if !RuntimeDb::is_known_source(&source) {
        return text_payload(format!("Unknown source '{source}'"));
    }
    let chart_type = input
        .get("chart_type")
        .and_then(Value::as_str)
        .unwrap_or("bar");
    let title = input
        .get("title")
        .and_then(Value::as_str)
        .map_or_else(|| format!("{} Chart", crate::labels::column_label(&source)), ToString::to_string);
    let mut chart = json!({"type": "Chart", "chartType": chart_type, "source": source});
    if let Some(metric) = input.get("metric").and_then(Value::as_str) {
        chart["metric"] = json!(metric);
    }
    let rows = db.rows(&source, days_arg(input)).await;
    json!({
        "layout": {"type": "Page", "title": title, "children": [chart]},
        "datasets": {source: rows},
    })
}

async fn execute_fetch_dataset(db: &RuntimeDb, input: &Value) -> Value {
    let source = source_arg(input);
    if !RuntimeDb::is_known_source(&source) {
        return text_payload(format!(
            "Unknown source '{source}'. Available: {}",
            crate::db::SOURCES.join(", ")
        ));
    }
    let rows = db.rows(&source, days_arg(input)).await;
    let alias = input
        .get("alias")
        .and_then(Value::as_str)
        .map_or(source.clone(), ToString::to_string);
    json!({
        "datasets": {alias: rows.clone()},
        "meta": {"source": source, "rows": rows.len()},
    })
}

enum MutationKind {
    Insert,
    Update,
    Delete,
}

async fn execute_mutation(db: &RuntimeDb, input: &Value, kind: MutationKind) -> Value {
    let source = source_arg(input);
    let empty = json!({});
    let (values, action) = match kind {
        MutationKind::Insert => (input.get("values").unwrap_or(&empty), "insert"),
        MutationKind::Update => (input.get("values").unwrap_or(&empty), "update"),
        MutationKind::Delete => (input.get("key").unwrap_or(&empty), "delete"),
    };

    let result = match kind {
        MutationKind::Insert => db.insert_row(&source, values).await,
        MutationKind::Update => db.update_row(&source, values).await,
        MutationKind::Delete => db.delete_row(&source, values).await,
    };

    match result {
        Ok(outcome) => json!({
            "datasets": {source.clone(): outcome.dataset},
            "meta": {"action": action, "message": outcome.message, "row": outcome.row},
        }),
        Err(e @ DbError::MissingFields { .. }) => {
            let required = RuntimeDb::required_fields(&source).join(", ");
            text_payload(format!("Missing fields. {e}. Required fields for '{source}': {required}"))
        }
        Err(e) => text_payload(e.to_string()),
    }
}

#[cfg(test)]
#[path = "agent_test.rs"]
mod tests;
