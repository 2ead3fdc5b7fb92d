//! Layout-agent routes: single-shot JSON and SSE streaming.

use std::convert::Infallible;
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::{error, info};

use crate::services::agent::{AgentOutcome, ProgressNote, datasets_to_value, run_agent};
use crate::state::AppState;

pub const DEFAULT_SESSION: &str = "default";

#[derive(Deserialize)]
pub struct LayoutRequest {
    pub message: String,
    pub session_id: Option<String>,
}

/// `POST /api/ai_layout` — run the agent and return the final view in one
/// response.
pub async fn ai_layout(
    State(state): State<AppState>,
    Json(body): Json<LayoutRequest>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    let Some(llm) = state.llm.clone() else {
        return Err(llm_unavailable());
    };
    let session_id = body.session_id.unwrap_or_else(|| DEFAULT_SESSION.to_string());

    let outcome = run_agent(&state, llm.as_ref(), &session_id, &body.message, None)
        .await
        .map_err(|e| {
            error!(error = %e, "ai_layout: agent failed");
            (StatusCode::BAD_GATEWAY, Json(json!({"error": e.to_string()})))
        })?;

    Ok(Json(outcome_body(&outcome)))
}

/// `GET /api/ai_layout_stream` — run the agent while streaming progress as
/// SSE. Emits `thinking`/`tool`/`tool_result`/`model`/`data` events as they
/// happen, then exactly one terminal event: `final` on success or `error`.
pub async fn ai_layout_stream(
    State(state): State<AppState>,
    Query(query): Query<StreamQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let (tx, rx) = tokio::sync::mpsc::unbounded_channel::<StreamMsg>();
    spawn_agent_stream(state, query, tx);

    let stream = UnboundedReceiverStream::new(rx)
        .map(|msg| match msg {
            StreamMsg::Note(note) => Event::default()
                .event(note.kind.event_name())
                .data(json!({"text": note.text}).to_string()),
            StreamMsg::Final(body) => Event::default().event("final").data(body.to_string()),
            StreamMsg::Error(message) => Event::default()
                .event("error")
                .data(json!({"error": message}).to_string()),
        })
        .map(Ok);

    Sse::new(stream).keep_alive(KeepAlive::new().interval(Duration::from_secs(15)))
}

#[derive(Deserialize)]
pub struct StreamQuery {
    pub message: Option<String>,
    pub session_id: Option<String>,
}

enum StreamMsg {
    Note(ProgressNote),
    Final(Value),
    Error(String),
}

/// Run the agent on a background task, forwarding progress notes and then
/// exactly one terminal message into `tx`. The stream ends when every sender
/// clone is dropped.
fn spawn_agent_stream(
    state: AppState,
    query: StreamQuery,
    tx: tokio::sync::mpsc::UnboundedSender<StreamMsg>,
) {
    let Some(llm) = state.llm.clone() else {
        let _ = tx.send(StreamMsg::Error("LLM not configured".into()));
        return;
    };
    let session_id = query.session_id.unwrap_or_else(|| DEFAULT_SESSION.to_string());
    let message = query.message.unwrap_or_default();

    tokio::spawn(async move {
        let (note_tx, mut note_rx) = tokio::sync::mpsc::unbounded_channel::<ProgressNote>();
        let progress_tx = tx.clone();
        let forwarder = tokio::spawn(async move {
            while let Some(note) = note_rx.recv().await {
                if progress_tx.send(StreamMsg::Note(note)).is_err() {
                    break;
                }
            }
        });

        let result = run_agent(&state, llm.as_ref(), &session_id, &message, Some(&note_tx)).await;
        drop(note_tx);
        // Notes stay ordered ahead of the terminal message.
        let _ = forwarder.await;

        let terminal = match result {
            Ok(outcome) => {
                info!(%session_id, "ai_layout_stream: run complete");
                StreamMsg::Final(outcome_body(&outcome))
            }
            Err(e) => {
                error!(error = %e, "ai_layout_stream: agent failed");
                StreamMsg::Error(e.to_string())
            }
        };
        let _ = tx.send(terminal);
    });
}

fn outcome_body(outcome: &AgentOutcome) -> Value {
    json!({
        "layout": outcome.layout,
        "datasets": datasets_to_value(&outcome.datasets),
        "thinking": outcome.trace,
    })
}

fn llm_unavailable() -> (StatusCode, Json<Value>) {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({"error": "LLM not configured"})),
    )
}

#[cfg(test)]
#[path = "layout_test.rs"]
mod tests;
