//! Session history routes.

use axum::extract::{Query, State};
use axum::response::Json;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::routes::layout::DEFAULT_SESSION;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct SessionQuery {
    pub session_id: Option<String>,
}

/// `GET /api/chat_history` — all persisted records for a session, in append
/// order.
pub async fn chat_history(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<Value> {
    let session_id = query.session_id.unwrap_or_else(|| DEFAULT_SESSION.to_string());
    let records = state.history.get_session(&session_id);
    Json(json!({"session_id": session_id, "messages": records}))
}

/// `GET /api/last_view` — the most recent layout + datasets snapshot, so a
/// reloading client can restore its view. Both fields are `null` when the
/// session has no snapshot yet.
pub async fn last_view(
    State(state): State<AppState>,
    Query(query): Query<SessionQuery>,
) -> Json<Value> {
    let session_id = query.session_id.unwrap_or_else(|| DEFAULT_SESSION.to_string());
    match state.history.last_view(&session_id) {
        Some((layout, datasets)) => Json(json!({"layout": layout, "datasets": datasets})),
        None => Json(json!({"layout": Value::Null, "datasets": Value::Null})),
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
