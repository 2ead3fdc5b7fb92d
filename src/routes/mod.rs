//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! Binds the layout-agent API under `/api` with permissive CORS so a browser
//! frontend served from anywhere can talk to it. The streaming endpoint is a
//! GET so `EventSource` can reach it without a fetch polyfill.

pub mod history;
pub mod layout;

use axum::Router;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/ai_layout", post(layout::ai_layout))
        .route("/api/ai_layout_stream", get(layout::ai_layout_stream))
        .route("/api/chat_history", get(history::chat_history))
        .route("/api/last_view", get(history::last_view))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}
