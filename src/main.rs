mod client;
mod datasets;
mod db;
mod labels;
mod layout;
mod llm;
mod render;
mod routes;
mod services;
mod state;

use std::sync::Arc;

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    tracing_subscriber::fmt::init();

    let port: u16 = std::env::var("PORT")
        .unwrap_or_else(|_| "8000".into())
        .parse()
        .expect("invalid PORT");
    let history_path =
        std::env::var("HISTORY_PATH").unwrap_or_else(|_| "data/chat_history.jsonl".into());

    let history = services::history::HistoryStore::open(&history_path)
        .expect("history store init failed");
    let db = db::RuntimeDb::seeded();

    // Initialize LLM client (non-fatal: layout routes return 503 if config missing).
    let llm: Option<Arc<dyn llm::LlmChat>> = match llm::LlmClient::from_env() {
        Ok(client) => {
            tracing::info!(model = client.model(), "LLM client initialized");
            Some(Arc::new(client))
        }
        Err(e) => {
            tracing::warn!(error = %e, "LLM client not configured — layout agent disabled");
            None
        }
    };

    let state = state::AppState::new(db, history, llm);

    let app = routes::app(state);
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{port}"))
        .await
        .expect("failed to bind");

    tracing::info!(%port, "aidash listening");
    axum::serve(listener, app).await.expect("server failed");
}
