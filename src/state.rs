//! Shared application state handed to every route handler.

use std::sync::Arc;

use crate::db::RuntimeDb;
use crate::llm::LlmChat;
use crate::services::history::HistoryStore;

/// Shared state for the HTTP server. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<RuntimeDb>,
    pub history: Arc<HistoryStore>,
    /// `None` when no provider is configured; layout routes return 503.
    pub llm: Option<Arc<dyn LlmChat>>,
}

impl AppState {
    #[must_use]
    pub fn new(db: RuntimeDb, history: HistoryStore, llm: Option<Arc<dyn LlmChat>>) -> Self {
        Self { db: Arc::new(db), history: Arc::new(history), llm }
    }
}

#[cfg(test)]
pub mod test_helpers {
    use std::sync::Arc;

    use super::AppState;
    use crate::db::RuntimeDb;
    use crate::llm::LlmChat;
    use crate::services::history::HistoryStore;

    /// Fresh state with a seeded store and a throwaway history file.
    pub fn test_state(llm: Option<Arc<dyn LlmChat>>) -> AppState {
        let path = std::env::temp_dir().join(format!("aidash-state-{}.jsonl", uuid::Uuid::new_v4()));
        let history = HistoryStore::open(path).unwrap();
        AppState::new(RuntimeDb::seeded(), history, llm)
    }
}
