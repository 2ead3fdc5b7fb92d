//! Chat history — JSONL-backed session store.
//!
//! DESIGN
//! ======
//! Each message is appended as one JSON line and mirrored per session in
//! memory for quick reads. A session not seen since startup is scanned from
//! disk lazily; malformed lines are skipped, not fatal. `view` records carry
//! the layout/datasets snapshot used by the last-view endpoint.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum HistoryError {
    #[error("history file I/O failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("history record encode failed: {0}")]
    Encode(#[from] serde_json::Error),
}

/// One persisted chat record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryRecord {
    pub ts: String,
    pub session_id: String,
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub thinking: Vec<String>,
    #[serde(default)]
    pub meta: Value,
}

pub struct HistoryStore {
    path: PathBuf,
    inner: Mutex<HashMap<String, Vec<HistoryRecord>>>,
}

impl HistoryStore {
    /// Open (or create the parent directory for) a JSONL history file.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, HistoryError> {
        let path = path.into();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(Self { path, inner: Mutex::new(HashMap::new()) })
    }

    /// Append a record for a session, mirroring it in memory.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be encoded or written. The
    /// in-memory mirror is only updated after a successful write.
    pub fn append(
        &self,
        session_id: &str,
        role: &str,
        content: &str,
        thinking: Vec<String>,
        meta: Value,
    ) -> Result<(), HistoryError> {
        let record = HistoryRecord {
            ts: OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default(),
            session_id: session_id.to_string(),
            role: role.to_string(),
            content: content.to_string(),
            thinking,
            meta,
        };

        let line = serde_json::to_string(&record)?;
        let mut sessions = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);

        // Hydrate the mirror before the write so the new record is not
        // double-counted by a later lazy scan.
        if !sessions.contains_key(session_id) {
            let existing = Self::scan_file(&self.path, session_id);
            sessions.insert(session_id.to_string(), existing);
        }

        let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        writeln!(file, "{line}")?;

        if let Some(records) = sessions.get_mut(session_id) {
            records.push(record);
        }
        Ok(())
    }

    /// All records for a session, oldest first. Serves from memory when the
    /// session has been touched since startup, otherwise scans the file.
    #[must_use]
    pub fn get_session(&self, session_id: &str) -> Vec<HistoryRecord> {
        let mut sessions = self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        sessions
            .entry(session_id.to_string())
            .or_insert_with(|| Self::scan_file(&self.path, session_id))
            .clone()
    }

    /// The most recent `meta.layout` snapshot for a session, with its
    /// datasets, or `None` if the session has no view records.
    #[must_use]
    pub fn last_view(&self, session_id: &str) -> Option<(Value, Value)> {
        let records = self.get_session(session_id);
        records.iter().rev().find_map(|record| {
            let layout = record.meta.get("layout")?;
            if layout.is_null() {
                return None;
            }
            let datasets = record.meta.get("datasets").cloned().unwrap_or(Value::Null);
            Some((layout.clone(), datasets))
        })
    }

    fn scan_file(path: &PathBuf, session_id: &str) -> Vec<HistoryRecord> {
        let Ok(file) = File::open(path) else {
            return Vec::new();
        };
        let mut records = Vec::new();
        for line in BufReader::new(file).lines() {
            let Ok(line) = line else { break };
            match serde_json::from_str::<HistoryRecord>(&line) {
                Ok(record) if record.session_id == session_id => records.push(record),
                Ok(_) => {}
                Err(e) => warn!(error = %e, "skipping malformed history line"),
            }
        }
        records
    }
}

#[cfg(test)]
#[path = "history_test.rs"]
mod tests;
