//! Layout fetch client — request lifecycle and atomic view swapping.
//!
//! DESIGN
//! ======
//! Fetching a view is a small state machine instead of ad-hoc callback
//! plumbing: each attempt moves through
//! `Idle → Streaming → (FallbackPending →)? Finalized | Failed`, and a
//! generation counter makes results from an abandoned attempt provably
//! discardable. [`RenderSlot`] owns the one piece of shared mutable state
//! (the currently displayed layout + datasets) and replaces it atomically;
//! [`LayoutClient`] drives the transport: SSE first, then exactly one
//! single-shot fallback when the stream dies before its terminal event.

pub mod sse;

use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

use futures::StreamExt;
use serde_json::Value;
use tracing::{debug, warn};

use crate::datasets::{NormalizedDatasets, normalize};
use crate::layout::LayoutNode;
use crate::render::{View, render};
use sse::SseParser;

// =============================================================================
// LIFECYCLE TYPES
// =============================================================================

/// Lifecycle of the latest fetch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchState {
    /// No fetch has started.
    Idle,
    /// The incremental stream is live.
    Streaming,
    /// The stream died before its terminal event; the single-shot retry is
    /// in flight.
    FallbackPending,
    /// A result was applied to the slot.
    Finalized,
    /// Both transports failed; nothing was applied.
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("server returned status {0}")]
    Status(u16),

    #[error("stream reported error: {0}")]
    StreamError(String),

    #[error("stream ended without a terminal event")]
    NoTerminal,

    #[error("response body is not a layout payload")]
    MalformedBody,
}

/// Proof that a result belongs to a specific fetch attempt. Applying with a
/// stale token is a no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderToken {
    generation: u64,
}

/// The finalized payload of one fetch: the raw layout tree plus the
/// normalized datasets resolved against it.
#[derive(Debug, Clone)]
pub struct FinalView {
    pub layout: Value,
    pub datasets: NormalizedDatasets,
}

impl FinalView {
    /// Normalize a terminal response body (`{layout, datasets}` or the
    /// legacy `{layout, data}` shape) into a displayable pair.
    #[must_use]
    pub fn from_body(body: &Value) -> Self {
        let layout = body.get("layout").cloned().unwrap_or(Value::Null);
        let tree = LayoutNode::from_value(&layout);
        let datasets = normalize(tree.as_ref(), body.get("datasets"), body.get("data"));
        Self { layout, datasets }
    }

    /// Interpret the layout against the datasets. `None` when the layout is
    /// absent or not an object.
    #[must_use]
    pub fn render(&self) -> Option<View> {
        LayoutNode::from_value(&self.layout).map(|node| render(&node, &self.datasets))
    }
}

// =============================================================================
// RENDER SLOT
// =============================================================================

struct SlotInner {
    generation: u64,
    state: FetchState,
    displayed: Option<FinalView>,
}

/// Owns the currently displayed view and the generation counter that fences
/// out late results.
pub struct RenderSlot {
    next_generation: AtomicU64,
    inner: Mutex<SlotInner>,
}

impl Default for RenderSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderSlot {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_generation: AtomicU64::new(0),
            inner: Mutex::new(SlotInner {
                generation: 0,
                state: FetchState::Idle,
                displayed: None,
            }),
        }
    }

    /// Start a new fetch attempt: bumps the generation (implicitly abandoning
    /// any in-flight attempt) and moves the slot to `Streaming`.
    pub fn begin(&self) -> RenderToken {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst) + 1;
        let mut inner = self.lock();
        inner.generation = generation;
        inner.state = FetchState::Streaming;
        RenderToken { generation }
    }

    /// Swap the displayed view, all or nothing. Returns `false` and leaves
    /// the slot untouched when the token is stale.
    pub fn apply(&self, token: RenderToken, view: FinalView) -> bool {
        let mut inner = self.lock();
        if token.generation != inner.generation {
            debug!(token = token.generation, current = inner.generation, "discarding stale result");
            return false;
        }
        inner.displayed = Some(view);
        inner.state = FetchState::Finalized;
        true
    }

    /// Record that the stream died and the single-shot retry is starting.
    pub fn mark_fallback_pending(&self, token: RenderToken) {
        let mut inner = self.lock();
        if token.generation == inner.generation {
            inner.state = FetchState::FallbackPending;
        }
    }

    /// Record terminal failure. The previously displayed view is kept.
    pub fn mark_failed(&self, token: RenderToken) {
        let mut inner = self.lock();
        if token.generation == inner.generation {
            inner.state = FetchState::Failed;
        }
    }

    #[must_use]
    pub fn state(&self) -> FetchState {
        self.lock().state
    }

    /// The currently displayed view, if any attempt ever finalized.
    #[must_use]
    pub fn displayed(&self) -> Option<FinalView> {
        self.lock().displayed.clone()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SlotInner> {
        self.inner.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
    }
}

// =============================================================================
// LAYOUT CLIENT
// =============================================================================

/// Progress notice forwarded from the stream, informational only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressNotice {
    pub category: String,
    pub text: String,
}

/// Outcome of a finished fetch attempt.
#[derive(Debug)]
pub struct FetchOutcome {
    /// `false` when a newer attempt superseded this one before it finalized.
    pub applied: bool,
    pub notices: Vec<ProgressNotice>,
}

/// HTTP client for the layout API.
pub struct LayoutClient {
    http: reqwest::Client,
    base_url: String,
}

impl LayoutClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>) -> Result<Self, FetchError> {
        let base_url = base_url.into();
        let base_url = base_url.trim_end_matches('/').to_string();
        let http = reqwest::Client::builder().build()?;
        Ok(Self { http, base_url })
    }

    /// Fetch a view for `message`, streaming first with one single-shot
    /// fallback, and apply the result to `slot`.
    ///
    /// # Errors
    ///
    /// Returns the single-shot error when both transports fail; the slot is
    /// left `Failed` and keeps its previous view.
    pub async fn fetch_layout(
        &self,
        slot: &RenderSlot,
        message: &str,
        session_id: &str,
    ) -> Result<FetchOutcome, FetchError> {
        let token = slot.begin();
        let mut notices = Vec::new();

        let body = match self.stream_attempt(message, session_id, &mut notices).await {
            Ok(body) => body,
            Err(stream_err) => {
                warn!(error = %stream_err, "stream attempt failed, falling back to single-shot");
                slot.mark_fallback_pending(token);
                match self.single_shot(message, session_id).await {
                    Ok(body) => body,
                    Err(final_err) => {
                        slot.mark_failed(token);
                        return Err(final_err);
                    }
                }
            }
        };

        let applied = slot.apply(token, FinalView::from_body(&body));
        Ok(FetchOutcome { applied, notices })
    }

    /// `POST /api/ai_layout` once and return the response body.
    async fn single_shot(&self, message: &str, session_id: &str) -> Result<Value, FetchError> {
        let response = self
            .http
            .post(format!("{}/api/ai_layout", self.base_url))
            .json(&serde_json::json!({"message": message, "session_id": session_id}))
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }
        let body: Value = response.json().await?;
        if body.get("layout").is_none() {
            return Err(FetchError::MalformedBody);
        }
        Ok(body)
    }

    /// Consume `GET /api/ai_layout_stream` until its terminal event.
    async fn stream_attempt(
        &self,
        message: &str,
        session_id: &str,
        notices: &mut Vec<ProgressNotice>,
    ) -> Result<Value, FetchError> {
        let response = self
            .http
            .get(format!("{}/api/ai_layout_stream", self.base_url))
            .query(&[("message", message), ("session_id", session_id)])
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(FetchError::Status(response.status().as_u16()));
        }

        let mut parser = SseParser::new();
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            for event in parser.feed(&chunk) {
                match process_stream_event(&event.event, &event.data, notices) {
                    StreamStep::Continue => {}
                    StreamStep::Final(body) => return Ok(body),
                    StreamStep::Error(message) => return Err(FetchError::StreamError(message)),
                }
            }
        }
        Err(FetchError::NoTerminal)
    }
}

enum StreamStep {
    Continue,
    Final(Value),
    Error(String),
}

/// Interpret one SSE event. Progress events only ever add notices; malformed
/// payloads are dropped without affecting the attempt.
fn process_stream_event(event: &str, data: &str, notices: &mut Vec<ProgressNotice>) -> StreamStep {
    let payload: Value = match serde_json::from_str(data) {
        Ok(payload) => payload,
        Err(_) => {
            debug!(event, "dropping unparseable stream event");
            return StreamStep::Continue;
        }
    };

    match event {
        "final" => {
            if payload.get("layout").is_some() {
                StreamStep::Final(payload)
            } else {
                debug!("dropping terminal event without a layout field");
                StreamStep::Continue
            }
        }
        "error" => StreamStep::Error(
            payload
                .get("error")
                .and_then(Value::as_str)
                .unwrap_or("unknown stream error")
                .to_string(),
        ),
        category => {
            if let Some(text) = payload.get("text").and_then(Value::as_str) {
                notices.push(ProgressNotice { category: category.to_string(), text: text.to_string() });
            }
            StreamStep::Continue
        }
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
