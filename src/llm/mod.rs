//! LLM — multi-provider adapter for the layout agent.
//!
//! DESIGN
//! ======
//! Environment-configured. The `LlmClient` enum dispatches to an
//! OpenAI-compatible endpoint (the default, which also serves a local
//! Ollama instance) or Anthropic based on `LLM_PROVIDER`.

pub mod anthropic;
pub mod config;
pub mod openai;
pub mod tools;
pub mod types;

use config::{LlmConfig, LlmProviderKind};
pub use types::LlmChat;
use types::{ChatResponse, LlmError, Message, Tool};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to the configured provider.
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    OpenAi(openai::OpenAiClient),
    Anthropic(anthropic::AnthropicClient),
}

impl LlmClient {
    /// Build an LLM client from environment variables (see
    /// [`LlmConfig::from_env`]).
    ///
    /// # Errors
    ///
    /// Returns an error if a required API key is missing or the HTTP client
    /// fails to build.
    pub fn from_env() -> Result<Self, LlmError> {
        Self::from_config(LlmConfig::from_env()?)
    }

    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model.clone();
        let inner = match config.provider {
            LlmProviderKind::OpenAi => LlmProvider::OpenAi(openai::OpenAiClient::new(
                config.api_key,
                config.base_url,
                config.timeouts,
            )?),
            LlmProviderKind::Anthropic => {
                LlmProvider::Anthropic(anthropic::AnthropicClient::new(config.api_key, config.timeouts)?)
            }
        };
        Ok(Self { inner, model })
    }

    /// The configured model name (e.g. `"qwen3:8b"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmChat for LlmClient {
    async fn chat(
        &self,
        max_tokens: u32,
        system: &str,
        messages: &[Message],
        tools: Option<&[Tool]>,
    ) -> Result<ChatResponse, LlmError> {
        match &self.inner {
            LlmProvider::OpenAi(c) => {
                c.chat(&self.model, max_tokens, system, messages, tools)
                    .await
            }
            LlmProvider::Anthropic(c) => {
                c.chat(&self.model, max_tokens, system, messages, tools)
                    .await
            }
        }
    }
}
