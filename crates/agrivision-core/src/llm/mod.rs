//! Completion gateway abstractions.
//!
//! Defines the `LLM` trait the chat service and the summarizing retention
//! policy talk to, and the per-call options shared by both. The concrete
//! OpenAI-compatible HTTP client lives in `providers`.

pub use crate::core_types::Message;
use crate::errors::ChatError;
use async_trait::async_trait;
use std::time::Duration;

pub mod providers;

pub use providers::openai::OpenAIClient;

/// Per-call generation knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionOptions {
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout: Duration,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 500,
            timeout: Duration::from_secs(20),
        }
    }
}

impl CompletionOptions {
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[async_trait]
pub trait LLM: Send + Sync {
    /// Send `messages` upstream and return the first choice's text.
    ///
    /// A single attempt is made; failures are never retried.
    async fn generate(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, ChatError>;

    /// Fails with `ChatError::Configuration` when the credential is missing.
    fn ensure_configured(&self) -> Result<(), ChatError> {
        Ok(())
    }
}
