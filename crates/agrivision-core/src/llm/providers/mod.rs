//! LLM provider implementations
//!
//! Groq, OpenAI and most self-hosted gateways speak the same chat-completions
//! protocol, so a single OpenAI-compatible client covers them; the provider is
//! selected by `llm.api_base`.

use crate::config::LlmConfig;
use crate::errors::ChatError;
use crate::llm::LLM;
use std::sync::Arc;

pub mod openai;

/// Create the completion gateway described by the configuration.
pub fn create_llm_client(config: &LlmConfig) -> Result<Arc<dyn LLM>, ChatError> {
    openai::create_client(config)
}
