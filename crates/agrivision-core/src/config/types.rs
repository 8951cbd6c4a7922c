//! Configuration types for the chat proxy
//!
//! Every field carries a serde default so an empty YAML document, or no file
//! at all, yields a working configuration that only lacks the API key.

use crate::errors::ChatError;
use crate::llm::CompletionOptions;
use crate::prompts::AGRIVISION_SYSTEM_PROMPT;
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_API_BASE: &str = "https://api.groq.com/openai/v1";
pub const DEFAULT_MODEL: &str = "llama-3.1-8b-instant";
pub const DEFAULT_API_KEY_ENV: &str = "GROQ_API_KEY";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub llm: LlmConfig,
    #[serde(default)]
    pub memory: MemoryConfig,
    #[serde(default)]
    pub sessions: SessionConfig,
    #[serde(default = "default_system_prompt")]
    pub system_prompt: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            memory: MemoryConfig::default(),
            sessions: SessionConfig::default(),
            system_prompt: default_system_prompt(),
        }
    }
}

impl AppConfig {
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.system_prompt.trim().is_empty() {
            return Err(ChatError::configuration("system_prompt must not be empty"));
        }
        self.llm.validate()?;
        self.memory.validate()?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LlmConfig {
    #[serde(default = "default_api_base")]
    pub api_base: String,
    #[serde(default = "default_model")]
    pub model: String,
    /// Resolved at load time from `api_key_env` when not set inline.
    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_base: default_api_base(),
            model: default_model(),
            api_key: None,
            api_key_env: default_api_key_env(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LlmConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Options for user-facing completions.
    pub fn completion_options(&self) -> CompletionOptions {
        CompletionOptions {
            temperature: self.temperature,
            max_tokens: self.max_tokens,
            timeout: self.timeout(),
        }
    }

    fn validate(&self) -> Result<(), ChatError> {
        if self.api_base.trim().is_empty() {
            return Err(ChatError::configuration("llm.api_base must not be empty"));
        }
        if self.model.trim().is_empty() {
            return Err(ChatError::configuration("llm.model must not be empty"));
        }
        validate_temperature("llm.temperature", self.temperature)?;
        if self.max_tokens == 0 {
            return Err(ChatError::configuration("llm.max_tokens must be greater than 0"));
        }
        if self.timeout_secs == 0 {
            return Err(ChatError::configuration("llm.timeout_secs must be greater than 0"));
        }
        Ok(())
    }
}

/// Which retention policy bounds each transcript.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum RetentionStrategy {
    /// Keep the system prompt plus the most recent `max_history` messages
    #[default]
    SlidingWindow,
    /// Condense the evicted span into a summary message once `summary_trigger` is exceeded
    Summarize,
}

/// What to do when the condensation call fails.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryFailurePolicy {
    /// Propagate the upstream error and abort the request
    #[default]
    Abort,
    /// Log and fall back to the fixed-window trim
    Trim,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryConfig {
    #[serde(default)]
    pub strategy: RetentionStrategy,
    #[serde(default = "default_max_history")]
    pub max_history: usize,
    #[serde(default = "default_summary_trigger")]
    pub summary_trigger: usize,
    #[serde(default = "default_summary_temperature")]
    pub summary_temperature: f32,
    #[serde(default = "default_summary_max_tokens")]
    pub summary_max_tokens: u32,
    #[serde(default)]
    pub on_summary_failure: SummaryFailurePolicy,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            strategy: RetentionStrategy::default(),
            max_history: default_max_history(),
            summary_trigger: default_summary_trigger(),
            summary_temperature: default_summary_temperature(),
            summary_max_tokens: default_summary_max_tokens(),
            on_summary_failure: SummaryFailurePolicy::default(),
        }
    }
}

impl MemoryConfig {
    fn validate(&self) -> Result<(), ChatError> {
        if self.max_history == 0 {
            return Err(ChatError::configuration("memory.max_history must be at least 1"));
        }
        if self.strategy == RetentionStrategy::Summarize {
            // The span handed to the summarizer must be non-empty once the trigger is crossed.
            if self.summary_trigger <= self.max_history + 1 {
                return Err(ChatError::configuration(format!(
                    "memory.summary_trigger ({}) must be greater than max_history + 1 ({})",
                    self.summary_trigger,
                    self.max_history + 1
                )));
            }
            validate_temperature("memory.summary_temperature", self.summary_temperature)?;
            if self.summary_max_tokens == 0 {
                return Err(ChatError::configuration(
                    "memory.summary_max_tokens must be greater than 0",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Idle lifetime of a session in seconds; 0 keeps sessions forever.
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    /// Upper bound on live sessions; 0 means unbounded.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl_secs(),
            max_sessions: default_max_sessions(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

impl SessionConfig {
    pub fn ttl(&self) -> Option<Duration> {
        (self.ttl_secs > 0).then(|| Duration::from_secs(self.ttl_secs))
    }

    pub fn capacity(&self) -> Option<usize> {
        (self.max_sessions > 0).then_some(self.max_sessions)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs.max(1))
    }
}

fn validate_temperature(field: &str, value: f32) -> Result<(), ChatError> {
    if !(0.0..=2.0).contains(&value) {
        return Err(ChatError::configuration(format!(
            "{} must be between 0.0 and 2.0, got {}",
            field, value
        )));
    }
    Ok(())
}

fn default_system_prompt() -> String {
    AGRIVISION_SYSTEM_PROMPT.trim().to_string()
}

fn default_api_base() -> String {
    DEFAULT_API_BASE.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_key_env() -> String {
    DEFAULT_API_KEY_ENV.to_string()
}

fn default_temperature() -> f32 {
    0.7
}

fn default_max_tokens() -> u32 {
    500
}

fn default_timeout_secs() -> u64 {
    20
}

fn default_max_history() -> usize {
    10
}

fn default_summary_trigger() -> usize {
    20
}

fn default_summary_temperature() -> f32 {
    0.3
}

fn default_summary_max_tokens() -> u32 {
    200
}

fn default_ttl_secs() -> u64 {
    3600
}

fn default_max_sessions() -> usize {
    10_000
}

fn default_sweep_interval_secs() -> u64 {
    60
}
