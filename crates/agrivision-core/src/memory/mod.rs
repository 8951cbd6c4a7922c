//! Conversation memory: per-session transcripts and the policies that bound them.
//!
//! The session store owns every live transcript. Before a transcript is sent
//! upstream a retention policy caps its length, either by dropping the oldest
//! turns (sliding window) or by folding them into a summary message
//! (summary buffer). Both policies leave element 0, the system prompt, alone.

pub mod session_store;
pub mod sliding_window;
pub mod summary_buffer;

use crate::config::{MemoryConfig, RetentionStrategy};
use crate::core_types::Message;
use crate::errors::ChatError;
use crate::llm::{CompletionOptions, LLM};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

pub use session_store::{Session, SessionHandle, SessionStore};
pub use sliding_window::SlidingWindowRetention;
pub use summary_buffer::SummaryBufferRetention;

#[async_trait]
pub trait RetentionPolicy: Send + Sync {
    /// Bound `transcript` in place. Element 0 must survive untouched.
    async fn apply(&self, transcript: &mut Vec<Message>) -> Result<(), ChatError>;

    /// Bound the stored transcript once the reply is appended. Never calls upstream.
    fn settle(&self, _transcript: &mut Vec<Message>) {}

    fn name(&self) -> &'static str;
}

/// Build the retention policy selected by `config.strategy`.
///
/// `timeout` is the per-call upstream timeout, shared with user completions.
pub fn create_retention_policy(
    config: &MemoryConfig,
    llm: Arc<dyn LLM>,
    timeout: Duration,
) -> Arc<dyn RetentionPolicy> {
    match config.strategy {
        RetentionStrategy::SlidingWindow => {
            Arc::new(SlidingWindowRetention::new(config.max_history))
        }
        RetentionStrategy::Summarize => {
            let options = CompletionOptions {
                temperature: config.summary_temperature,
                max_tokens: config.summary_max_tokens,
                timeout,
            };
            Arc::new(
                SummaryBufferRetention::new(llm, config.max_history, config.summary_trigger)
                    .with_options(options)
                    .with_failure_policy(config.on_summary_failure),
            )
        }
    }
}
