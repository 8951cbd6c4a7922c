//! Summarize-then-trim retention.
//!
//! Once a transcript grows past `summary_trigger`, every message between the
//! system prompt and the last `max_history` turns is condensed by the model
//! into a single `system` message. A previous summary sits inside that span,
//! so summaries roll forward instead of stacking up. The extra upstream call
//! buys long-range context that the sliding window would throw away.

use crate::config::SummaryFailurePolicy;
use crate::core_types::{Message, Role};
use crate::errors::ChatError;
use crate::llm::{CompletionOptions, LLM};
use crate::memory::{RetentionPolicy, SlidingWindowRetention};
use crate::prompts::{SUMMARIZE_INSTRUCTION, SUMMARY_PREFIX};
use async_trait::async_trait;
use std::sync::Arc;

pub struct SummaryBufferRetention {
    llm: Arc<dyn LLM>,
    max_history: usize,
    summary_trigger: usize,
    options: CompletionOptions,
    on_failure: SummaryFailurePolicy,
    window: SlidingWindowRetention,
}

impl SummaryBufferRetention {
    pub fn new(llm: Arc<dyn LLM>, max_history: usize, summary_trigger: usize) -> Self {
        Self {
            llm,
            max_history,
            summary_trigger,
            options: CompletionOptions::default()
                .with_temperature(0.3)
                .with_max_tokens(200),
            on_failure: SummaryFailurePolicy::default(),
            window: SlidingWindowRetention::new(max_history),
        }
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_failure_policy(mut self, on_failure: SummaryFailurePolicy) -> Self {
        self.on_failure = on_failure;
        self
    }

    async fn predict_summary(&self, span: &[Message]) -> Result<String, ChatError> {
        let lines = span
            .iter()
            .map(|m| {
                let speaker = match m.role {
                    Role::System => "Earlier summary",
                    Role::User => "User",
                    Role::Assistant => "Assistant",
                };
                format!("{}: {}", speaker, m.content)
            })
            .collect::<Vec<String>>()
            .join("\n");

        let request = vec![Message::system(SUMMARIZE_INSTRUCTION), Message::user(lines)];
        let summary = self.llm.generate(&request, &self.options).await?;
        Ok(summary.trim().to_string())
    }
}

#[async_trait]
impl RetentionPolicy for SummaryBufferRetention {
    async fn apply(&self, transcript: &mut Vec<Message>) -> Result<(), ChatError> {
        if transcript.len() <= self.summary_trigger {
            return Ok(());
        }

        // Everything after the prompt except the retained tail.
        let split = transcript.len().saturating_sub(self.max_history);
        if split <= 1 {
            return Ok(());
        }

        log::info!(
            "Transcript has {} messages (trigger {}), summarizing {}",
            transcript.len(),
            self.summary_trigger,
            split - 1
        );

        match self.predict_summary(&transcript[1..split]).await {
            Ok(summary) => {
                log::debug!("New summary: {}", summary);
                let summary_message = Message::system(format!("{}{}", SUMMARY_PREFIX, summary));
                transcript.splice(1..split, std::iter::once(summary_message));
                Ok(())
            }
            Err(e) => match self.on_failure {
                SummaryFailurePolicy::Abort => {
                    log::error!("Summarization failed, aborting request: {}", e);
                    Err(e)
                }
                SummaryFailurePolicy::Trim => {
                    log::warn!("Summarization failed, falling back to trim: {}", e);
                    self.window.trim(transcript);
                    Ok(())
                }
            },
        }
    }

    fn name(&self) -> &'static str {
        "summarize"
    }
}
