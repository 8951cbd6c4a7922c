//! Fixed-size sliding window retention.
//!
//! Keeps the system prompt plus the `max_history` most recent messages and
//! discards everything in between. Deterministic and free of upstream calls,
//! at the price of forgetting early turns entirely.

use crate::core_types::Message;
use crate::errors::ChatError;
use crate::memory::RetentionPolicy;
use async_trait::async_trait;

#[derive(Debug, Clone)]
pub struct SlidingWindowRetention {
    max_history: usize,
}

impl SlidingWindowRetention {
    pub fn new(max_history: usize) -> Self {
        Self { max_history }
    }

    pub fn max_history(&self) -> usize {
        self.max_history
    }

    /// Drop the oldest turns after element 0. Returns how many were removed.
    pub fn trim(&self, transcript: &mut Vec<Message>) -> usize {
        let limit = 1 + self.max_history;
        if transcript.len() <= limit {
            return 0;
        }
        let excess = transcript.len() - limit;
        transcript.drain(1..1 + excess);
        log::debug!(
            "Sliding window dropped {} messages, {} retained",
            excess,
            transcript.len()
        );
        excess
    }
}

#[async_trait]
impl RetentionPolicy for SlidingWindowRetention {
    async fn apply(&self, transcript: &mut Vec<Message>) -> Result<(), ChatError> {
        self.trim(transcript);
        Ok(())
    }

    fn settle(&self, transcript: &mut Vec<Message>) {
        self.trim(transcript);
    }

    fn name(&self) -> &'static str {
        "sliding-window"
    }
}
