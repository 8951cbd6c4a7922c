pub mod mock_completion_server;

pub use mock_completion_server::{MockCompletionServer, MockReply, RecordedRequest};

use crate::core_types::Message;
use crate::errors::ChatError;
use crate::llm::{CompletionOptions, LLM};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub messages: Vec<Message>,
    pub options: CompletionOptions,
}

/// In-process `LLM` that replays scripted results and records every call.
#[derive(Clone, Default)]
pub struct ScriptedLLM {
    results: Arc<Mutex<VecDeque<Result<String, ChatError>>>>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    delay: Option<Duration>,
    unconfigured: bool,
    panics: bool,
}

impl ScriptedLLM {
    pub fn new(results: Vec<Result<String, ChatError>>) -> Self {
        Self {
            results: Arc::new(Mutex::new(VecDeque::from(results))),
            ..Default::default()
        }
    }

    /// Answers every call with "reply <n>".
    pub fn echoing() -> Self {
        Self::default()
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn unconfigured() -> Self {
        Self {
            unconfigured: true,
            ..Default::default()
        }
    }

    /// Records the call, then panics inside `generate`.
    pub fn panicking() -> Self {
        Self {
            panics: true,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLM for ScriptedLLM {
    async fn generate(
        &self,
        messages: &[Message],
        options: &CompletionOptions,
    ) -> Result<String, ChatError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(RecordedCall {
                messages: messages.to_vec(),
                options: *options,
            });
            calls.len()
        };
        if self.panics {
            panic!("scripted completion panic");
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let scripted = self.results.lock().unwrap().pop_front();
        scripted.unwrap_or_else(|| Ok(format!("reply {}", call_number)))
    }

    fn ensure_configured(&self) -> Result<(), ChatError> {
        if self.unconfigured {
            Err(ChatError::configuration("GROQ_API_KEY environment variable is not set."))
        } else {
            Ok(())
        }
    }
}
