//! Request pipeline: validate, resolve the session, bound the transcript,
//! complete, record the reply.

use crate::config::AppConfig;
use crate::core_types::{ChatReply, ChatRequest, Message};
use crate::errors::ChatError;
use crate::llm::{CompletionOptions, LLM};
use crate::memory::{create_retention_policy, RetentionPolicy, Session, SessionStore};
use std::sync::Arc;
use tokio::sync::MutexGuard;

pub struct ChatService {
    store: Arc<SessionStore>,
    llm: Arc<dyn LLM>,
    retention: Arc<dyn RetentionPolicy>,
    options: CompletionOptions,
}

impl ChatService {
    pub fn new(
        store: Arc<SessionStore>,
        llm: Arc<dyn LLM>,
        retention: Arc<dyn RetentionPolicy>,
        options: CompletionOptions,
    ) -> Self {
        Self {
            store,
            llm,
            retention,
            options,
        }
    }

    /// Wire the store and retention policy described by `config` around `llm`.
    pub fn from_config(config: &AppConfig, llm: Arc<dyn LLM>) -> Self {
        let store = SessionStore::new(config.system_prompt.clone())
            .with_ttl(config.sessions.ttl())
            .with_capacity(config.sessions.capacity());
        let retention = create_retention_policy(&config.memory, llm.clone(), config.llm.timeout());
        log::info!(
            "Chat service ready: retention={}, max_history={}",
            retention.name(),
            config.memory.max_history
        );
        Self::new(
            Arc::new(store),
            llm,
            retention,
            config.llm.completion_options(),
        )
    }

    pub fn store(&self) -> &Arc<SessionStore> {
        &self.store
    }

    pub fn retention_policy(&self) -> &str {
        self.retention.name()
    }

    /// Handle one user turn.
    ///
    /// The session lock is held from the user append to the reply append, so
    /// concurrent turns on one session run one after another. On failure the
    /// transcript is restored to its state before this turn.
    pub async fn send(&self, request: ChatRequest) -> Result<ChatReply, ChatError> {
        self.llm.ensure_configured()?;

        let message = request.message.trim();
        if message.is_empty() {
            return Err(ChatError::validation("Message cannot be empty."));
        }

        let (session_id, handle) = self.store.resolve_or_create(request.session_id.as_deref());
        let mut turn = PendingTurn::begin(handle.lock().await);

        turn.session.append_user_message(message);
        let outcome = match turn.session.apply_retention_policy(self.retention.as_ref()).await {
            Ok(()) => self.llm.generate(turn.session.transcript(), &self.options).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(reply) => {
                turn.session.append_assistant_message(reply.clone());
                turn.session.settle(self.retention.as_ref());
                log::info!(
                    "Session {}: reply of {} chars, transcript at {} messages",
                    session_id,
                    reply.len(),
                    turn.session.transcript().len()
                );
                turn.commit();
                Ok(ChatReply {
                    response: reply,
                    session_id,
                })
            }
            Err(e) => {
                log::error!("Session {}: request failed: {}", session_id, e);
                Err(e)
            }
        }
    }
}

/// A locked session mid-turn. Dropping it without `commit` puts the
/// transcript back as it was when the turn began, which also covers a
/// cancelled request or a panicking completion.
struct PendingTurn<'a> {
    session: MutexGuard<'a, Session>,
    snapshot: Option<Vec<Message>>,
}

impl<'a> PendingTurn<'a> {
    fn begin(session: MutexGuard<'a, Session>) -> Self {
        let snapshot = Some(session.snapshot());
        Self { session, snapshot }
    }

    fn commit(mut self) {
        self.snapshot = None;
    }
}

impl Drop for PendingTurn<'_> {
    fn drop(&mut self) {
        if let Some(snapshot) = self.snapshot.take() {
            log::debug!("Session {}: turn not completed, restoring transcript", self.session.id());
            self.session.restore(snapshot);
        }
    }
}
