//! In-memory session store with idle expiry and a capacity bound.
//!
//! The map itself sits behind a short-lived `std::sync::Mutex`; each session
//! is an `Arc<tokio::sync::Mutex<Session>>` so one request can hold a session
//! across the upstream await while requests on other sessions proceed.

use crate::core_types::{Message, Role};
use crate::errors::ChatError;
use crate::memory::RetentionPolicy;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, Instant};
use uuid::Uuid;

pub type SessionHandle = Arc<tokio::sync::Mutex<Session>>;

/// One conversation. `transcript[0]` is always the system prompt.
#[derive(Debug, Clone)]
pub struct Session {
    id: String,
    transcript: Vec<Message>,
    created_at: DateTime<Utc>,
}

impl Session {
    fn new(id: String, system_prompt: &str) -> Self {
        Self {
            id,
            transcript: vec![Message::system(system_prompt)],
            created_at: Utc::now(),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Callers reject empty text before getting here.
    pub fn append_user_message(&mut self, text: impl Into<String>) {
        self.transcript.push(Message::user(text));
    }

    /// Only called after a successful completion.
    pub fn append_assistant_message(&mut self, text: impl Into<String>) {
        self.transcript.push(Message::assistant(text));
    }

    pub async fn apply_retention_policy(
        &mut self,
        policy: &dyn RetentionPolicy,
    ) -> Result<(), ChatError> {
        let prompt = self.transcript.first().cloned();
        policy.apply(&mut self.transcript).await?;

        if self.transcript.first() != prompt.as_ref() {
            return Err(ChatError::internal(format!(
                "retention policy '{}' did not preserve the system prompt",
                policy.name()
            )));
        }
        Ok(())
    }

    /// Post-reply bound for policies that support one.
    pub fn settle(&mut self, policy: &dyn RetentionPolicy) {
        policy.settle(&mut self.transcript);
    }

    pub(crate) fn snapshot(&self) -> Vec<Message> {
        self.transcript.clone()
    }

    pub(crate) fn restore(&mut self, transcript: Vec<Message>) {
        debug_assert!(matches!(transcript.first(), Some(m) if m.role == Role::System));
        self.transcript = transcript;
    }
}

struct SessionEntry {
    session: SessionHandle,
    last_accessed: Instant,
}

impl SessionEntry {
    /// No request currently holds a handle to this session.
    fn is_idle(&self) -> bool {
        Arc::strong_count(&self.session) == 1
    }

    fn is_expired(&self, ttl: Option<Duration>, now: Instant) -> bool {
        ttl.is_some_and(|ttl| now.duration_since(self.last_accessed) > ttl)
    }
}

pub struct SessionStore {
    system_prompt: String,
    sessions: Mutex<HashMap<String, SessionEntry>>,
    ttl: Option<Duration>,
    capacity: Option<usize>,
}

impl SessionStore {
    /// A store with no expiry and no capacity bound.
    pub fn new(system_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            sessions: Mutex::new(HashMap::new()),
            ttl: None,
            capacity: None,
        }
    }

    pub fn with_ttl(mut self, ttl: Option<Duration>) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn with_capacity(mut self, capacity: Option<usize>) -> Self {
        self.capacity = capacity;
        self
    }

    pub fn system_prompt(&self) -> &str {
        &self.system_prompt
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, SessionEntry>> {
        self.sessions
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Return the session for `session_id`, creating one when the id is
    /// absent, empty, unknown or expired. A known id is returned untouched.
    pub fn resolve_or_create(&self, session_id: Option<&str>) -> (String, SessionHandle) {
        let now = Instant::now();
        let mut sessions = self.lock();

        if let Some(id) = session_id.map(str::trim).filter(|id| !id.is_empty()) {
            match sessions.get_mut(id) {
                Some(entry) if !entry.is_idle() || !entry.is_expired(self.ttl, now) => {
                    entry.last_accessed = now;
                    return (id.to_string(), entry.session.clone());
                }
                Some(_) => {
                    log::info!("Session {} expired, starting a new one", id);
                    sessions.remove(id);
                }
                None => {
                    log::info!("Unknown session {}, starting a new one", id);
                }
            }
        }

        if let Some(capacity) = self.capacity {
            if sessions.len() >= capacity {
                Self::make_room(&mut sessions, capacity, self.ttl, now);
            }
        }

        let id = Uuid::new_v4().to_string();
        let session = Arc::new(tokio::sync::Mutex::new(Session::new(
            id.clone(),
            &self.system_prompt,
        )));
        sessions.insert(
            id.clone(),
            SessionEntry {
                session: session.clone(),
                last_accessed: now,
            },
        );
        log::debug!("Created session {} ({} live)", id, sessions.len());
        (id, session)
    }

    fn make_room(
        sessions: &mut HashMap<String, SessionEntry>,
        capacity: usize,
        ttl: Option<Duration>,
        now: Instant,
    ) {
        sessions.retain(|_, entry| !(entry.is_idle() && entry.is_expired(ttl, now)));

        while sessions.len() >= capacity {
            let oldest = sessions
                .iter()
                .filter(|(_, entry)| entry.is_idle())
                .min_by_key(|(_, entry)| entry.last_accessed)
                .map(|(id, _)| id.clone());
            match oldest {
                Some(id) => {
                    log::info!("Session store at capacity {}, evicting {}", capacity, id);
                    sessions.remove(&id);
                }
                None => {
                    log::warn!(
                        "Session store at capacity {} with every session in use",
                        capacity
                    );
                    break;
                }
            }
        }
    }

    /// Remove sessions idle longer than the TTL. Returns how many were removed.
    pub fn evict_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };
        let now = Instant::now();
        let mut sessions = self.lock();
        let before = sessions.len();
        sessions.retain(|_, entry| !(entry.is_idle() && entry.is_expired(Some(ttl), now)));
        let removed = before - sessions.len();
        if removed > 0 {
            log::info!("Evicted {} idle sessions, {} live", removed, sessions.len());
        }
        removed
    }

    /// Snapshot of a session's transcript, if it exists.
    pub async fn transcript(&self, session_id: &str) -> Option<Vec<Message>> {
        let handle = self.lock().get(session_id).map(|entry| entry.session.clone())?;
        let session = handle.lock().await;
        Some(session.snapshot())
    }

    pub fn contains(&self, session_id: &str) -> bool {
        self.lock().contains_key(session_id)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}
