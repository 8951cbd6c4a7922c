//! Core of the AgriVision chat proxy.
//!
//! This crate holds everything between an inbound chat message and the
//! upstream completion: the message types, the session store that keeps each
//! conversation's transcript, the retention policies that bound a transcript
//! before it is sent, and the OpenAI-compatible completion gateway.
//!
//! # Architecture Overview
//!
//! - **Session store**: process-wide, in-memory transcripts with per-session locking and idle eviction
//! - **Retention policies**: fixed-window trim or summarize-then-trim
//! - **Completion gateway**: provider-agnostic `LLM` trait plus the HTTP client
//! - **Chat service**: the append, retain, complete, append pipeline with rollback on failure
//! - **Configuration system**: YAML settings with environment resolution

pub mod chat;
pub mod config;
pub mod core_types;
pub mod errors;
pub mod llm;
pub mod memory;
pub mod prompts;

pub use chat::ChatService;
pub use config::{AppConfig, ConfigLoader};
pub use core_types::{ChatReply, ChatRequest, Message, Role};
pub use errors::ChatError;
pub use llm::LLM;
pub use memory::{RetentionPolicy, SessionStore};

#[cfg(test)]
pub mod test_utils;
