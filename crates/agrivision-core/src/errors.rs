//! Error types for the chat pipeline
//!
//! Every failure between the inbound request and the upstream completion maps
//! onto one `ChatError` variant. The variants follow the pipeline stages
//! (configuration, caller input, upstream transport, upstream payload) so the
//! HTTP layer can classify them as client or server faults without inspecting
//! message text.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    /// Required credential or setting is missing or invalid.
    #[error("{0}")]
    Configuration(String),
    /// Caller-supplied input was rejected before any upstream call.
    #[error("{0}")]
    Validation(String),
    /// Upstream call exceeded the configured duration.
    #[error("Request to upstream API timed out.")]
    Timeout,
    /// Upstream returned a non-success status.
    #[error("Upstream API error: {body}")]
    Upstream { status: u16, body: String },
    /// Upstream returned success but no usable reply.
    #[error("Invalid response format from upstream API.")]
    MalformedResponse(String),
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ChatError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn malformed(msg: impl Into<String>) -> Self {
        Self::MalformedResponse(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// True when the caller, not the proxy or upstream, is at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, ChatError::Validation(_))
    }
}

impl From<reqwest::Error> for ChatError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ChatError::Timeout
        } else {
            ChatError::Internal(format!("HTTP request failed: {}", err))
        }
    }
}

impl From<serde_yaml::Error> for ChatError {
    fn from(err: serde_yaml::Error) -> Self {
        ChatError::Configuration(format!("Failed to parse YAML config: {}", err))
    }
}
