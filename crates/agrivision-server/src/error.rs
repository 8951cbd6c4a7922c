//! Error types for the HTTP layer.

use agrivision_core::ChatError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;
use thiserror::Error;

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;

/// Errors that can occur in the chat server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Failure inside the chat pipeline
    #[error(transparent)]
    Chat(#[from] ChatError),

    /// Request body could not be decoded
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Server configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal server error
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ServerError {
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

/// Convert ServerError to HTTP status code
impl ServerError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServerError::Chat(e) if e.is_client_error() => StatusCode::BAD_REQUEST,
            ServerError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            ServerError::Chat(_)
            | ServerError::Config(_)
            | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_type(&self) -> &'static str {
        match self {
            ServerError::Chat(e) => match e {
                ChatError::Configuration(_) => "configuration_error",
                ChatError::Validation(_) => "validation_error",
                ChatError::Timeout => "timeout_error",
                ChatError::Upstream { .. } => "upstream_error",
                ChatError::MalformedResponse(_) => "malformed_response",
                ChatError::Internal(_) => "internal_error",
            },
            ServerError::InvalidRequest(_) => "invalid_request",
            ServerError::Config(_) => "config_error",
            ServerError::Internal(_) => "internal_error",
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(json!({
            "detail": self.to_string(),
            "error_type": self.error_type(),
        }));
        (status, body).into_response()
    }
}
