//! Common error types for the lookbook generation service

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    /// Network failure or timeout before a response arrived
    ///
    /// Built through [`AppError::transport`] so the request URL never reaches
    /// the message.
    #[error("Transport error: {0}")]
    Transport(reqwest::Error),

    /// HTTP 429 or 5xx from the generation endpoint
    #[error("Server error ({status})")]
    RetryableServer { status: u16 },

    /// HTTP 4xx other than 429; carries the server's own message
    #[error("{message}")]
    ServerRejected { status: u16, message: String },

    /// A successful response that carried no image data
    #[error("Failed to get image data from API")]
    Extraction { raw: String },

    #[error("Invalid response from generation endpoint: {0}")]
    InvalidResponse(String),

    #[error("Invalid embedded image: {0}")]
    Decode(String),

    #[error("{0}")]
    Validation(String),

    #[error("A generation run is already in progress")]
    RunInProgress,

    #[error("No generation run has been started")]
    NoRun,

    #[error("No generation run is active")]
    NoActiveRun,

    #[error("API key is not configured")]
    MissingCredential,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Wrap a client error, dropping the URL and the credential in its query
    pub fn transport(error: reqwest::Error) -> Self {
        AppError::Transport(error.without_url())
    }

    /// Whether the request executor may try the same call again
    pub fn is_retryable(&self) -> bool {
        match self {
            AppError::Transport(e) => !e.is_builder(),
            AppError::RetryableServer { .. } => true,
            _ => false,
        }
    }
}

/// Error response format (OpenAI compatible)
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    pub message: String,
    pub r#type: String,
    pub code: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, code) = match &self {
            AppError::Config(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
            AppError::Transport(_) => (StatusCode::BAD_GATEWAY, "backend_error", Some("transport_failure")),
            AppError::RetryableServer { .. } => (StatusCode::BAD_GATEWAY, "backend_error", Some("upstream_unavailable")),
            AppError::ServerRejected { .. } => (StatusCode::BAD_GATEWAY, "backend_error", Some("upstream_rejected")),
            AppError::Extraction { .. } => (StatusCode::BAD_GATEWAY, "backend_error", Some("no_image_data")),
            AppError::InvalidResponse(_) => (StatusCode::BAD_GATEWAY, "backend_error", None),
            AppError::Decode(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", Some("invalid_image")),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "invalid_request_error", None),
            AppError::RunInProgress => (StatusCode::CONFLICT, "conflict_error", Some("run_in_progress")),
            AppError::NoRun => (StatusCode::NOT_FOUND, "not_found_error", Some("no_run")),
            AppError::NoActiveRun => (StatusCode::CONFLICT, "conflict_error", Some("no_active_run")),
            AppError::MissingCredential => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", Some("missing_api_key")),
            AppError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "server_error", None),
        };

        let body = Json(ErrorResponse {
            error: ErrorDetail {
                message: self.to_string(),
                r#type: error_type.to_string(),
                code: code.map(|c| c.to_string()),
            },
        });

        (status, body).into_response()
    }
}

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, AppError>;
