//! Branchline — API error types.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use branchline_core::error::DialogueError;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

/// Startup and runtime errors for the API server.
#[derive(Debug, Error)]
pub enum AppError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Network binding or I/O error.
    #[error("server error: {0}")]
    Server(#[from] std::io::Error),
}

impl From<DialogueError> for AppError {
    fn from(err: DialogueError) -> Self {
        Self::Config(err.to_string())
    }
}

/// JSON body returned for error responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    /// Machine-readable error code.
    pub error: &'static str,
    /// Human-readable error message.
    pub message: String,
}

/// HTTP-layer error for dialogue routes.
#[derive(Debug, Error)]
pub enum ApiError {
    /// An error raised by the dialogue engine.
    #[error(transparent)]
    Dialogue(#[from] DialogueError),

    /// No session with this id is hosted.
    #[error("dialogue session not found: {0}")]
    SessionNotFound(Uuid),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_code) = match &self {
            Self::SessionNotFound(_) => (StatusCode::NOT_FOUND, "session_not_found"),
            Self::Dialogue(DialogueError::Graph(_)) => {
                (StatusCode::BAD_REQUEST, "graph_construction_error")
            }
            Self::Dialogue(DialogueError::ScriptParse(_)) => {
                (StatusCode::BAD_REQUEST, "script_parse_error")
            }
            Self::Dialogue(DialogueError::SessionClosed) => {
                (StatusCode::CONFLICT, "session_closed")
            }
            Self::Dialogue(DialogueError::Config(_)) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "configuration_error")
            }
        };

        let body = ErrorBody {
            error: error_code,
            message: self.to_string(),
        };

        (status, Json(body)).into_response()
    }
}
