//! Error responses of the chat API.
//!
//! Input problems are reported as `400 {"error": ...}`. Everything else is a
//! `500 {"error": "Internal Server Error", "details": ...}` and is logged.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;
use tracing::error;
use vitabot_ai::AiError;

const INTERNAL_SERVER_ERROR: &str = "Internal Server Error";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The caller sent an invalid or malformed request.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A required setting, such as the provider credential, is missing.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Context loading, prompt rendering or the model call failed.
    #[error("upstream error: {0}")]
    Upstream(String),
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::MissingCredential(_) => ApiError::Configuration(e.to_string()),
            AiError::InvalidInput(message) => ApiError::BadRequest(message),
            other => ApiError::Upstream(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            ApiError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    error: message,
                    details: None,
                },
            ),
            ApiError::Configuration(details) => {
                error!(details = %details, "Chat endpoint is misconfigured");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: INTERNAL_SERVER_ERROR.to_string(),
                        details: Some(details),
                    },
                )
            }
            ApiError::Upstream(details) => {
                error!(details = %details, "Chat request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ErrorBody {
                        error: INTERNAL_SERVER_ERROR.to_string(),
                        details: Some(details),
                    },
                )
            }
        };
        (status, Json(body)).into_response()
    }
}
