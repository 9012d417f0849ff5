//! Error types for the AI module

use thiserror::Error;

/// AI module error types
#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM error: {0}")]
    Llm(String),

    #[error("{provider} API error ({status}): {message}")]
    LlmHttp {
        provider: String,
        status: u16,
        message: String,
    },

    /// Provider credential is not configured in the process environment.
    #[error("{0} is not set in environment variables")]
    MissingCredential(String),

    #[error("Context error: {0}")]
    Context(String),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for AI operations
pub type Result<T> = std::result::Result<T, AiError>;
