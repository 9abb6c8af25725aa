//! Model error types

use thiserror::Error;

/// Errors that can occur while calling the model.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("model API key is not configured; set GEMINI_API_KEY or model.api_key in the config file")]
    MissingApiKey,

    #[error("API error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("model returned no text (finish reason: {})", .reason.as_deref().unwrap_or("unknown"))]
    EmptyResponse { reason: Option<String> },
}
