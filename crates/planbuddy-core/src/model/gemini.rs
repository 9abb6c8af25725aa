//! Google Generative Language API client
//!
//! Implements [`TextModel`] over the `generateContent` REST method. One
//! request per call: no streaming, no retries, no timeout beyond the
//! transport's own.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ModelConfig, ModelError, TextModel};

/// Gemini API client
pub struct GeminiModel {
    model: String,
    api_key: String,
    url: String,
    http: Client,
}

impl GeminiModel {
    /// Create a client from resolved configuration. Fails when no API key
    /// is configured.
    pub fn from_config(config: &ModelConfig) -> Result<Self, ModelError> {
        let api_key = config.api_key.clone().ok_or(ModelError::MissingApiKey)?;
        Ok(Self {
            model: config.model.clone(),
            api_key,
            url: config.generate_url(),
            http: Client::new(),
        })
    }

    /// Build the request body for a single-turn text prompt.
    fn build_request_body(prompt: &str) -> serde_json::Value {
        serde_json::json!({
            "contents": [
                {
                    "role": "user",
                    "parts": [{ "text": prompt }]
                }
            ]
        })
    }
}

#[async_trait]
impl TextModel for GeminiModel {
    fn name(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        debug!(model = %self.model, prompt_len = prompt.len(), "generate: called");

        let resp = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&Self::build_request_body(prompt))
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        debug!(%status, body_len = body.len(), "generate: response received");

        if !status.is_success() {
            return Err(ModelError::Api {
                status: status.as_u16(),
                message: api_error_message(&body),
            });
        }

        extract_text(&body)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Concatenate the text parts of the first candidate.
fn extract_text(body: &str) -> Result<String, ModelError> {
    let parsed: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ModelError::InvalidResponse(format!("failed to parse response: {e}")))?;

    let Some(candidate) = parsed.candidates.into_iter().next() else {
        return Err(ModelError::EmptyResponse { reason: None });
    };

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.is_empty() {
        return Err(ModelError::EmptyResponse {
            reason: candidate.finish_reason,
        });
    }
    Ok(text)
}

/// Pull `error.message` out of an API error body, or fall back to the raw body.
fn api_error_message(body: &str) -> String {
    serde_json::from_str::<ErrorEnvelope>(body)
        .map(|e| e.error.message)
        .unwrap_or_else(|_| body.trim().to_string())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
