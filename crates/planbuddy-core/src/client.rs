//! HTTP client for the plan relay.

use async_trait::async_trait;
use planbuddy_store::{GeneratedPlan, Horizon};
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::error;

use crate::service::{PlanRequest, PlanSource};

/// Top-level message of every generation failure. The relay sends it as
/// `error`, and the client falls back to it when the envelope has none.
pub const FALLBACK_ERROR: &str = "Failed to generate plan";

/// Errors surfaced to the calling screen.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Non-2xx response. `message` is the envelope's `error` field.
    #[error("{message}")]
    Api {
        status: u16,
        message: String,
        details: Option<String>,
    },

    #[error("unexpected response body: {0}")]
    Decode(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: Option<String>,
    details: Option<String>,
}

/// Body of `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

/// Talks to a running relay at `base_url`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub const DEFAULT_BASE_URL: &str = "http://localhost:3000";

    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// `POST /plan` with `{goal, horizon}`.
    pub async fn generate_plan(
        &self,
        goal: &str,
        horizon: Horizon,
    ) -> Result<GeneratedPlan, ClientError> {
        let request = PlanRequest {
            goal: goal.to_string(),
            horizon,
        };
        let result = self.post_plan(&request).await;
        if let Err(e) = &result {
            error!(error = %e, "API error");
        }
        result
    }

    async fn post_plan(&self, request: &PlanRequest) -> Result<GeneratedPlan, ClientError> {
        let resp = self
            .http
            .post(format!("{}/plan", self.base_url))
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;

        if !status.is_success() {
            let envelope = serde_json::from_str::<ErrorEnvelope>(&body).ok();
            let (message, details) = match envelope {
                Some(env) => (env.error, env.details),
                None => (None, None),
            };
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: message.unwrap_or_else(|| FALLBACK_ERROR.to_string()),
                details,
            });
        }

        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }

    /// `GET /health`.
    pub async fn health(&self) -> Result<HealthStatus, ClientError> {
        let resp = self
            .http
            .get(format!("{}/health", self.base_url))
            .send()
            .await?;
        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(ClientError::Api {
                status: status.as_u16(),
                message: format!("health check failed with status {status}"),
                details: None,
            });
        }
        serde_json::from_str(&body).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

impl Default for ApiClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_BASE_URL)
    }
}

#[async_trait]
impl PlanSource for ApiClient {
    async fn generate_plan(&self, goal: &str, horizon: Horizon) -> anyhow::Result<GeneratedPlan> {
        Ok(ApiClient::generate_plan(self, goal, horizon).await?)
    }
}
