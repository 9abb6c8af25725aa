//! Plan generation service: request validation and the model round trip.
//!
//! [`PlanRequest::from_json`] enforces the request contract before anything
//! reaches the model. [`PlanGenerator`] then builds the prompt, calls the
//! configured [`TextModel`], and validates the reply into a
//! [`GeneratedPlan`]. Nothing is retried.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use planbuddy_store::{GeneratedPlan, Horizon};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::model::{ModelError, TextModel};
use crate::output::{self, OutputError};
use crate::prompt::build_prompt;

// ---------------------------------------------------------------------------
// Request
// ---------------------------------------------------------------------------

/// A validated `POST /plan` body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRequest {
    pub goal: String,
    pub horizon: Horizon,
}

/// Reasons a request is rejected before reaching the model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Request body must be a JSON object")]
    NotAnObject,

    #[error("Goal is required and must be a string")]
    InvalidGoal,

    #[error("Horizon must be \"today\" or \"week\"")]
    InvalidHorizon,
}

impl PlanRequest {
    /// Validate a raw JSON body.
    ///
    /// `goal` must be a non-empty string, taken verbatim; `horizon` must be
    /// exactly `"today"` or `"week"`. Goal is checked first.
    pub fn from_json(body: &Value) -> Result<Self, ValidationError> {
        let obj = body.as_object().ok_or(ValidationError::NotAnObject)?;

        let goal = match obj.get("goal") {
            Some(Value::String(g)) if !g.is_empty() => g.clone(),
            _ => return Err(ValidationError::InvalidGoal),
        };

        let horizon = obj
            .get("horizon")
            .and_then(Value::as_str)
            .and_then(|h| h.parse::<Horizon>().ok())
            .ok_or(ValidationError::InvalidHorizon)?;

        Ok(Self { goal, horizon })
    }
}

// ---------------------------------------------------------------------------
// Generation
// ---------------------------------------------------------------------------

/// Failures after a request passed validation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("model output is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Output(#[from] OutputError),
}

/// Turns a goal and horizon into a validated plan via a [`TextModel`].
///
/// Holds the configured model for the life of the process; cheap to share
/// behind an `Arc`.
pub struct PlanGenerator {
    model: Arc<dyn TextModel>,
}

impl PlanGenerator {
    pub fn new(model: Arc<dyn TextModel>) -> Self {
        Self { model }
    }

    pub fn model_name(&self) -> &str {
        self.model.name()
    }

    /// Generate a plan anchored on the local calendar date.
    pub async fn generate(&self, request: &PlanRequest) -> Result<GeneratedPlan, GenerateError> {
        self.generate_on(request, Local::now().date_naive()).await
    }

    /// Generate a plan with due dates anchored on `today`.
    pub async fn generate_on(
        &self,
        request: &PlanRequest,
        today: NaiveDate,
    ) -> Result<GeneratedPlan, GenerateError> {
        let prompt = build_prompt(&request.goal, request.horizon, today);
        let raw = self.model.generate(&prompt).await?;
        let value = output::parse_model_output(&raw)?;
        let plan = output::validate_generated(value)?;

        if !(3..=5).contains(&plan.tasks.len()) {
            warn!(
                tasks = plan.tasks.len(),
                "model returned a task count outside 3-5"
            );
        }
        let outside = output::horizon_violations(&plan, request.horizon, today);
        if !outside.is_empty() {
            let ids: Vec<&str> = outside.iter().map(|t| t.id.as_str()).collect();
            warn!(
                horizon = %request.horizon,
                ?ids,
                "model returned due dates outside the horizon"
            );
        }

        info!(
            model = self.model.name(),
            horizon = %request.horizon,
            tasks = plan.tasks.len(),
            "plan generated"
        );
        Ok(plan)
    }
}

// ---------------------------------------------------------------------------
// Plan sources
// ---------------------------------------------------------------------------

/// Anything the creation screen can ask for a fresh plan.
///
/// Implemented by [`crate::ApiClient`] (through the relay) and by
/// [`PlanGenerator`] (straight to the model).
#[async_trait]
pub trait PlanSource: Send + Sync {
    async fn generate_plan(&self, goal: &str, horizon: Horizon) -> anyhow::Result<GeneratedPlan>;
}

#[async_trait]
impl PlanSource for PlanGenerator {
    async fn generate_plan(&self, goal: &str, horizon: Horizon) -> anyhow::Result<GeneratedPlan> {
        let request = PlanRequest {
            goal: goal.to_string(),
            horizon,
        };
        Ok(self.generate(&request).await?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
