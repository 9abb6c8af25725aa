//! Turning raw model text into a validated [`GeneratedPlan`].
//!
//! Three steps: strip Markdown code fences, parse JSON, then check the result
//! against the task schema:
//! - `tasks` is an array of objects with the required fields.
//! - `priority` is one of the three literals.
//! - `id` and `title` are non-empty.
//! - `dueDate` is a real `YYYY-MM-DD` calendar date.
//! - Task ids are unique.
//!
//! Task counts and due-date windows are model-quality properties: they are
//! reported by [`horizon_violations`] for logging but never rejected here.

use std::collections::HashSet;

use chrono::{Duration, NaiveDate};
use planbuddy_store::{GeneratedPlan, GeneratedTask, Horizon};
use serde_json::Value;
use thiserror::Error;

/// Date format used by `dueDate`.
pub const DUE_DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors from validating parsed model output.
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("model output is not a JSON object")]
    NotAnObject,

    #[error("model output does not match the task schema: {0}")]
    Shape(#[source] serde_json::Error),

    #[error("task #{index} has an empty {field}")]
    EmptyField { index: usize, field: &'static str },

    #[error("task {task:?} has invalid dueDate {value:?} (expected YYYY-MM-DD)")]
    InvalidDueDate { task: String, value: String },

    #[error("duplicate task id: {0:?}")]
    DuplicateTaskId(String),
}

/// Remove every Markdown code-fence marker (```` ```json ```` and
/// ```` ``` ````, each with an optional trailing newline) and trim.
pub fn strip_code_fences(text: &str) -> String {
    text.replace("```json\n", "")
        .replace("```json", "")
        .replace("```\n", "")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Strip fences from `text` and parse what remains as JSON.
pub fn parse_model_output(text: &str) -> Result<Value, serde_json::Error> {
    serde_json::from_str(&strip_code_fences(text))
}

/// Check a parsed value against the task schema.
pub fn validate_generated(value: Value) -> Result<GeneratedPlan, OutputError> {
    if !value.is_object() {
        return Err(OutputError::NotAnObject);
    }
    let plan: GeneratedPlan = serde_json::from_value(value).map_err(OutputError::Shape)?;

    let mut seen = HashSet::new();
    for (index, task) in plan.tasks.iter().enumerate() {
        if task.id.trim().is_empty() {
            return Err(OutputError::EmptyField { index, field: "id" });
        }
        if task.title.trim().is_empty() {
            return Err(OutputError::EmptyField {
                index,
                field: "title",
            });
        }
        if NaiveDate::parse_from_str(&task.due_date, DUE_DATE_FORMAT).is_err() {
            return Err(OutputError::InvalidDueDate {
                task: task.id.clone(),
                value: task.due_date.clone(),
            });
        }
        if !seen.insert(task.id.as_str()) {
            return Err(OutputError::DuplicateTaskId(task.id.clone()));
        }
    }

    Ok(plan)
}

/// Tasks whose due date falls outside the window `horizon` allows from
/// `today`. Assumes the plan already passed [`validate_generated`].
pub fn horizon_violations<'a>(
    plan: &'a GeneratedPlan,
    horizon: Horizon,
    today: NaiveDate,
) -> Vec<&'a GeneratedTask> {
    let last = today + Duration::days(horizon.window_days());
    plan.tasks
        .iter()
        .filter(|t| match NaiveDate::parse_from_str(&t.due_date, DUE_DATE_FORMAT) {
            Ok(due) => due < today || due > last,
            Err(_) => true,
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
