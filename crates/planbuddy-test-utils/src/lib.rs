//! Shared test utilities for planbuddy tests.
//!
//! Provides scripted stand-ins for the two external collaborators (the text
//! model and the plan source) plus plan fixtures. Nothing here touches the
//! network.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::json;

use planbuddy_core::{ModelError, PlanSource, TextModel};
use planbuddy_store::{
    GeneratedPlan, GeneratedTask, Horizon, MemoryStore, PlanStore, Priority,
};

/// Fixed "today" used by tests that need a deterministic date.
pub fn test_today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 18).expect("valid date")
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Three tasks, one per priority, all due on [`test_today`].
pub fn sample_generated_plan() -> GeneratedPlan {
    let tasks = [
        ("task-1", "Write the outline", Priority::High, "📝"),
        ("task-2", "Collect references", Priority::Medium, "📚"),
        ("task-3", "Tidy the desk", Priority::Low, "🧹"),
    ]
    .into_iter()
    .map(|(id, title, priority, emoji)| GeneratedTask {
        id: id.to_string(),
        title: title.to_string(),
        due_date: "2026-10-18".to_string(),
        priority,
        notes: Some(format!("Tip for {title}")),
        emoji: Some(emoji.to_string()),
    })
    .collect();
    GeneratedPlan { tasks }
}

/// [`sample_generated_plan`] as the JSON text a model would return.
pub fn sample_model_json() -> String {
    serde_json::to_string_pretty(&sample_generated_plan()).expect("fixture serializes")
}

/// Wrap `body` in a ```` ```json ```` fence, the way models often reply.
pub fn fenced(body: &str) -> String {
    format!("```json\n{body}\n```")
}

/// JSON body for `POST /plan`.
pub fn plan_request_body(goal: &str, horizon: &str) -> serde_json::Value {
    json!({ "goal": goal, "horizon": horizon })
}

/// A plan store over a fresh in-memory backend.
pub fn memory_plan_store() -> PlanStore {
    PlanStore::new(Arc::new(MemoryStore::new()))
}

// ---------------------------------------------------------------------------
// Scripted model
// ---------------------------------------------------------------------------

/// One canned reply from a [`ScriptedModel`].
#[derive(Debug, Clone)]
pub enum Reply {
    Text(String),
    /// Fails with `ModelError::Api { status, message }`.
    Fail { status: u16, message: String },
}

/// A [`TextModel`] that replays canned replies in order and records every
/// prompt it receives. Once the script runs out it keeps repeating the last
/// reply.
#[derive(Debug, Default)]
pub struct ScriptedModel {
    replies: Mutex<VecDeque<Reply>>,
    last: Mutex<Option<Reply>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    pub fn new(replies: impl IntoIterator<Item = Reply>) -> Self {
        Self {
            replies: Mutex::new(replies.into_iter().collect()),
            ..Self::default()
        }
    }

    /// Always answer with `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::new([Reply::Text(text.into())])
    }

    /// Always fail with an upstream error.
    pub fn failing(status: u16, message: impl Into<String>) -> Self {
        Self::new([Reply::Fail {
            status,
            message: message.into(),
        }])
    }

    /// Prompts received so far, oldest first.
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().expect("prompts lock").clone()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().expect("prompts lock").len()
    }
}

#[async_trait]
impl TextModel for ScriptedModel {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ModelError> {
        self.prompts
            .lock()
            .expect("prompts lock")
            .push(prompt.to_string());

        let next = self.replies.lock().expect("replies lock").pop_front();
        let reply = match next {
            Some(reply) => {
                *self.last.lock().expect("last lock") = Some(reply.clone());
                reply
            }
            None => self
                .last
                .lock()
                .expect("last lock")
                .clone()
                .unwrap_or_else(|| Reply::Text(String::new())),
        };

        match reply {
            Reply::Text(text) => Ok(text),
            Reply::Fail { status, message } => Err(ModelError::Api { status, message }),
        }
    }
}

// ---------------------------------------------------------------------------
// Scripted plan source
// ---------------------------------------------------------------------------

/// A [`PlanSource`] returning a fixed outcome and recording requests.
#[derive(Debug)]
pub struct ScriptedSource {
    outcome: Result<GeneratedPlan, String>,
    requests: Mutex<Vec<(String, Horizon)>>,
}

impl ScriptedSource {
    pub fn succeeding(plan: GeneratedPlan) -> Self {
        Self {
            outcome: Ok(plan),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(message.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<(String, Horizon)> {
        self.requests.lock().expect("requests lock").clone()
    }
}

#[async_trait]
impl PlanSource for ScriptedSource {
    async fn generate_plan(&self, goal: &str, horizon: Horizon) -> anyhow::Result<GeneratedPlan> {
        self.requests
            .lock()
            .expect("requests lock")
            .push((goal.to_string(), horizon));
        match &self.outcome {
            Ok(plan) => Ok(plan.clone()),
            Err(message) => Err(anyhow::anyhow!("{message}")),
        }
    }
}
