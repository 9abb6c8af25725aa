//! Plan generation: prompt construction, model access, output validation,
//! the relay's client, and the client-side screen state machine.

pub mod client;
pub mod model;
pub mod output;
pub mod prompt;
pub mod screens;
pub mod service;

pub use client::{ApiClient, ClientError, FALLBACK_ERROR, HealthStatus};
pub use model::{GeminiModel, ModelConfig, ModelError, TextModel};
pub use output::{OutputError, parse_model_output, strip_code_fences};
pub use prompt::build_prompt;
pub use screens::{CreateScreen, PlanScreen, Screen, Session, SubmitError};
pub use service::{GenerateError, PlanGenerator, PlanRequest, PlanSource, ValidationError};
