//! Access to the external text-generation model.
//!
//! The [`TextModel`] trait is the seam between plan generation and a concrete
//! provider. [`GeminiModel`] talks to Google's Generative Language API; tests
//! substitute scripted implementations.
//!
//! ```text
//! PlanGenerator --generate(prompt)--> &dyn TextModel --> raw text
//! ```

pub mod config;
pub mod error;
pub mod gemini;
pub mod trait_def;

pub use config::ModelConfig;
pub use error::ModelError;
pub use gemini::GeminiModel;
pub use trait_def::TextModel;
