//! The `TextModel` trait.

use async_trait::async_trait;

use super::ModelError;

/// A text-in, text-out generative model.
///
/// The trait is object-safe so a configured instance can be held as
/// `Arc<dyn TextModel>` by the generation service.
#[async_trait]
pub trait TextModel: Send + Sync {
    /// Identifier of the underlying model (e.g. "gemini-2.5-flash").
    fn name(&self) -> &str;

    /// Send `prompt` and return the model's free-form text reply.
    async fn generate(&self, prompt: &str) -> Result<String, ModelError>;
}

// Compile-time assertion: TextModel must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn TextModel) {}
};
