use std::env;

/// Connection settings for the Generative Language API.
///
/// Reads `GEMINI_API_KEY`, `PLANBUDDY_MODEL` and `PLANBUDDY_MODEL_BASE_URL`,
/// falling back to the defaults below for everything but the key.
#[derive(Clone)]
pub struct ModelConfig {
    /// API credential. `None` until configured; calls fail without it.
    pub api_key: Option<String>,
    /// Model identifier.
    pub model: String,
    /// Scheme and host of the API, without a trailing slash.
    pub base_url: String,
}

impl ModelConfig {
    pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
    pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

    /// Build a config from the environment.
    pub fn from_env() -> Self {
        Self {
            api_key: env::var("GEMINI_API_KEY").ok().filter(|k| !k.is_empty()),
            model: env::var("PLANBUDDY_MODEL").unwrap_or_else(|_| Self::DEFAULT_MODEL.to_owned()),
            base_url: env::var("PLANBUDDY_MODEL_BASE_URL")
                .unwrap_or_else(|_| Self::DEFAULT_BASE_URL.to_owned()),
        }
    }

    /// Build a config from an explicit key with default model and endpoint.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: Some(api_key.into()),
            model: Self::DEFAULT_MODEL.to_owned(),
            base_url: Self::DEFAULT_BASE_URL.to_owned(),
        }
    }

    /// URL of the `generateContent` method for the configured model.
    pub fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            self.model
        )
    }
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self::from_env()
    }
}

// The key never appears in logs.
impl std::fmt::Debug for ModelConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}
