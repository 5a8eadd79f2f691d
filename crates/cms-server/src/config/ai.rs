//! Groq settings.

use serde::Deserialize;
use studio_connectors::groq::{DEFAULT_BASE_URL, DEFAULT_CONTENT_MODEL, DEFAULT_FAST_MODEL};

/// Content generation settings, prefixed with `GROQ_`.
#[derive(Debug, Clone, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub api_key: Option<String>,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Model used for long-form generation and rewrites
    #[serde(default = "default_content_model")]
    pub content_model: String,

    /// Model used for outlines and meta tags
    #[serde(default = "default_fast_model")]
    pub fast_model: String,
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_content_model() -> String {
    DEFAULT_CONTENT_MODEL.to_string()
}

fn default_fast_model() -> String {
    DEFAULT_FAST_MODEL.to_string()
}

impl AiConfig {
    pub fn from_env() -> Result<Self, envy::Error> {
        envy::prefixed("GROQ_").from_env::<AiConfig>()
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref().filter(|k| !k.trim().is_empty())
    }
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: default_base_url(),
            content_model: default_content_model(),
            fast_model: default_fast_model(),
        }
    }
}
