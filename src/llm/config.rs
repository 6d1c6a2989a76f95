//! Configuration for the remote completion service

use crate::config::{parse_var, ConfigError};
use std::time::Duration;

/// Gemini's OpenAI-compatible endpoint
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/openai";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_TIMEOUT_SECS: u64 = 300;

/// Configuration for the LLM provider
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// `None` when no key is configured; requests then fail with an auth error
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub request_timeout: Duration,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

impl LlmConfig {
    /// Read settings through `lookup`, falling back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let timeout_secs = parse_var(&lookup, "CHAT_REQUEST_TIMEOUT_SECS")?
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        if timeout_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "CHAT_REQUEST_TIMEOUT_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            // Empty keys are treated as absent
            api_key: lookup("GEMINI_API_KEY").filter(|k| !k.trim().is_empty()),
            base_url: lookup("CHAT_LLM_BASE_URL")
                .map_or(defaults.base_url, |url| url.trim_end_matches('/').to_string()),
            model: lookup("CHAT_MODEL").unwrap_or(defaults.model),
            request_timeout: Duration::from_secs(timeout_secs),
        })
    }

    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }
}
