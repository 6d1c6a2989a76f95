//! Server configuration from environment variables

use crate::llm::LlmConfig;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8501;
pub const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

/// Parse an optional variable, reporting which one was malformed.
pub fn parse_var<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    lookup(name)
        .map(|raw| {
            raw.trim().parse::<T>().map_err(|e| ConfigError::Invalid {
                name,
                reason: format!("{e} (got {raw:?})"),
            })
        })
        .transpose()
}

fn parse_flag(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<bool, ConfigError> {
    match lookup(name).as_deref().map(str::trim) {
        None | Some("" | "0" | "false" | "no" | "off") => Ok(false),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some(other) => Err(ConfigError::Invalid {
            name,
            reason: format!("expected a boolean, got {other:?}"),
        }),
    }
}

/// Top-level settings for the chat server
#[derive(Debug, Clone)]
pub struct ChatConfig {
    pub port: u16,
    pub llm: LlmConfig,
    /// Replaces the built-in persona when set
    pub system_prompt_file: Option<PathBuf>,
    /// Count reported usage into each session's token counter
    pub meter_tokens: bool,
    /// Sessions untouched for this long are discarded
    pub session_idle: Duration,
}

impl ChatConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let idle_secs = parse_var(&lookup, "CHAT_SESSION_IDLE_SECS")?
            .unwrap_or(DEFAULT_SESSION_IDLE_SECS);
        if idle_secs == 0 {
            return Err(ConfigError::Invalid {
                name: "CHAT_SESSION_IDLE_SECS",
                reason: "must be greater than zero".to_string(),
            });
        }

        Ok(Self {
            port: parse_var(&lookup, "CHAT_PORT")?.unwrap_or(DEFAULT_PORT),
            llm: LlmConfig::from_lookup(&lookup)?,
            system_prompt_file: lookup("CHAT_SYSTEM_PROMPT_FILE")
                .filter(|p| !p.is_empty())
                .map(PathBuf::from),
            meter_tokens: parse_flag(&lookup, "CHAT_METER_TOKENS")?,
            session_idle: Duration::from_secs(idle_secs),
        })
    }
}
