use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::client::DEFAULT_BASE_URL;

pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1000;
pub const DEFAULT_RUN_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_MODEL: &str = "gpt-3.5-turbo";
pub const DEFAULT_SECRETS_DIR: &str = "/run/secrets";
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Neo, a helpful AI assistant. \
Address the user as Nick. You specialize in writing content like press releases, \
marketing materials, and business communications.";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value:?} ({reason})")]
    Invalid {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// How long to wait for an assistant run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
    pub interval: Duration,
    /// Measured from run creation.
    pub timeout: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        PollConfig {
            interval: Duration::from_millis(DEFAULT_POLL_INTERVAL_MS),
            timeout: Duration::from_secs(DEFAULT_RUN_TIMEOUT_SECS),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatConfig {
    pub model: String,
    pub system_prompt: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        ChatConfig {
            model: DEFAULT_MODEL.to_string(),
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
        }
    }
}

/// Everything the OpenAI side reads from the environment, except the key itself
/// which goes through a `SecretProvider`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenAIConfig {
    /// `ASSISTANT_ID`. Missing is reported on each chat request, not at startup.
    pub assistant_id: Option<String>,
    /// `ORGANIZATION_ID`
    pub organization: Option<String>,
    /// `OPENAI_BASE_URL`
    pub base_url: String,
    /// `OPENAI_REQUEST_TIMEOUT_SECS`, applied to every single HTTP call.
    pub request_timeout: Duration,
    /// `RUN_POLL_INTERVAL_MS`, `RUN_TIMEOUT_SECS`
    pub poll: PollConfig,
    /// `OPENAI_MODEL`, `SYSTEM_PROMPT`
    pub chat: ChatConfig,
    /// `SECRETS_DIR`
    pub secrets_dir: PathBuf,
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        OpenAIConfig {
            assistant_id: None,
            organization: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            poll: PollConfig::default(),
            chat: ChatConfig::default(),
            secrets_dir: PathBuf::from(DEFAULT_SECRETS_DIR),
        }
    }
}

impl OpenAIConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let mut config = OpenAIConfig {
            assistant_id: read("ASSISTANT_ID"),
            organization: read("ORGANIZATION_ID"),
            ..OpenAIConfig::default()
        };

        if let Some(url) = read("OPENAI_BASE_URL") {
            config.base_url = url;
        }
        if let Some(secs) = read("OPENAI_REQUEST_TIMEOUT_SECS") {
            let secs = parse_positive("OPENAI_REQUEST_TIMEOUT_SECS", &secs)?;
            config.request_timeout = Duration::from_secs(secs);
        }
        if let Some(ms) = read("RUN_POLL_INTERVAL_MS") {
            let ms = parse_positive("RUN_POLL_INTERVAL_MS", &ms)?;
            config.poll.interval = Duration::from_millis(ms);
        }
        if let Some(secs) = read("RUN_TIMEOUT_SECS") {
            let secs = parse_positive("RUN_TIMEOUT_SECS", &secs)?;
            config.poll.timeout = Duration::from_secs(secs);
        }
        if let Some(model) = read("OPENAI_MODEL") {
            config.chat.model = model;
        }
        if let Some(prompt) = read("SYSTEM_PROMPT") {
            config.chat.system_prompt = prompt;
        }
        if let Some(dir) = read("SECRETS_DIR") {
            config.secrets_dir = PathBuf::from(dir);
        }
        Ok(config)
    }
}

fn parse_positive(name: &'static str, value: &str) -> Result<u64, ConfigError> {
    match value.trim().parse::<u64>() {
        Ok(0) => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: "must be greater than zero".to_string(),
        }),
        Ok(n) => Ok(n),
        Err(e) => Err(ConfigError::Invalid {
            name,
            value: value.to_string(),
            reason: e.to_string(),
        }),
    }
}
