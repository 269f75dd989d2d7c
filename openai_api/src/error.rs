use text_completion::CompletionError;
use thiserror::Error;

use crate::secret::SecretError;

#[derive(Debug, Error)]
pub enum OpenAIError {
    #[error("Error {operation}: {source}")]
    Transport {
        operation: &'static str,
        #[source]
        source: reqwest::Error,
    },

    #[error("Error {operation}: HTTP {status}: {body}")]
    Status {
        operation: &'static str,
        status: u16,
        body: String,
    },

    #[error("Error {operation}: unexpected response: {message}")]
    Decode {
        operation: &'static str,
        message: String,
    },

    #[error("Invalid client setup: {0}")]
    Setup(String),
}

impl From<OpenAIError> for CompletionError {
    fn from(e: OpenAIError) -> Self {
        match e {
            OpenAIError::Setup(msg) => CompletionError::Configuration(msg),
            other => CompletionError::UpstreamUnavailable(other.to_string()),
        }
    }
}

impl From<SecretError> for CompletionError {
    fn from(e: SecretError) -> Self {
        CompletionError::Configuration(e.to_string())
    }
}
