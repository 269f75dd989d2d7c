//! An interface for handling text completion requests
//!
//! This crate provides a `RequestHandler` trait that defines how a front surface
//! (the HTTP gateway) asks a backend (the OpenAI assistant) for an answer,
//! the error taxonomy shared by both sides, and a small cancellation signal.

mod cancel;
pub use cancel::{cancel_pair, CancelGuard, CancelSignal};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
    System,
}

/// One entry of a conversation, in chronological order.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Upstream unavailable: {0}")]
    UpstreamUnavailable(String),

    #[error("Assistant run failed: {}", .0.as_deref().unwrap_or("Unknown error"))]
    RunFailed(Option<String>),

    #[error("Assistant run did not finish within {0:?}")]
    Timeout(Duration),

    #[error("Request cancelled before the assistant run finished")]
    Cancelled,
}

/// The gateway only knows this trait, not the OpenAI code behind it.
#[async_trait]
pub trait RequestHandler: Send + Sync {
    /// Runs one assistant cycle for the latest user utterance and returns the reply.
    async fn answer_request(
        &self,
        request: &str,
        cancel: CancelSignal,
    ) -> Result<String, CompletionError>;

    /// Single-shot completion with the configured system persona, no assistant run.
    async fn answer_prompt(&self, prompt: &str) -> Result<String, CompletionError>;

    /// Number of assistants visible with the current credential.
    async fn check_connection(&self) -> Result<usize, CompletionError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_failed_without_reason_reads_unknown() {
        let err = CompletionError::RunFailed(None);
        assert_eq!(err.to_string(), "Assistant run failed: Unknown error");
    }

    #[test]
    fn run_failed_carries_upstream_reason() {
        let err = CompletionError::RunFailed(Some("rate_limit_exceeded".to_string()));
        assert_eq!(err.to_string(), "Assistant run failed: rate_limit_exceeded");
    }

    #[test]
    fn roles_use_lowercase_names() {
        let msg: ChatMessage =
            serde_json::from_str(r#"{"role":"assistant","content":"hi"}"#).unwrap();
        assert_eq!(msg.role, Role::Assistant);
        assert!(serde_json::from_str::<ChatMessage>(r#"{"role":"bot","content":"hi"}"#).is_err());
    }
}
