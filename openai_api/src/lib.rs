//! Client for OpenAI's assistants API.
//!
//! `OpenAIHandler` answers requests by driving an assistant run (thread, message,
//! run, poll, read the reply) or a single chat completion. `LazyOpenAIHandler` builds
//! it on first use, once the API key has been fetched from a `SecretProvider`.

mod client;
pub use client::{AssistantApi, AssistantClient, DEFAULT_BASE_URL};
mod config;
pub use config::{ChatConfig, ConfigError, OpenAIConfig, PollConfig};
mod error;
pub use error::OpenAIError;
mod lazy;
pub use lazy::LazyOpenAIHandler;
pub mod models;
pub use models::AssistantRequest;
mod prompt_completion;
pub use prompt_completion::prompt_completion;
mod run_completion;
pub use run_completion::{latest_reply, run_completion};
pub mod secret;

use async_trait::async_trait;
use std::sync::Arc;
use text_completion::{CancelSignal, CompletionError, RequestHandler};
use tracing::*;

#[derive(Clone)]
pub struct OpenAIHandler {
    pub api: Arc<dyn AssistantApi>,
    pub assistant_id: Option<String>,
    pub poll: PollConfig,
    pub chat: ChatConfig,
}

impl OpenAIHandler {
    pub fn new(config: &OpenAIConfig, api_key: String) -> Result<Self, OpenAIError> {
        let client = AssistantClient::new(
            &config.base_url,
            api_key,
            config.organization.clone(),
            config.request_timeout,
        )?;
        debug!(
            "OpenAI client ready base_url={} request_timeout={:?}",
            client.base_url(),
            config.request_timeout
        );
        Ok(Self::with_api(Arc::new(client), config))
    }

    pub fn with_api(api: Arc<dyn AssistantApi>, config: &OpenAIConfig) -> Self {
        OpenAIHandler {
            api,
            assistant_id: config.assistant_id.clone(),
            poll: config.poll,
            chat: config.chat.clone(),
        }
    }
}

#[async_trait]
impl RequestHandler for OpenAIHandler {
    async fn answer_request(
        &self,
        request: &str,
        cancel: CancelSignal,
    ) -> Result<String, CompletionError> {
        let req = request.to_string();
        let handler = self.clone();

        //The run gets its own task: if the caller goes away, only `cancel` stops the polling,
        //the remote call in flight is allowed to finish.
        tokio::spawn(async move {
            run_completion(
                handler.api.as_ref(),
                handler.assistant_id.as_deref(),
                &req,
                handler.poll,
                cancel,
            )
            .await
        })
        .await
        .map_err(|e| {
            error!("assistant task ended abnormally: {}", e);
            CompletionError::UpstreamUnavailable(format!("assistant task ended abnormally: {}", e))
        })?
    }

    async fn answer_prompt(&self, prompt: &str) -> Result<String, CompletionError> {
        let req = AssistantRequest {
            prompt: prompt.to_string(),
        };
        prompt_completion(self.api.as_ref(), &self.chat, req).await
    }

    async fn check_connection(&self) -> Result<usize, CompletionError> {
        let assistants = self.api.list_assistants().await?;
        Ok(assistants.data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::run_completion::tests::{fast_poll, reply, run, ScriptedApi};
    use std::sync::atomic::Ordering;
    use std::time::Duration;
    use text_completion::cancel_pair;

    fn handler(api: ScriptedApi, assistant_id: Option<&str>) -> OpenAIHandler {
        OpenAIHandler {
            api: Arc::new(api),
            assistant_id: assistant_id.map(String::from),
            poll: fast_poll(),
            chat: ChatConfig::default(),
        }
    }

    /// A handler whose run never leaves `in_progress`, plus the fake to count its polls.
    fn stuck_handler(interval: Duration) -> (OpenAIHandler, Arc<ScriptedApi>) {
        let api = Arc::new(ScriptedApi::new(vec![run("in_progress")], vec![]));
        let handler = OpenAIHandler {
            api: api.clone(),
            assistant_id: Some("asst_1".to_string()),
            poll: PollConfig {
                interval,
                timeout: Duration::from_secs(300),
            },
            chat: ChatConfig::default(),
        };
        (handler, api)
    }

    #[tokio::test]
    async fn answer_request_runs_on_a_task() {
        let h = handler(
            ScriptedApi::new(vec![run("in_progress"), run("completed")], vec![reply("Hi Nick")]),
            Some("asst_1"),
        );
        let answer = h.answer_request("hello", CancelSignal::never()).await.unwrap();
        assert_eq!(answer, "Hi Nick");
    }

    #[tokio::test]
    async fn answer_request_without_assistant_id() {
        let h = handler(ScriptedApi::new(vec![], vec![]), None);
        let err = h.answer_request("hello", CancelSignal::never()).await.unwrap_err();
        assert!(matches!(err, CompletionError::Configuration(_)));
    }

    #[tokio::test]
    async fn dropped_guard_stops_the_spawned_run() {
        let (h, api) = stuck_handler(Duration::from_secs(30));
        let (guard, cancel) = cancel_pair();
        let disconnect = async {
            tokio::time::sleep(Duration::from_millis(20)).await;
            drop(guard);
        };
        let (result, _) = tokio::time::timeout(Duration::from_secs(2), async {
            tokio::join!(h.answer_request("hello", cancel), disconnect)
        })
        .await
        .expect("the spawned run should notice the dropped guard");

        assert!(matches!(result, Err(CompletionError::Cancelled)));
        assert_eq!(api.retrieves.load(Ordering::SeqCst), 1);
        assert_eq!(api.lists.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn abandoned_caller_stops_the_polling() {
        let (h, api) = stuck_handler(Duration::from_millis(10));
        //the caller owns the guard, like the HTTP handler does for its request
        let caller = async {
            let (_guard, cancel) = cancel_pair();
            h.answer_request("hello", cancel).await
        };
        let abandoned = tokio::time::timeout(Duration::from_millis(50), caller).await;
        assert!(abandoned.is_err());

        //give the spawned task a moment to see the cancel, then make sure it stays quiet
        tokio::time::sleep(Duration::from_millis(30)).await;
        let after_cancel = api.retrieves.load(Ordering::SeqCst);
        assert!(after_cancel >= 1);
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(api.retrieves.load(Ordering::SeqCst), after_cancel);
    }

    #[tokio::test]
    async fn answer_prompt_uses_chat_completion() {
        let h = handler(ScriptedApi::new(vec![], vec![]), None);
        assert_eq!(h.answer_prompt("Tagline").await.unwrap(), "echo: Tagline");
    }

    #[tokio::test]
    async fn check_connection_counts_assistants() {
        let h = handler(ScriptedApi::new(vec![], vec![]), None);
        assert_eq!(h.check_connection().await.unwrap(), 1);
    }
}
