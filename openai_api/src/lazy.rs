use async_trait::async_trait;
use std::sync::Arc;
use text_completion::{CancelSignal, CompletionError, RequestHandler};
use tokio::sync::OnceCell;
use tracing::*;

use crate::secret::{SecretProvider, API_KEY_SECRET_NAME};
use crate::{OpenAIConfig, OpenAIHandler};

/// Process-wide handler, built on the first request that needs it.
///
/// Concurrent first requests share a single initialisation. A failed one
/// (secret missing, bad key) leaves the cell empty and the next request tries again.
pub struct LazyOpenAIHandler {
    config: OpenAIConfig,
    secrets: Arc<dyn SecretProvider>,
    cell: OnceCell<OpenAIHandler>,
}

impl LazyOpenAIHandler {
    pub fn new(config: OpenAIConfig, secrets: Arc<dyn SecretProvider>) -> Self {
        LazyOpenAIHandler {
            config,
            secrets,
            cell: OnceCell::new(),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.cell.initialized()
    }

    pub async fn handler(&self) -> Result<&OpenAIHandler, CompletionError> {
        self.cell
            .get_or_try_init(|| async {
                info!("Initializing OpenAI client for {}", self.config.base_url);
                let api_key = self.secrets.secret(API_KEY_SECRET_NAME).await.map_err(|e| {
                    error!("Cannot read the API key: {}", e);
                    e
                })?;
                let handler = OpenAIHandler::new(&self.config, api_key)?;
                Ok::<_, CompletionError>(handler)
            })
            .await
    }
}

#[async_trait]
impl RequestHandler for LazyOpenAIHandler {
    async fn answer_request(
        &self,
        request: &str,
        cancel: CancelSignal,
    ) -> Result<String, CompletionError> {
        self.handler().await?.answer_request(request, cancel).await
    }

    async fn answer_prompt(&self, prompt: &str) -> Result<String, CompletionError> {
        self.handler().await?.answer_prompt(prompt).await
    }

    async fn check_connection(&self) -> Result<usize, CompletionError> {
        self.handler().await?.check_connection().await
    }
}
