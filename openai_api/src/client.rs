use async_trait::async_trait;
use http::header::AUTHORIZATION;
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;
use tracing::*;

use crate::models::{
    Assistant, ChatCompletionRequest, ChatCompletionResponse, ListResponse, Run, Thread,
    ThreadMessage,
};
use crate::OpenAIError;

pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const BETA_HEADER: &str = "OpenAI-Beta";
const BETA_ASSISTANTS: &str = "assistants=v2";
const ORGANIZATION_HEADER: &str = "OpenAI-Organization";

/// The remote endpoints the orchestrator needs.
/// Implemented over HTTP by `AssistantClient`, and by scripted fakes in tests.
#[async_trait]
pub trait AssistantApi: Send + Sync {
    async fn create_thread(&self) -> Result<Thread, OpenAIError>;

    /// Adds a `user` message to the thread.
    async fn add_message(&self, thread_id: &str, content: &str)
        -> Result<ThreadMessage, OpenAIError>;

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, OpenAIError>;

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAIError>;

    /// Newest message first.
    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<ListResponse<ThreadMessage>, OpenAIError>;

    async fn list_assistants(&self) -> Result<ListResponse<Assistant>, OpenAIError>;

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAIError>;
}

/// Cheap to clone, `reqwest::Client` is reference counted.
#[derive(Clone)]
pub struct AssistantClient {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    organization: Option<String>,
}

impl std::fmt::Debug for AssistantClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        //never print the key
        f.debug_struct("AssistantClient")
            .field("base_url", &self.base_url)
            .field("organization", &self.organization)
            .finish_non_exhaustive()
    }
}

impl AssistantClient {
    pub fn new(
        base_url: &str,
        api_key: String,
        organization: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, OpenAIError> {
        if api_key.trim().is_empty() {
            return Err(OpenAIError::Setup("API key is empty".to_string()));
        }
        //a stalled upstream surfaces as a transport error instead of holding the request
        let http = reqwest::Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|e| OpenAIError::Setup(format!("HTTP client: {}", e)))?;
        Ok(AssistantClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            organization,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let mut builder = self
            .http
            .request(method, url)
            .header(AUTHORIZATION, format!("Bearer {}", self.api_key))
            .header(BETA_HEADER, BETA_ASSISTANTS);
        if let Some(org) = &self.organization {
            builder = builder.header(ORGANIZATION_HEADER, org);
        }
        builder
    }

    async fn send<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        builder: RequestBuilder,
    ) -> Result<T, OpenAIError> {
        let response = builder
            .send()
            .await
            .map_err(|source| OpenAIError::Transport { operation, source })?;
        read_json(operation, response).await
    }
}

async fn read_json<T: DeserializeOwned>(
    operation: &'static str,
    response: Response,
) -> Result<T, OpenAIError> {
    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(OpenAIError::Status {
            operation,
            status: status.as_u16(),
            body,
        });
    }

    let body = response
        .text()
        .await
        .map_err(|source| OpenAIError::Transport { operation, source })?;
    trace!("{} response={}", operation, body);
    serde_json::from_str(&body).map_err(|e| OpenAIError::Decode {
        operation,
        message: e.to_string(),
    })
}

#[async_trait]
impl AssistantApi for AssistantClient {
    async fn create_thread(&self) -> Result<Thread, OpenAIError> {
        let builder = self.request(Method::POST, "/threads").json(&json!({}));
        self.send("creating thread", builder).await
    }

    async fn add_message(
        &self,
        thread_id: &str,
        content: &str,
    ) -> Result<ThreadMessage, OpenAIError> {
        let builder = self
            .request(Method::POST, &format!("/threads/{}/messages", thread_id))
            .json(&json!({
                "role": "user",
                "content": content,
            }));
        self.send("sending message", builder).await
    }

    async fn create_run(&self, thread_id: &str, assistant_id: &str) -> Result<Run, OpenAIError> {
        let builder = self
            .request(Method::POST, &format!("/threads/{}/runs", thread_id))
            .json(&json!({ "assistant_id": assistant_id }));
        self.send("creating run", builder).await
    }

    async fn retrieve_run(&self, thread_id: &str, run_id: &str) -> Result<Run, OpenAIError> {
        let builder = self.request(
            Method::GET,
            &format!("/threads/{}/runs/{}", thread_id, run_id),
        );
        self.send("checking run status", builder).await
    }

    async fn list_messages(
        &self,
        thread_id: &str,
    ) -> Result<ListResponse<ThreadMessage>, OpenAIError> {
        let builder = self
            .request(Method::GET, &format!("/threads/{}/messages", thread_id))
            .query(&[("order", "desc")]);
        self.send("retrieving messages", builder).await
    }

    async fn list_assistants(&self) -> Result<ListResponse<Assistant>, OpenAIError> {
        let builder = self.request(Method::GET, "/assistants");
        self.send("listing assistants", builder).await
    }

    async fn chat_completion(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, OpenAIError> {
        let builder = self.request(Method::POST, "/chat/completions").json(request);
        self.send("creating chat completion", builder).await
    }
}
