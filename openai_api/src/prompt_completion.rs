use text_completion::CompletionError;
use tracing::*;

use crate::models::{AssistantRequest, ChatCompletionRequest, OpenAIMessage};
use crate::{AssistantApi, ChatConfig};

/// Answers a single prompt through chat completions,
/// with the configured persona as system message.
pub async fn prompt_completion<A: AssistantApi + ?Sized>(
    api: &A,
    chat: &ChatConfig,
    req: AssistantRequest,
) -> Result<String, CompletionError> {
    trace!("prompt_completion model={} prompt={}", chat.model, req.prompt);

    let request = ChatCompletionRequest {
        model: chat.model.clone(),
        messages: vec![
            OpenAIMessage {
                role: "system".to_string(),
                content: chat.system_prompt.clone(),
            },
            OpenAIMessage {
                role: "user".to_string(),
                content: req.prompt.clone(),
            },
        ],
    };
    let response = api.chat_completion(&request).await?;

    let answer = response
        .choices
        .into_iter()
        .next()
        .map(|choice| choice.message.content)
        .ok_or_else(|| {
            CompletionError::UpstreamUnavailable("No completion choice returned".into())
        })?;

    debug!("prompt_completion prompt={} result={}", req.prompt, answer);
    Ok(answer)
}
