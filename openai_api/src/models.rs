use serde::{Deserialize, Serialize};

/// A single prompt for the chat-completion mode.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AssistantRequest {
    pub prompt: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Thread {
    pub id: String,
}

#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Queued,
    InProgress,
    RequiresAction,
    Cancelling,
    Cancelled,
    Failed,
    Completed,
    Incomplete,
    Expired,
    #[serde(other)]
    Unknown,
}

impl RunStatus {
    pub fn is_success(self) -> bool {
        self == RunStatus::Completed
    }

    /// Terminal statuses other than `completed`.
    /// `requires_action` is included: no tool output is ever submitted, so the run cannot move on.
    pub fn is_failure(self) -> bool {
        matches!(
            self,
            RunStatus::Failed
                | RunStatus::Cancelled
                | RunStatus::Expired
                | RunStatus::Incomplete
                | RunStatus::RequiresAction
        )
    }

    pub fn is_terminal(self) -> bool {
        self.is_success() || self.is_failure()
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct LastError {
    pub code: Option<String>,
    pub message: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Run {
    pub id: String,
    #[serde(default)]
    pub thread_id: Option<String>,
    #[serde(default)]
    pub assistant_id: Option<String>,
    pub status: RunStatus,
    #[serde(default)]
    pub last_error: Option<LastError>,
}

impl Run {
    /// Reason to report for a terminal failure.
    pub fn failure_reason(&self) -> Option<String> {
        if let Some(message) = self.last_error.as_ref().and_then(|e| e.message.clone()) {
            return Some(message);
        }
        match self.status {
            RunStatus::Failed => None,
            RunStatus::RequiresAction => {
                Some("run requires action, tool calls are not supported".to_string())
            }
            status => Some(format!("run ended with status {:?}", status)),
        }
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TextValue {
    pub value: String,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        text: TextValue,
    },
    //image_file, image_url, refusal... nothing we can relay as text
    #[serde(other)]
    Other,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ThreadMessage {
    pub id: String,
    pub role: String,
    #[serde(default)]
    pub content: Vec<MessageContent>,
}

impl ThreadMessage {
    pub fn first_text(&self) -> Option<&str> {
        self.content.iter().find_map(|part| match part {
            MessageContent::Text { text } => Some(text.value.as_str()),
            MessageContent::Other => None,
        })
    }
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ListResponse<T> {
    pub data: Vec<T>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct Assistant {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq, Eq)]
pub struct OpenAIMessage {
    pub role: String,
    pub content: String,
}

#[derive(Serialize, Debug, Clone)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<OpenAIMessage>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionChoice {
    pub message: OpenAIMessage,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn assistant_request_reads_the_completion_body() {
        let req: AssistantRequest =
            serde_json::from_value(json!({ "prompt": "Write a tagline" })).unwrap();
        assert_eq!(req.prompt, "Write a tagline");
        assert!(serde_json::from_value::<AssistantRequest>(json!({})).is_err());
    }

    #[test]
    fn unknown_status_does_not_break_decoding() {
        let run: Run = serde_json::from_value(json!({
            "id": "run_1",
            "status": "some_future_status"
        }))
        .unwrap();
        assert_eq!(run.status, RunStatus::Unknown);
        assert!(!run.status.is_terminal());
    }

    #[test]
    fn status_classification() {
        assert!(RunStatus::Completed.is_success());
        assert!(RunStatus::Failed.is_failure());
        assert!(RunStatus::Expired.is_failure());
        assert!(!RunStatus::Queued.is_terminal());
        assert!(!RunStatus::InProgress.is_terminal());
        assert!(!RunStatus::Cancelling.is_terminal());
    }

    #[test]
    fn failure_reason_prefers_upstream_message() {
        let run: Run = serde_json::from_value(json!({
            "id": "run_1",
            "status": "failed",
            "last_error": { "code": "server_error", "message": "Something broke" }
        }))
        .unwrap();
        assert_eq!(run.failure_reason().as_deref(), Some("Something broke"));

        let bare: Run =
            serde_json::from_value(json!({ "id": "run_2", "status": "failed" })).unwrap();
        assert_eq!(bare.failure_reason(), None);

        let expired: Run =
            serde_json::from_value(json!({ "id": "run_3", "status": "expired" })).unwrap();
        assert_eq!(
            expired.failure_reason().as_deref(),
            Some("run ended with status Expired")
        );
    }

    #[test]
    fn first_text_skips_non_text_parts() {
        let msg: ThreadMessage = serde_json::from_value(json!({
            "id": "msg_1",
            "role": "assistant",
            "content": [
                { "type": "image_file", "image_file": { "file_id": "file_1" } },
                { "type": "text", "text": { "value": "Hello Nick", "annotations": [] } }
            ]
        }))
        .unwrap();
        assert_eq!(msg.first_text(), Some("Hello Nick"));
    }
}
