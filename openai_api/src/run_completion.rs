use text_completion::{CancelSignal, CompletionError};
use tokio::time::Instant;
use tracing::*;

use crate::models::{ListResponse, ThreadMessage};
use crate::{AssistantApi, PollConfig};

/// One request-response cycle against the assistant:
/// new thread, user message, run, poll until terminal, newest message.
///
/// A new thread is created on every call, so nothing is remembered between calls.
pub async fn run_completion<A: AssistantApi + ?Sized>(
    api: &A,
    assistant_id: Option<&str>,
    prompt: &str,
    poll: PollConfig,
    mut cancel: CancelSignal,
) -> Result<String, CompletionError> {
    trace!("run_completion prompt={}", prompt);

    let assistant_id = assistant_id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| {
            CompletionError::Configuration("ASSISTANT_ID environment variable is not set".into())
        })?;

    // Step 1: Create a thread
    let thread = api.create_thread().await?;
    debug!("Thread created: {}", thread.id);

    // Step 2: Send the user message to the thread
    api.add_message(&thread.id, prompt).await?;

    // Step 3: Create a run
    let run = api.create_run(&thread.id, assistant_id).await?;
    debug!("Run created: {} thread={}", run.id, thread.id);
    let deadline = Instant::now() + poll.timeout;

    // Step 4: Wait for the run to complete
    let mut polls = 0u32;
    loop {
        if cancel.is_cancelled() {
            info!("Run {} abandoned after {} polls, request cancelled", run.id, polls);
            return Err(CompletionError::Cancelled);
        }

        //a status call that hangs still counts against the deadline, and is dropped on cancel
        let current = tokio::select! {
            result = tokio::time::timeout_at(deadline, api.retrieve_run(&thread.id, &run.id)) => {
                match result {
                    Ok(polled) => polled?,
                    Err(_elapsed) => {
                        warn!(
                            "Run {} status call still pending at the {:?} deadline, giving up",
                            run.id, poll.timeout
                        );
                        return Err(CompletionError::Timeout(poll.timeout));
                    }
                }
            }
            _ = cancel.cancelled() => {
                info!("Run {} abandoned during a status call, request cancelled", run.id);
                return Err(CompletionError::Cancelled);
            }
        };
        polls += 1;
        if current.status.is_terminal() {
            if current.status.is_success() {
                debug!("Run {} completed after {} polls", run.id, polls);
                break;
            }
            warn!("Run {} failed: {:?}", run.id, current);
            return Err(CompletionError::RunFailed(current.failure_reason()));
        }
        trace!("Run {} status: {:?}", run.id, current.status);

        let now = Instant::now();
        if now >= deadline {
            warn!(
                "Run {} still {:?} after {:?}, giving up",
                run.id, current.status, poll.timeout
            );
            return Err(CompletionError::Timeout(poll.timeout));
        }
        let wait = poll.interval.min(deadline - now);
        tokio::select! {
            _ = tokio::time::sleep(wait) => {}
            _ = cancel.cancelled() => {}
        }
    }

    // Step 5: Retrieve the reply, newest message first
    let messages = api.list_messages(&thread.id).await?;
    let reply = latest_reply(&messages)?;

    debug!("run_completion prompt={} result={}", prompt, reply);
    Ok(reply.to_string())
}

/// Text of the newest message in a newest-first list.
pub fn latest_reply(messages: &ListResponse<ThreadMessage>) -> Result<&str, CompletionError> {
    messages
        .data
        .first()
        .and_then(|message| message.first_text())
        .ok_or_else(|| CompletionError::UpstreamUnavailable("No message content found".into()))
}
