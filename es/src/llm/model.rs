//! ModelClient: prompt + transcript in, trimmed reply text out

use std::sync::Arc;

use tracing::{debug, info};

use super::{CompletionRequest, LlmClient, Message, StopReason, UpstreamError};
use crate::conversation::{Speaker, Utterance};

/// One request/response call to the completion service
///
/// The prompt becomes the system prompt and each utterance becomes a
/// role-tagged message, oldest first. No retry happens at this level.
#[derive(Clone)]
pub struct ModelClient {
    llm: Arc<dyn LlmClient>,
    max_tokens: u32,
}

impl ModelClient {
    pub fn new(llm: Arc<dyn LlmClient>, max_tokens: u32) -> Self {
        Self { llm, max_tokens }
    }

    /// Send `prompt` and `history`, returning the whitespace-trimmed reply
    pub async fn complete(&self, prompt: &str, history: &[Utterance]) -> Result<String, UpstreamError> {
        debug!(prompt_len = prompt.len(), history_len = history.len(), "ModelClient::complete: called");
        let request = CompletionRequest {
            system_prompt: prompt.to_string(),
            messages: history.iter().map(to_message).collect(),
            max_tokens: self.max_tokens,
        };

        let response = self.llm.complete(request).await?;
        if response.stop_reason == StopReason::MaxTokens {
            info!("ModelClient::complete: reply truncated at max tokens");
        }
        debug!(
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "ModelClient::complete: usage"
        );

        match response.content.as_deref().map(str::trim) {
            Some(text) if !text.is_empty() => Ok(text.to_string()),
            _ => Err(UpstreamError::EmptyResponse),
        }
    }
}

fn to_message(utterance: &Utterance) -> Message {
    match utterance.speaker() {
        Speaker::User => Message::user(utterance.text()),
        Speaker::Assistant => Message::assistant(utterance.text()),
    }
}
