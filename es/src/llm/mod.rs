//! Completion service client module
//!
//! Provider clients sit behind [`LlmClient`]; [`ModelClient`] adapts one to
//! the prompt-plus-transcript call the dialogue and synthesis code make.

use std::sync::Arc;
use std::time::Duration;

use tracing::debug;

mod anthropic;
pub mod client;
mod error;
mod http;
mod model;
mod openai;
mod timeout;
mod types;

pub use anthropic::AnthropicClient;
pub use client::LlmClient;
pub use error::UpstreamError;
pub use model::ModelClient;
pub use openai::OpenAIClient;
pub use timeout::TimeoutClient;
pub use types::{CompletionRequest, CompletionResponse, Message, Role, StopReason, TokenUsage};

use crate::config::ResolvedLlmConfig;

/// Create an LLM client based on the provider specified in config
///
/// Supports "groq", "openai" and "anthropic". When `timeout-ms` is set the
/// client is wrapped in a [`TimeoutClient`].
pub fn create_client(config: &ResolvedLlmConfig) -> Result<Arc<dyn LlmClient>, UpstreamError> {
    debug!(provider = %config.provider, model = %config.model, "create_client: called");
    let client: Arc<dyn LlmClient> = match config.provider.as_str() {
        "groq" | "openai" => {
            debug!("create_client: creating OpenAI-compatible client");
            Arc::new(OpenAIClient::from_config(config)?)
        }
        "anthropic" => {
            debug!("create_client: creating Anthropic client");
            Arc::new(AnthropicClient::from_config(config)?)
        }
        other => {
            debug!(provider = %other, "create_client: unknown provider");
            return Err(UpstreamError::Config(format!(
                "Unknown LLM provider: '{}'. Supported: groq, openai, anthropic",
                other
            )));
        }
    };

    match config.timeout_ms {
        Some(ms) => Ok(Arc::new(TimeoutClient::new(client, Duration::from_millis(ms)))),
        None => Ok(client),
    }
}
