//! LlmClient trait definition

use async_trait::async_trait;

use super::{CompletionRequest, CompletionResponse, UpstreamError};

/// Stateless completion client - each call carries its full context
///
/// Provider implementations (OpenAI-compatible, Anthropic) and wrappers
/// such as [`super::TimeoutClient`] sit behind this trait so the dialogue
/// and synthesis code can be driven by a test double.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Send a single completion request (blocking until complete)
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse, UpstreamError>;
}
