//! Transcript → blog post via one completion call

use std::sync::Arc;

use tracing::{debug, info};

use super::{BlogContent, SynthesisError, parse_blog_text};
use crate::conversation::{ConversationState, Speaker, Utterance, render_transcript};
use crate::llm::ModelClient;
use crate::prompts::{PromptLoader, SynthesisContext};

/// Turns a finished conversation into a titled, paragraphed blog post
pub struct BlogSynthesizer {
    model: ModelClient,
    prompts: Arc<PromptLoader>,
    context: SynthesisContext,
}

impl BlogSynthesizer {
    pub fn new(model: ModelClient, prompts: Arc<PromptLoader>) -> Self {
        Self {
            model,
            prompts,
            context: SynthesisContext::default(),
        }
    }

    /// Write the post for a terminated, non-empty conversation
    ///
    /// Precondition failures return before any model call is made.
    pub async fn synthesize(&self, conversation: &ConversationState) -> Result<BlogContent, SynthesisError> {
        debug!(utterances = conversation.len(), "BlogSynthesizer::synthesize: called");
        let transcript = conversation.finished_transcript()?;
        if transcript.is_empty() {
            return Err(SynthesisError::EmptyTranscript);
        }

        let prompt = self
            .prompts
            .synthesis(&self.context)
            .map_err(|e| SynthesisError::Prompt(e.to_string()))?;

        // The whole transcript travels as a single user message
        let request = [Utterance::new(Speaker::User, render_transcript(transcript), 0)];
        let text = self.model.complete(&prompt, &request).await?;

        let content = parse_blog_text(&text)?;
        info!(
            title = %content.title,
            paragraphs = content.paragraphs.len(),
            "BlogSynthesizer::synthesize: post written"
        );
        Ok(content)
    }
}
