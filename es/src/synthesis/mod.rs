//! Blog post synthesis
//!
//! One completion call turns the finished transcript into text, which is
//! then split by a strict rule: first non-blank line is the title, each
//! following blank-line-separated block is a paragraph.

mod parser;
mod synthesizer;

use thiserror::Error;

use crate::conversation::InvalidStateError;
use crate::llm::UpstreamError;

pub use parser::{BlogContent, parse_blog_text};
pub use synthesizer::BlogSynthesizer;

/// The blog post could not be produced
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("cannot synthesize: {0}")]
    InvalidState(#[from] InvalidStateError),

    #[error("cannot synthesize an empty conversation")]
    EmptyTranscript,

    #[error("completion service failed: {0}")]
    Upstream(#[from] UpstreamError),

    #[error("failed to build synthesis prompt: {0}")]
    Prompt(String),

    #[error("generated post has no title")]
    EmptyTitle,

    #[error("generated post has no paragraphs")]
    NoParagraphs,
}
