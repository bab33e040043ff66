//! ElderStory - conversational memoir assistant
//!
//! Holds a warm, turn-by-turn conversation with an older person over the
//! terminal, then turns the transcript into a titled blog post and saves it
//! as a paginated PDF.
//!
//! # Pipeline
//!
//! [`dialogue::DialogueEngine`] reads lines and asks [`llm::ModelClient`] for
//! replies, recording both sides in a [`conversation::ConversationState`]
//! until the quit word. [`synthesis::BlogSynthesizer`] then makes one more
//! model call over the whole transcript, and [`export::DocumentExporter`]
//! lays the result out and writes it atomically.
//!
//! # Modules
//!
//! - [`conversation`] - Transcript state machine
//! - [`dialogue`] - Turn loop and terminal boundary
//! - [`synthesis`] - Transcript to blog post
//! - [`export`] - Page layout and PDF writing
//! - [`llm`] - Completion service clients
//! - [`prompts`] - Handlebars prompt templates
//! - [`session`] - End-to-end orchestration
//! - [`config`] - Configuration types and loading
//! - [`cli`] - Command-line interface

pub mod cli;
pub mod config;
pub mod conversation;
pub mod dialogue;
pub mod export;
pub mod llm;
pub mod prompts;
pub mod session;
pub mod synthesis;

pub use config::Config;
pub use conversation::{ConversationState, Speaker, Utterance};
pub use dialogue::DialogueEngine;
pub use export::{DocumentExporter, ExportError, ExportResult};
pub use llm::{LlmClient, ModelClient, UpstreamError};
pub use session::StoryPipeline;
pub use synthesis::{BlogContent, BlogSynthesizer, SynthesisError};
