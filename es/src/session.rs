//! One interview from greeting to saved PDF
//!
//! Wires the dialogue engine, synthesizer and exporter together the way the
//! binary runs them: converse until quit, write the post, save it, report.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Local;
use eyre::{Context, Result};
use thiserror::Error;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::config::{Config, ExportConfig, ResolvedLlmConfig};
use crate::conversation::ConversationState;
use crate::dialogue::{DialogueEngine, DialogueError, Terminal, TerminalError};
use crate::export::{DocumentExporter, ExportResult, default_output_path};
use crate::llm::{ModelClient, create_client};
use crate::prompts::PromptLoader;
use crate::synthesis::{BlogSynthesizer, SynthesisError};

/// Shown while the post is being written
pub const GENERATING_NOTICE: &str = "Generating your story...";

/// Failures that end a session before a PDF could be attempted
#[derive(Debug, Error)]
pub enum SessionError {
    #[error(transparent)]
    Dialogue(#[from] DialogueError),

    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error("could not write your story: {0}")]
    Synthesis(#[from] SynthesisError),
}

/// Conversation, synthesis and export for one process run
pub struct StoryPipeline {
    session_id: Uuid,
    engine: DialogueEngine,
    synthesizer: BlogSynthesizer,
    exporter: DocumentExporter,
    export_config: ExportConfig,
    output: Option<PathBuf>,
}

impl StoryPipeline {
    pub fn new(
        engine: DialogueEngine,
        synthesizer: BlogSynthesizer,
        exporter: DocumentExporter,
        export_config: ExportConfig,
    ) -> Self {
        Self {
            session_id: Uuid::now_v7(),
            engine,
            synthesizer,
            exporter,
            export_config,
            output: None,
        }
    }

    /// Build the pipeline from configuration and an already-resolved credential
    ///
    /// The conversation and the synthesis use separate models over the same
    /// provider.
    pub fn from_config(config: &Config, resolved: &ResolvedLlmConfig, prompts: Arc<PromptLoader>) -> Result<Self> {
        debug!(?resolved, "StoryPipeline::from_config: called");
        let chat = create_client(resolved).context("Failed to create LLM client")?;

        let synthesis_config = resolved.with_model(&config.llm.synthesis_model, config.llm.synthesis_max_tokens);
        let synthesis = create_client(&synthesis_config).context("Failed to create synthesis LLM client")?;

        let engine = DialogueEngine::new(
            ModelClient::new(chat, resolved.max_tokens),
            prompts.clone(),
            config.conversation.clone(),
        );
        let synthesizer = BlogSynthesizer::new(ModelClient::new(synthesis, synthesis_config.max_tokens), prompts);
        let exporter = DocumentExporter::new(config.export.layout.clone());

        Ok(Self::new(engine, synthesizer, exporter, config.export.clone()))
    }

    /// Write to this path instead of a timestamped one
    pub fn with_output(mut self, output: Option<PathBuf>) -> Self {
        self.output = output;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run the whole session against `terminal`
    ///
    /// Synthesis and export failures are shown to the user before returning.
    /// The returned [`ExportResult`] may still describe a failed write.
    pub async fn run<T: Terminal + ?Sized>(&mut self, terminal: &mut T) -> Result<ExportResult, SessionError> {
        info!(session_id = %self.session_id, "Session started");
        let mut conversation = ConversationState::new();

        self.engine.run(terminal, &mut conversation).await?;
        info!(
            session_id = %self.session_id,
            utterances = conversation.len(),
            "Conversation finished"
        );

        terminal.show_notice(GENERATING_NOTICE)?;
        let content = match self.synthesizer.synthesize(&conversation).await {
            Ok(content) => content,
            Err(e) => {
                error!(session_id = %self.session_id, error = %e, "Synthesis failed");
                let e = SessionError::Synthesis(e);
                terminal.show_error(&e.to_string())?;
                return Err(e);
            }
        };

        let path = match &self.output {
            Some(path) => path.clone(),
            None => default_output_path(&self.export_config, Local::now()),
        };
        let result = self.exporter.export(&content, &path);
        report_export(terminal, &result)?;

        info!(session_id = %self.session_id, success = result.success, path = ?result.file_path, "Session ended");
        Ok(result)
    }
}

/// Print the final status line for an export
pub fn report_export<T: Terminal + ?Sized>(terminal: &mut T, result: &ExportResult) -> Result<(), TerminalError> {
    match &result.error {
        None => terminal.show_notice(&format!(
            "Your story has been saved as a PDF: {}",
            result.file_path.display()
        )),
        Some(e) => terminal.show_error(&format!("Could not save your story: {}", e)),
    }
}
