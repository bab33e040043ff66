//! Transcript and termination flag

use std::fmt;

use thiserror::Error;
use tracing::debug;

/// Who spoke an utterance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Speaker {
    User,
    Assistant,
}

impl fmt::Display for Speaker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Speaker::User => write!(f, "User"),
            Speaker::Assistant => write!(f, "Assistant"),
        }
    }
}

/// One speaker's contribution in one turn
///
/// Immutable once created; fields are only readable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Utterance {
    speaker: Speaker,
    text: String,
    sequence_index: usize,
}

impl Utterance {
    pub fn new(speaker: Speaker, text: impl Into<String>, sequence_index: usize) -> Self {
        Self {
            speaker,
            text: text.into(),
            sequence_index,
        }
    }

    pub fn speaker(&self) -> Speaker {
        self.speaker
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sequence_index(&self) -> usize {
        self.sequence_index
    }
}

/// Misuse of the conversation sequencing
#[derive(Debug, Error, PartialEq, Eq)]
pub enum InvalidStateError {
    #[error("cannot append {speaker} utterance: conversation already terminated")]
    AppendAfterTermination { speaker: Speaker },

    #[error("conversation has not been terminated yet")]
    NotTerminated,
}

/// Ordered transcript plus the loop-termination signal
#[derive(Debug, Default)]
pub struct ConversationState {
    utterances: Vec<Utterance>,
    terminated: bool,
}

impl ConversationState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an utterance with the next sequence index
    pub fn append(&mut self, speaker: Speaker, text: impl Into<String>) -> Result<&Utterance, InvalidStateError> {
        debug!(%speaker, index = self.utterances.len(), "ConversationState::append: called");
        if self.terminated {
            return Err(InvalidStateError::AppendAfterTermination { speaker });
        }
        let utterance = self.draft(speaker, text);
        self.utterances.push(utterance);
        Ok(&self.utterances[self.utterances.len() - 1])
    }

    /// Build the utterance `append` would add, without adding it
    pub fn draft(&self, speaker: Speaker, text: impl Into<String>) -> Utterance {
        Utterance::new(speaker, text, self.utterances.len())
    }

    /// Idempotent
    pub fn mark_terminated(&mut self) {
        debug!(already = self.terminated, "ConversationState::mark_terminated: called");
        self.terminated = true;
    }

    pub fn is_terminated(&self) -> bool {
        self.terminated
    }

    /// Read-only view of the full transcript, in conversation order
    pub fn transcript(&self) -> &[Utterance] {
        &self.utterances
    }

    /// The transcript, but only once the conversation has ended
    pub fn finished_transcript(&self) -> Result<&[Utterance], InvalidStateError> {
        if !self.terminated {
            return Err(InvalidStateError::NotTerminated);
        }
        Ok(&self.utterances)
    }

    pub fn len(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_empty(&self) -> bool {
        self.utterances.is_empty()
    }
}

/// Render utterances as `Speaker: text` lines
pub fn render_transcript(utterances: &[Utterance]) -> String {
    utterances
        .iter()
        .map(|u| format!("{}: {}", u.speaker(), u.text()))
        .collect::<Vec<_>>()
        .join("\n")
}
