//! Conversation loop
//!
//! [`DialogueEngine`] reads a line, asks the model, records both sides in the
//! [`crate::conversation::ConversationState`] and prints the reply, until the
//! quit sentinel (or end of input) arrives. A failed completion is reported
//! and the session carries on.

mod engine;
mod terminal;

pub use engine::{DialogueEngine, DialogueError, EngineState, TurnOutcome, context_window, input_prompt, is_quit};
pub use terminal::{ASSISTANT_NAME, InputEvent, RustylineTerminal, StdioTerminal, Terminal, TerminalError};
