//! In-memory conversation bookkeeping
//!
//! [`ConversationState`] owns the ordered transcript and the termination
//! flag. It performs no I/O; the dialogue engine is its only writer.

mod state;

pub use state::{ConversationState, InvalidStateError, Speaker, Utterance, render_transcript};
