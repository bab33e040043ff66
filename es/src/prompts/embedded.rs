//! Embedded prompts
//!
//! These are compiled into the binary from .pmt files at build time.

use tracing::debug;

/// Conversation persona prompt
pub const PERSONA: &str = include_str!("../../prompts/persona.pmt");

/// Blog post synthesis prompt
pub const SYNTHESIS: &str = include_str!("../../prompts/synthesis.pmt");

/// Get the embedded prompt by name
pub fn get_embedded(name: &str) -> Option<&'static str> {
    debug!(%name, "get_embedded: called");
    match name {
        "persona" => Some(PERSONA),
        "synthesis" => Some(SYNTHESIS),
        _ => {
            debug!("get_embedded: no match found");
            None
        }
    }
}
