//! Prompt Loader
//!
//! Loads prompt templates from files or falls back to embedded defaults.

use std::path::{Path, PathBuf};

use eyre::{Result, eyre};
use handlebars::Handlebars;
use serde::Serialize;
use tracing::debug;

use super::embedded;

/// Context for the per-turn persona prompt
#[derive(Debug, Clone, Serialize)]
pub struct PersonaContext {
    /// Opening line the assistant printed
    pub greeting: String,
    /// Whether question/affirmation alternation is on
    pub alternate: bool,
    /// This turn should end with a follow-up question
    pub ask_question: bool,
}

/// Context for the blog synthesis prompt
#[derive(Debug, Clone, Serialize)]
pub struct SynthesisContext {
    pub min_words: u32,
    pub max_words: u32,
}

impl Default for SynthesisContext {
    fn default() -> Self {
        Self {
            min_words: 500,
            max_words: 1000,
        }
    }
}

/// Loads and renders prompt templates
pub struct PromptLoader {
    /// Handlebars template engine
    hbs: Handlebars<'static>,
    /// User override directory (e.g., `.elderstory/prompts/`)
    user_dir: Option<PathBuf>,
}

impl PromptLoader {
    /// Create a loader that looks for overrides under `root/.elderstory/prompts`
    pub fn new(root: impl AsRef<Path>) -> Self {
        let user_dir = root.as_ref().join(".elderstory/prompts");
        let user_dir_exists = user_dir.exists();
        debug!(?user_dir, %user_dir_exists, "PromptLoader::new: called");

        Self {
            hbs: Self::engine(),
            user_dir: if user_dir_exists { Some(user_dir) } else { None },
        }
    }

    /// Create a loader that only uses embedded prompts
    pub fn embedded_only() -> Self {
        debug!("PromptLoader::embedded_only: called");
        Self {
            hbs: Self::engine(),
            user_dir: None,
        }
    }

    fn engine() -> Handlebars<'static> {
        let mut hbs = Handlebars::new();
        // Prompts are plain text; HTML escaping would mangle apostrophes
        hbs.register_escape_fn(handlebars::no_escape);
        hbs
    }

    /// Load a template by name
    ///
    /// Checks in order:
    /// 1. User override: `.elderstory/prompts/{name}.pmt`
    /// 2. Embedded fallback
    fn load_template(&self, name: &str) -> Result<String> {
        debug!(%name, "PromptLoader::load_template: called");
        if let Some(ref user_dir) = self.user_dir {
            let path = user_dir.join(format!("{}.pmt", name));
            if path.exists() {
                debug!(?path, "PromptLoader::load_template: found in user override");
                return std::fs::read_to_string(&path)
                    .map_err(|e| eyre!("Failed to read user prompt {}: {}", path.display(), e));
            }
        }

        if let Some(content) = embedded::get_embedded(name) {
            debug!(%name, "PromptLoader::load_template: found in embedded");
            return Ok(content.to_string());
        }

        Err(eyre!("Prompt template not found: {}", name))
    }

    fn render<T: Serialize>(&self, template_name: &str, context: &T) -> Result<String> {
        let template = self.load_template(template_name)?;
        self.hbs
            .render_template(&template, context)
            .map(|rendered| rendered.trim().to_string())
            .map_err(|e| eyre!("Failed to render template {}: {}", template_name, e))
    }

    /// System prompt for one conversation turn
    pub fn persona(&self, context: &PersonaContext) -> Result<String> {
        debug!(ask_question = context.ask_question, "PromptLoader::persona: called");
        self.render("persona", context)
    }

    /// System prompt for turning a transcript into a blog post
    pub fn synthesis(&self, context: &SynthesisContext) -> Result<String> {
        debug!("PromptLoader::synthesis: called");
        self.render("synthesis", context)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn persona_context(alternate: bool, ask_question: bool) -> PersonaContext {
        PersonaContext {
            greeting: "Hello! What's your name?".to_string(),
            alternate,
            ask_question,
        }
    }

    #[test]
    fn test_persona_question_turn() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.persona(&persona_context(true, true)).unwrap();

        assert!(prompt.contains("Hello! What's your name?"));
        assert!(prompt.contains("ask one gentle, open-ended follow-up question"));
        assert!(!prompt.contains("Do not ask a"));
    }

    #[test]
    fn test_persona_affirmation_turn() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.persona(&persona_context(true, false)).unwrap();

        assert!(prompt.contains("warmly affirm"));
        assert!(!prompt.contains("open-ended follow-up question"));
    }

    #[test]
    fn test_persona_without_alternation() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.persona(&persona_context(false, true)).unwrap();

        assert!(prompt.contains("encourage them to share more details"));
        assert!(!prompt.contains("warmly affirm"));
    }

    #[test]
    fn test_synthesis_renders_word_range() {
        let loader = PromptLoader::embedded_only();
        let prompt = loader.synthesis(&SynthesisContext::default()).unwrap();

        assert!(prompt.contains("between 500 and 1000 words"));
    }

    #[test]
    fn test_user_override_wins() {
        let dir = TempDir::new().unwrap();
        let prompts = dir.path().join(".elderstory/prompts");
        std::fs::create_dir_all(&prompts).unwrap();
        std::fs::write(prompts.join("persona.pmt"), "Custom persona for {{greeting}}").unwrap();

        let loader = PromptLoader::new(dir.path());
        let prompt = loader.persona(&persona_context(true, true)).unwrap();
        assert_eq!(prompt, "Custom persona for Hello! What's your name?");

        // Templates without an override still come from the binary
        assert!(loader.synthesis(&SynthesisContext::default()).is_ok());
    }

    #[test]
    fn test_unknown_template() {
        let loader = PromptLoader::embedded_only();
        assert!(loader.load_template("nonexistent-template").is_err());
    }
}
