//! ElderStory configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::export::LayoutConfig;

/// Main ElderStory configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Completion service configuration
    pub llm: LlmConfig,

    /// Conversation behaviour
    pub conversation: ConversationConfig,

    /// PDF output configuration
    pub export: ExportConfig,

    /// Log level (overridden by --log-level)
    #[serde(rename = "log-level", skip_serializing_if = "Option::is_none")]
    pub log_level: Option<String>,
}

impl Config {
    /// Validate configuration before use
    ///
    /// Resolves the API credential so a missing key fails at startup rather
    /// than on the first turn.
    pub fn validate(&self) -> Result<ResolvedLlmConfig> {
        debug!("Config::validate: called");
        if self.conversation.quit_word.trim().is_empty() {
            return Err(eyre::eyre!("conversation.quit-word must not be empty"));
        }
        self.llm.resolve()
    }

    /// Load configuration with fallback chain
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        // If explicit config path provided, try to load it
        if let Some(path) = config_path {
            return Self::load_from_file(path).context(format!("Failed to load config from {}", path.display()));
        }

        // Try project-local config: .elderstory.yml
        let local_config = PathBuf::from(".elderstory.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        // Try user config: ~/.config/elderstory/elderstory.yml
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("elderstory").join("elderstory.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        // No config file found, use defaults
        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    /// Read only the log level, before logging is set up
    ///
    /// Errors are swallowed here; `load` reports them once logging exists.
    pub fn load_log_level(config_path: Option<&PathBuf>) -> Option<String> {
        Self::load(config_path).ok().and_then(|c| c.log_level)
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;

        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;

        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// Completion service configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name: "groq", "openai" or "anthropic"
    pub provider: String,

    /// Model used for conversation turns
    pub model: String,

    /// Model used to write the blog post
    #[serde(rename = "synthesis-model")]
    pub synthesis_model: String,

    /// Environment variable containing the API key (provider default if unset)
    #[serde(rename = "api-key-env", skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,

    /// API base URL (provider default if unset)
    #[serde(rename = "base-url", skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,

    /// Maximum tokens per conversation reply
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Maximum tokens for the blog post
    #[serde(rename = "synthesis-max-tokens")]
    pub synthesis_max_tokens: u32,

    /// Optional per-call timeout in milliseconds
    #[serde(rename = "timeout-ms", skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,

    /// Retries for transient upstream failures (0 = one call per completion)
    #[serde(rename = "max-retries")]
    pub max_retries: u32,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "groq".to_string(),
            model: "llama-3.1-8b-instant".to_string(),
            synthesis_model: "llama-3.1-70b-versatile".to_string(),
            api_key_env: None,
            base_url: None,
            max_tokens: 1024,
            synthesis_max_tokens: 4096,
            timeout_ms: None,
            max_retries: 0,
        }
    }
}

impl LlmConfig {
    /// Environment variable holding the credential
    pub fn api_key_env(&self) -> String {
        if let Some(env) = &self.api_key_env {
            return env.clone();
        }
        match self.provider.as_str() {
            "openai" => "OPENAI_API_KEY",
            "anthropic" => "ANTHROPIC_API_KEY",
            _ => "GROQ_API_KEY",
        }
        .to_string()
    }

    /// Base URL for the provider
    pub fn base_url(&self) -> String {
        if let Some(url) = &self.base_url {
            return url.trim_end_matches('/').to_string();
        }
        match self.provider.as_str() {
            "openai" => "https://api.openai.com",
            "anthropic" => "https://api.anthropic.com",
            _ => "https://api.groq.com/openai",
        }
        .to_string()
    }

    /// Read the credential from the environment, once
    pub fn resolve(&self) -> Result<ResolvedLlmConfig> {
        let env = self.api_key_env();
        debug!(provider = %self.provider, %env, "LlmConfig::resolve: called");
        let api_key = match std::env::var(&env) {
            Ok(key) if !key.trim().is_empty() => key.trim().to_string(),
            _ => {
                return Err(eyre::eyre!(
                    "LLM API key not found. Set the {} environment variable.",
                    env
                ));
            }
        };

        Ok(ResolvedLlmConfig {
            provider: self.provider.clone(),
            model: self.model.clone(),
            api_key,
            base_url: self.base_url(),
            max_tokens: self.max_tokens,
            timeout_ms: self.timeout_ms,
            max_retries: self.max_retries,
        })
    }
}

/// Provider settings with the credential already read
///
/// One of these is built per model (conversation and synthesis).
#[derive(Clone)]
pub struct ResolvedLlmConfig {
    pub provider: String,
    pub model: String,
    pub api_key: String,
    pub base_url: String,
    pub max_tokens: u32,
    pub timeout_ms: Option<u64>,
    pub max_retries: u32,
}

impl ResolvedLlmConfig {
    /// Same provider and credential, pointed at another model
    pub fn with_model(&self, model: impl Into<String>, max_tokens: u32) -> Self {
        Self {
            model: model.into(),
            max_tokens,
            ..self.clone()
        }
    }
}

impl fmt::Debug for ResolvedLlmConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedLlmConfig")
            .field("provider", &self.provider)
            .field("model", &self.model)
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .field("max_tokens", &self.max_tokens)
            .field("timeout_ms", &self.timeout_ms)
            .field("max_retries", &self.max_retries)
            .finish()
    }
}

/// Conversation behaviour
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationConfig {
    /// Input that ends the conversation (trimmed, case-insensitive)
    #[serde(rename = "quit-word")]
    pub quit_word: String,

    /// Opening line printed before the first turn
    pub greeting: String,

    /// Most recent utterances sent to the model each turn (0 = all)
    #[serde(rename = "context-window")]
    pub context_window: usize,

    /// Alternate between follow-up questions and affirmations
    #[serde(rename = "alternate-questions")]
    pub alternate_questions: bool,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            quit_word: "quit".to_string(),
            greeting: "Hello! I'd love to chat with you. What's your name?".to_string(),
            context_window: 14,
            alternate_questions: true,
        }
    }
}

/// PDF output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Directory for generated PDFs when no --output is given
    #[serde(rename = "output-dir")]
    pub output_dir: PathBuf,

    /// File name prefix, followed by a timestamp
    #[serde(rename = "file-prefix")]
    pub file_prefix: String,

    /// Page geometry and fonts
    pub layout: LayoutConfig,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            file_prefix: "elder_story".to_string(),
            layout: LayoutConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    fn test_default_config() {
        let config = Config::default();

        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.conversation.quit_word, "quit");
        assert_eq!(config.conversation.context_window, 14);
        assert_eq!(config.export.file_prefix, "elder_story");
        assert!(config.log_level.is_none());
    }

    #[test]
    fn test_llm_config_provider_defaults() {
        let mut config = LlmConfig::default();
        assert_eq!(config.api_key_env(), "GROQ_API_KEY");
        assert_eq!(config.base_url(), "https://api.groq.com/openai");

        config.provider = "anthropic".to_string();
        assert_eq!(config.api_key_env(), "ANTHROPIC_API_KEY");
        assert_eq!(config.base_url(), "https://api.anthropic.com");

        config.base_url = Some("http://localhost:8080/".to_string());
        assert_eq!(config.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  provider: openai
  model: gpt-4o-mini
  synthesis-model: gpt-4o
  api-key-env: MY_API_KEY
  max-tokens: 512
  timeout-ms: 60000
  max-retries: 2

conversation:
  quit-word: bye
  context-window: 6
  alternate-questions: false

export:
  output-dir: /tmp/stories
  layout:
    title-font-size: 20
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "gpt-4o-mini");
        assert_eq!(config.llm.synthesis_model, "gpt-4o");
        assert_eq!(config.llm.api_key_env(), "MY_API_KEY");
        assert_eq!(config.llm.timeout_ms, Some(60000));
        assert_eq!(config.llm.max_retries, 2);
        assert_eq!(config.conversation.quit_word, "bye");
        assert!(!config.conversation.alternate_questions);
        assert_eq!(config.export.output_dir, PathBuf::from("/tmp/stories"));
        assert_eq!(config.export.layout.title_font_size, 20.0);
        assert_eq!(config.export.layout.body_font_size, 10.0);
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: llama-3.3-70b-versatile
"#;

        let config: Config = serde_yaml::from_str(yaml).unwrap();

        // Specified value
        assert_eq!(config.llm.model, "llama-3.3-70b-versatile");

        // Defaults for unspecified
        assert_eq!(config.llm.provider, "groq");
        assert_eq!(config.llm.synthesis_model, "llama-3.1-70b-versatile");
        assert_eq!(config.conversation.quit_word, "quit");
    }

    #[test]
    #[serial]
    fn test_resolve_missing_key_fails() {
        let config = LlmConfig {
            api_key_env: Some("ELDERSTORY_TEST_MISSING_KEY".to_string()),
            ..LlmConfig::default()
        };
        unsafe { std::env::remove_var("ELDERSTORY_TEST_MISSING_KEY") };

        let err = config.resolve().unwrap_err();
        assert!(err.to_string().contains("ELDERSTORY_TEST_MISSING_KEY"));
    }

    #[test]
    #[serial]
    fn test_resolve_reads_key_and_redacts_debug() {
        let config = LlmConfig {
            api_key_env: Some("ELDERSTORY_TEST_KEY".to_string()),
            ..LlmConfig::default()
        };
        unsafe { std::env::set_var("ELDERSTORY_TEST_KEY", "sk-secret") };

        let resolved = config.resolve().unwrap();
        unsafe { std::env::remove_var("ELDERSTORY_TEST_KEY") };

        assert_eq!(resolved.api_key, "sk-secret");
        assert_eq!(resolved.model, "llama-3.1-8b-instant");
        let debug = format!("{:?}", resolved);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));

        let synth = resolved.with_model("llama-3.1-70b-versatile", 4096);
        assert_eq!(synth.model, "llama-3.1-70b-versatile");
        assert_eq!(synth.max_tokens, 4096);
        assert_eq!(synth.api_key, "sk-secret");
    }

    #[test]
    #[serial]
    fn test_resolve_rejects_blank_key() {
        let config = LlmConfig {
            api_key_env: Some("ELDERSTORY_TEST_BLANK_KEY".to_string()),
            ..LlmConfig::default()
        };
        unsafe { std::env::set_var("ELDERSTORY_TEST_BLANK_KEY", "   ") };

        let result = config.resolve();
        unsafe { std::env::remove_var("ELDERSTORY_TEST_BLANK_KEY") };

        assert!(result.is_err());
    }
}
