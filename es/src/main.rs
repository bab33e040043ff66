//! ElderStory - conversational memoir assistant
//!
//! CLI entry point: interview, write the post, save the PDF.

use std::fs;
use std::io::IsTerminal;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use chrono::Local;
use clap::Parser;
use eyre::{Context, Result};
use tracing::{debug, error, info};

use elderstory::cli::{Cli, Command, log_path};
use elderstory::config::Config;
use elderstory::dialogue::{RustylineTerminal, StdioTerminal, Terminal};
use elderstory::export::{DocumentExporter, default_output_path};
use elderstory::prompts::PromptLoader;
use elderstory::session::{SessionError, StoryPipeline, report_export};
use elderstory::synthesis::parse_blog_text;

fn setup_logging(cli_log_level: Option<&str>, config_log_level: Option<&str>) -> Result<()> {
    // Note: Can't log params here since logging isn't initialized yet
    let log_file_path = log_path();
    if let Some(log_dir) = log_file_path.parent() {
        fs::create_dir_all(log_dir).context("Failed to create log directory")?;
    }

    // Determine log level with priority: CLI --log-level > config file > default (INFO)
    let level = match cli_log_level.or(config_log_level) {
        Some(s) => match s.to_uppercase().as_str() {
            "TRACE" => tracing::Level::TRACE,
            "DEBUG" => tracing::Level::DEBUG,
            "INFO" => tracing::Level::INFO,
            "WARN" | "WARNING" => tracing::Level::WARN,
            "ERROR" => tracing::Level::ERROR,
            _ => {
                eprintln!("Warning: Unknown log-level '{}', defaulting to INFO", s);
                tracing::Level::INFO
            }
        },
        None => tracing::Level::INFO,
    };

    let log_file = fs::File::create(&log_file_path).context("Failed to create log file")?;

    tracing_subscriber::fmt()
        .with_writer(log_file)
        .with_ansi(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive(level.into()))
        .init();

    info!("Logging initialized (level: {:?})", level);
    Ok(())
}

/// Interactive editing on a TTY, plain line reads otherwise (pipes, scripts)
fn open_terminal() -> Result<Box<dyn Terminal>> {
    if std::io::stdin().is_terminal() {
        debug!("open_terminal: stdin is a tty");
        Ok(Box::new(RustylineTerminal::new().context("Failed to initialize terminal")?))
    } else {
        debug!("open_terminal: stdin is not a tty");
        Ok(Box::new(StdioTerminal::new(std::io::stdin().lock(), std::io::stdout())))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // Load log level from config file early (before full config load)
    let config_log_level = Config::load_log_level(cli.config.as_ref());

    // Setup logging with priority: CLI > config > INFO default
    setup_logging(cli.log_level.as_deref(), config_log_level.as_deref()).context("Failed to setup logging")?;

    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;
    info!(provider = %config.llm.provider, model = %config.llm.model, "ElderStory loaded config");

    debug!(command = ?cli.command, "main: dispatching command");
    match cli.command {
        None => cmd_chat(&config, None).await,
        Some(Command::Chat { output }) => {
            debug!(?output, "main: matched Chat command");
            cmd_chat(&config, output).await
        }
        Some(Command::Render { file, output }) => {
            debug!(?file, ?output, "main: matched Render command");
            cmd_render(&config, &file, output)
        }
        Some(Command::Config) => {
            debug!("main: matched Config command");
            cmd_config(&config)
        }
    }
}

async fn cmd_chat(config: &Config, output: Option<PathBuf>) -> Result<ExitCode> {
    debug!(?output, "cmd_chat: called");
    // Missing credential is a startup failure, before any greeting
    let resolved = config.validate()?;

    let root = std::env::current_dir().context("Failed to read current directory")?;
    let prompts = Arc::new(PromptLoader::new(root));

    let mut pipeline = StoryPipeline::from_config(config, &resolved, prompts)?.with_output(output);
    info!(session_id = %pipeline.session_id(), "cmd_chat: starting session");
    let mut terminal = open_terminal()?;

    match pipeline.run(terminal.as_mut()).await {
        Ok(result) if result.success => Ok(ExitCode::SUCCESS),
        Ok(_) => Ok(ExitCode::FAILURE),
        Err(SessionError::Synthesis(e)) => {
            // Already shown to the user
            error!(error = %e, "cmd_chat: synthesis failed");
            Ok(ExitCode::FAILURE)
        }
        Err(e) => Err(e).context("Conversation ended unexpectedly"),
    }
}

fn cmd_render(config: &Config, file: &Path, output: Option<PathBuf>) -> Result<ExitCode> {
    debug!(?file, "cmd_render: called");
    let text = fs::read_to_string(file).context(format!("Failed to read {}", file.display()))?;
    let content = parse_blog_text(&text).context(format!("Failed to parse {}", file.display()))?;

    let path = output.unwrap_or_else(|| default_output_path(&config.export, Local::now()));
    let result = DocumentExporter::new(config.export.layout.clone()).export(&content, &path);

    let mut terminal = StdioTerminal::new(std::io::empty(), std::io::stdout());
    report_export(&mut terminal, &result)?;

    Ok(if result.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn cmd_config(config: &Config) -> Result<ExitCode> {
    debug!("cmd_config: called");
    let yaml = serde_yaml::to_string(config).context("Failed to serialize configuration")?;
    print!("{}", yaml);
    Ok(ExitCode::SUCCESS)
}
