//! CLI command definitions and subcommands

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::debug;

/// ElderStory - turn a conversation with an elder into a blog post
#[derive(Parser)]
#[command(
    name = "es",
    about = "Chat with an elder, then turn the conversation into a PDF blog post",
    version,
    after_help = after_help()
)]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true, help = "Path to config file")]
    pub config: Option<PathBuf>,

    /// Log level (TRACE, DEBUG, INFO, WARN, ERROR)
    #[arg(
        short = 'l',
        long = "log-level",
        global = true,
        help = "Log level (TRACE, DEBUG, INFO, WARN, ERROR)"
    )]
    pub log_level: Option<String>,

    /// Subcommand to execute (defaults to chat)
    #[command(subcommand)]
    pub command: Option<Command>,
}

/// CLI subcommands
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Start an interview and save the resulting story as a PDF
    Chat {
        /// Where to write the PDF (default: timestamped file in output-dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export an already-written post (title line, then paragraphs) as a PDF
    Render {
        /// Plain-text post to render
        #[arg(value_name = "TEXT_FILE")]
        file: PathBuf,

        /// Where to write the PDF (default: timestamped file in output-dir)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the effective configuration as YAML
    Config,
}

/// Location of the log file
pub fn log_path() -> PathBuf {
    debug!("log_path: called");
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("elderstory")
        .join("logs")
        .join("elderstory.log")
}

fn after_help() -> String {
    format!("Logs are written to: {}", log_path().display())
}
