//! Line-oriented user-facing boundary

use std::io::{BufRead, Write};

use colored::Colorize;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use thiserror::Error;
use tracing::debug;

/// Name the assistant speaks under
pub const ASSISTANT_NAME: &str = "Elder Chatbot";

/// What one read from the terminal produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A line of text, without the trailing newline
    Line(String),
    /// Ctrl-C
    Interrupted,
    /// End of input (Ctrl-D or closed pipe)
    Eof,
}

/// The terminal could not be read or written
#[derive(Debug, Error)]
#[error("terminal error: {0}")]
pub struct TerminalError(String);

impl From<std::io::Error> for TerminalError {
    fn from(e: std::io::Error) -> Self {
        TerminalError(e.to_string())
    }
}

impl From<ReadlineError> for TerminalError {
    fn from(e: ReadlineError) -> Self {
        TerminalError(e.to_string())
    }
}

/// Reading lines from, and printing lines to, the user
pub trait Terminal {
    /// Read one line; `initial` pre-fills the edit buffer where supported
    fn read_line(&mut self, prompt: &str, initial: &str) -> Result<InputEvent, TerminalError>;

    /// Print an assistant reply
    fn show_reply(&mut self, text: &str) -> Result<(), TerminalError>;

    /// Print a status or recoverable notice
    fn show_notice(&mut self, text: &str) -> Result<(), TerminalError>;

    /// Print a failure message
    fn show_error(&mut self, text: &str) -> Result<(), TerminalError>;
}

/// Interactive terminal with line editing and history
pub struct RustylineTerminal {
    editor: DefaultEditor,
}

impl RustylineTerminal {
    pub fn new() -> Result<Self, TerminalError> {
        debug!("RustylineTerminal::new: called");
        Ok(Self {
            editor: DefaultEditor::new()?,
        })
    }
}

impl Terminal for RustylineTerminal {
    fn read_line(&mut self, prompt: &str, initial: &str) -> Result<InputEvent, TerminalError> {
        let prompt = format!("{} ", prompt.bright_green());
        let readline = if initial.is_empty() {
            self.editor.readline(&prompt)
        } else {
            self.editor.readline_with_initial(&prompt, (initial, ""))
        };

        match readline {
            Ok(line) => {
                if !line.trim().is_empty() {
                    let _ = self.editor.add_history_entry(line.as_str());
                }
                Ok(InputEvent::Line(line))
            }
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                Ok(InputEvent::Interrupted)
            }
            Err(ReadlineError::Eof) => {
                println!();
                Ok(InputEvent::Eof)
            }
            Err(err) => Err(err.into()),
        }
    }

    fn show_reply(&mut self, text: &str) -> Result<(), TerminalError> {
        println!("{} {}", format!("{}:", ASSISTANT_NAME).bright_cyan().bold(), text);
        Ok(())
    }

    fn show_notice(&mut self, text: &str) -> Result<(), TerminalError> {
        println!("{}", text.yellow());
        Ok(())
    }

    fn show_error(&mut self, text: &str) -> Result<(), TerminalError> {
        println!("{} {}", "Error:".red().bold(), text);
        Ok(())
    }
}

/// Plain reader/writer terminal, used when stdin is not a TTY
///
/// Pre-filled input is not supported; `initial` is ignored.
pub struct StdioTerminal<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> StdioTerminal<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Give back the writer (e.g. to inspect captured output)
    pub fn into_writer(self) -> W {
        self.writer
    }
}

impl<R: BufRead, W: Write> Terminal for StdioTerminal<R, W> {
    fn read_line(&mut self, prompt: &str, _initial: &str) -> Result<InputEvent, TerminalError> {
        write!(self.writer, "{} ", prompt)?;
        self.writer.flush()?;

        let mut line = String::new();
        if self.reader.read_line(&mut line)? == 0 {
            writeln!(self.writer)?;
            return Ok(InputEvent::Eof);
        }
        let line = line.trim_end_matches(['\n', '\r']).to_string();
        Ok(InputEvent::Line(line))
    }

    fn show_reply(&mut self, text: &str) -> Result<(), TerminalError> {
        writeln!(self.writer, "{}: {}", ASSISTANT_NAME, text)?;
        Ok(())
    }

    fn show_notice(&mut self, text: &str) -> Result<(), TerminalError> {
        writeln!(self.writer, "{}", text)?;
        Ok(())
    }

    fn show_error(&mut self, text: &str) -> Result<(), TerminalError> {
        writeln!(self.writer, "Error: {}", text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_stdio_terminal_reads_lines_then_eof() {
        let mut terminal = StdioTerminal::new(Cursor::new("Hi there\r\nquit\n"), Vec::new());

        assert_eq!(
            terminal.read_line("You:", "").unwrap(),
            InputEvent::Line("Hi there".to_string())
        );
        assert_eq!(terminal.read_line("You:", "").unwrap(), InputEvent::Line("quit".to_string()));
        assert_eq!(terminal.read_line("You:", "").unwrap(), InputEvent::Eof);
    }

    #[test]
    fn test_stdio_terminal_output_format() {
        let mut terminal = StdioTerminal::new(Cursor::new(""), Vec::new());
        terminal.show_reply("Tell me more!").unwrap();
        terminal.show_notice("Saved.").unwrap();
        terminal.show_error("disk full").unwrap();

        let output = String::from_utf8(terminal.into_writer()).unwrap();
        assert_eq!(output, "Elder Chatbot: Tell me more!\nSaved.\nError: disk full\n");
    }
}
