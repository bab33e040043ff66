//! Turn-taking state machine

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::terminal::{InputEvent, Terminal, TerminalError};
use crate::config::ConversationConfig;
use crate::conversation::{ConversationState, InvalidStateError, Speaker, Utterance};
use crate::llm::ModelClient;
use crate::prompts::{PersonaContext, PromptLoader};

/// Prompt shown before each line of user input
pub fn input_prompt(quit_word: &str) -> String {
    format!("You (type '{}' to end):", quit_word)
}

/// Engine lifecycle; FINISHED is terminal
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Finished,
}

/// What a single call to [`DialogueEngine::step`] did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Both sides of the turn were recorded
    Replied,
    /// Blank line or Ctrl-C; nothing recorded
    Skipped,
    /// The completion call failed; the input is kept for a retry
    Failed,
    /// The user quit; the conversation is terminated
    Finished,
}

/// Errors that end the dialogue loop
#[derive(Debug, Error)]
pub enum DialogueError {
    #[error(transparent)]
    Terminal(#[from] TerminalError),

    #[error(transparent)]
    State(#[from] InvalidStateError),

    #[error("failed to build persona prompt: {0}")]
    Prompt(String),
}

/// True when `input` is the quit sentinel (trimmed, case-insensitive)
pub fn is_quit(input: &str, quit_word: &str) -> bool {
    input.trim().to_lowercase() == quit_word.trim().to_lowercase()
}

/// The most recent `limit` utterances, starting on a user turn
///
/// `limit == 0` means no limit.
pub fn context_window(history: &[Utterance], limit: usize) -> &[Utterance] {
    if limit == 0 || history.len() <= limit {
        return history;
    }
    let mut start = history.len() - limit;
    while start < history.len() && history[start].speaker() != Speaker::User {
        start += 1;
    }
    &history[start..]
}

/// Drives the conversation: read, ask the model, record, print
pub struct DialogueEngine {
    model: ModelClient,
    prompts: Arc<PromptLoader>,
    settings: ConversationConfig,
    state: EngineState,
    ask_question: bool,
    greeted: bool,
    /// Input from a turn whose completion failed
    pending: Option<String>,
}

impl DialogueEngine {
    pub fn new(model: ModelClient, prompts: Arc<PromptLoader>, settings: ConversationConfig) -> Self {
        debug!(quit_word = %settings.quit_word, "DialogueEngine::new: called");
        Self {
            model,
            prompts,
            settings,
            state: EngineState::Running,
            ask_question: true,
            greeted: false,
            pending: None,
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Input kept from a failed turn, if any
    pub fn pending_input(&self) -> Option<&str> {
        self.pending.as_deref()
    }

    /// Run turns until the user quits
    pub async fn run<T: Terminal + ?Sized>(
        &mut self,
        terminal: &mut T,
        conversation: &mut ConversationState,
    ) -> Result<(), DialogueError> {
        debug!("DialogueEngine::run: called");
        if !self.greeted {
            terminal.show_reply(&self.settings.greeting)?;
            self.greeted = true;
        }

        while self.step(terminal, conversation).await? != TurnOutcome::Finished {}

        info!(utterances = conversation.len(), "DialogueEngine::run: conversation finished");
        Ok(())
    }

    /// Run one turn
    pub async fn step<T: Terminal + ?Sized>(
        &mut self,
        terminal: &mut T,
        conversation: &mut ConversationState,
    ) -> Result<TurnOutcome, DialogueError> {
        if self.state == EngineState::Finished {
            return Ok(TurnOutcome::Finished);
        }

        let initial = self.pending.clone().unwrap_or_default();
        let input = match terminal.read_line(&input_prompt(&self.settings.quit_word), &initial)? {
            InputEvent::Line(line) => line,
            InputEvent::Interrupted => return Ok(TurnOutcome::Skipped),
            InputEvent::Eof => {
                debug!("DialogueEngine::step: end of input, treating as quit");
                return Ok(self.finish(conversation));
            }
        };

        if is_quit(&input, &self.settings.quit_word) {
            return Ok(self.finish(conversation));
        }

        let text = input.trim();
        if text.is_empty() {
            return Ok(TurnOutcome::Skipped);
        }

        let prompt = self
            .prompts
            .persona(&PersonaContext {
                greeting: self.settings.greeting.clone(),
                alternate: self.settings.alternate_questions,
                ask_question: self.ask_question,
            })
            .map_err(|e| DialogueError::Prompt(e.to_string()))?;

        // The user utterance is committed together with the reply so a failed
        // call never leaves an unanswered turn in the transcript.
        let mut history: Vec<Utterance> =
            context_window(conversation.transcript(), self.settings.context_window).to_vec();
        history.push(conversation.draft(Speaker::User, text));

        match self.model.complete(&prompt, &history).await {
            Ok(reply) => {
                conversation.append(Speaker::User, text)?;
                conversation.append(Speaker::Assistant, reply.as_str())?;
                terminal.show_reply(&reply)?;
                self.pending = None;
                if self.settings.alternate_questions {
                    self.ask_question = !self.ask_question;
                }
                Ok(TurnOutcome::Replied)
            }
            Err(e) => {
                warn!(error = %e, "DialogueEngine::step: completion failed, keeping input");
                terminal.show_notice(&format!(
                    "Sorry, I couldn't reach my thoughts just now ({}). Press Enter to try again, or say something else.",
                    e
                ))?;
                self.pending = Some(text.to_string());
                Ok(TurnOutcome::Failed)
            }
        }
    }

    fn finish(&mut self, conversation: &mut ConversationState) -> TurnOutcome {
        conversation.mark_terminated();
        self.state = EngineState::Finished;
        self.pending = None;
        TurnOutcome::Finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialogue::StdioTerminal;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use std::io::Cursor;

    fn engine(mock: Arc<MockLlmClient>) -> DialogueEngine {
        DialogueEngine::new(
            ModelClient::new(mock, 256),
            Arc::new(PromptLoader::embedded_only()),
            ConversationConfig::default(),
        )
    }

    fn terminal(input: &str) -> StdioTerminal<Cursor<String>, Vec<u8>> {
        StdioTerminal::new(Cursor::new(input.to_string()), Vec::new())
    }

    #[test]
    fn test_is_quit() {
        assert!(is_quit("quit", "quit"));
        assert!(is_quit("  QUIT \t", "quit"));
        assert!(is_quit("Quit", "quit"));
        assert!(!is_quit("quit now", "quit"));
        assert!(!is_quit("", "quit"));
    }

    #[test]
    fn test_is_quit_non_ascii_word() {
        assert!(is_quit("TSCHÜSS", "tschüss"));
        assert!(is_quit(" Tschüss\n", "TSCHÜSS"));
        assert!(!is_quit("tschuss", "tschüss"));
    }

    #[test]
    fn test_context_window_starts_on_user() {
        let history: Vec<Utterance> = (0..6)
            .map(|i| {
                let speaker = if i % 2 == 0 { Speaker::User } else { Speaker::Assistant };
                Utterance::new(speaker, format!("u{}", i), i)
            })
            .collect();

        assert_eq!(context_window(&history, 0).len(), 6);
        assert_eq!(context_window(&history, 10).len(), 6);
        assert_eq!(context_window(&history, 4).len(), 4);
        // Odd limit would start on an assistant turn; it is trimmed by one
        let window = context_window(&history, 3);
        assert_eq!(window.len(), 2);
        assert_eq!(window[0].speaker(), Speaker::User);
    }

    #[tokio::test]
    async fn test_turns_alternate_user_assistant() {
        let mock = Arc::new(MockLlmClient::texts(["Nice to meet you!", "Tell me about Ohio."]));
        let mut engine = engine(mock.clone());
        let mut term = terminal("Hi, I'm Rose\nI grew up in Ohio\nquit\n");
        let mut conversation = ConversationState::new();

        engine.run(&mut term, &mut conversation).await.unwrap();

        assert_eq!(engine.state(), EngineState::Finished);
        assert!(conversation.is_terminated());
        let speakers: Vec<Speaker> = conversation.transcript().iter().map(Utterance::speaker).collect();
        assert_eq!(
            speakers,
            vec![Speaker::User, Speaker::Assistant, Speaker::User, Speaker::Assistant]
        );
        assert_eq!(conversation.transcript()[2].text(), "I grew up in Ohio");
        assert_eq!(mock.call_count(), 2);

        let output = String::from_utf8(term.into_writer()).unwrap();
        assert!(output.contains("Elder Chatbot: Hello! I'd love to chat with you."));
        assert!(output.contains("Elder Chatbot: Tell me about Ohio."));
    }

    #[tokio::test]
    async fn test_quit_first_records_nothing() {
        let mock = Arc::new(MockLlmClient::texts(Vec::<String>::new()));
        let mut engine = engine(mock.clone());
        let mut conversation = ConversationState::new();

        let outcome = engine.step(&mut terminal("  Quit  \n"), &mut conversation).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Finished);
        assert!(conversation.is_terminated());
        assert!(conversation.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_finished_engine_does_not_read() {
        let mock = Arc::new(MockLlmClient::texts(["unused"]));
        let mut engine = engine(mock.clone());
        let mut conversation = ConversationState::new();
        let mut term = terminal("quit\nHello again\n");

        engine.step(&mut term, &mut conversation).await.unwrap();
        let outcome = engine.step(&mut term, &mut conversation).await.unwrap();

        assert_eq!(outcome, TurnOutcome::Finished);
        assert!(conversation.is_empty());
        assert_eq!(mock.call_count(), 0);
    }

    #[tokio::test]
    async fn test_upstream_failure_keeps_session_running() {
        let mock = Arc::new(MockLlmClient::new(vec![
            MockReply::Text("Hello Rose!".to_string()),
            MockReply::ApiError(503),
        ]));
        let mut engine = engine(mock.clone());
        let mut conversation = ConversationState::new();
        let mut term = terminal("Hi\nTell me about your youth\nquit\n");

        assert_eq!(
            engine.step(&mut term, &mut conversation).await.unwrap(),
            TurnOutcome::Replied
        );
        assert_eq!(
            engine.step(&mut term, &mut conversation).await.unwrap(),
            TurnOutcome::Failed
        );
        assert_eq!(engine.state(), EngineState::Running);
        assert_eq!(engine.pending_input(), Some("Tell me about your youth"));
        assert_eq!(conversation.len(), 2);

        assert_eq!(
            engine.step(&mut term, &mut conversation).await.unwrap(),
            TurnOutcome::Finished
        );
        assert_eq!(conversation.len(), 2);
        assert!(conversation.is_terminated());

        let output = String::from_utf8(term.into_writer()).unwrap();
        assert!(output.contains("Press Enter to try again"));
    }

    #[tokio::test]
    async fn test_request_carries_history_and_pending_input() {
        let mock = Arc::new(MockLlmClient::texts(["Lovely.", "What did she bake?"]));
        let mut engine = engine(mock.clone());
        let mut conversation = ConversationState::new();
        let mut term = terminal("My grandmother baked\nEvery Sunday\nquit\n");

        engine.run(&mut term, &mut conversation).await.unwrap();

        let requests = mock.requests();
        assert_eq!(requests[0].messages.len(), 1);
        assert_eq!(requests[1].messages.len(), 3);
        assert_eq!(requests[1].messages[2].content, "Every Sunday");
        assert!(requests[0].system_prompt.contains("elderly person"));
    }

    #[tokio::test]
    async fn test_question_and_affirmation_alternate() {
        let mock = Arc::new(MockLlmClient::new(vec![
            MockReply::Text("Where was that?".to_string()),
            MockReply::ApiError(500),
            MockReply::Text("That sounds wonderful.".to_string()),
        ]));
        let mut engine = engine(mock.clone());
        let mut conversation = ConversationState::new();
        let mut term = terminal("I was a teacher\nFor 35 years\nFor 35 years\nquit\n");

        engine.run(&mut term, &mut conversation).await.unwrap();

        let requests = mock.requests();
        assert!(requests[0].system_prompt.contains("follow-up question"));
        // A failed turn does not advance the alternation
        assert!(requests[1].system_prompt.contains("warmly affirm"));
        assert!(requests[2].system_prompt.contains("warmly affirm"));
    }

    #[tokio::test]
    async fn test_blank_lines_are_skipped() {
        let mock = Arc::new(MockLlmClient::texts(["Hello!"]));
        let mut engine = engine(mock.clone());
        let mut conversation = ConversationState::new();
        let mut term = terminal("\n   \nHi\nquit\n");

        engine.run(&mut term, &mut conversation).await.unwrap();

        assert_eq!(conversation.len(), 2);
        assert_eq!(mock.call_count(), 1);
    }

    #[tokio::test]
    async fn test_custom_quit_word() {
        let mock = Arc::new(MockLlmClient::texts(["Hello!"]));
        let settings = ConversationConfig {
            quit_word: "goodbye".to_string(),
            ..ConversationConfig::default()
        };
        let mut engine = DialogueEngine::new(
            ModelClient::new(mock.clone(), 256),
            Arc::new(PromptLoader::embedded_only()),
            settings,
        );
        let mut conversation = ConversationState::new();
        let mut term = terminal("quit\nGoodbye\n");

        engine.run(&mut term, &mut conversation).await.unwrap();

        // "quit" is an ordinary line here
        assert_eq!(conversation.transcript()[0].text(), "quit");
        assert!(conversation.is_terminated());
        let output = String::from_utf8(term.into_writer()).unwrap();
        assert!(output.contains("You (type 'goodbye' to end):"));
    }

    #[tokio::test]
    async fn test_eof_terminates_like_quit() {
        let mock = Arc::new(MockLlmClient::texts(["Hello!"]));
        let mut engine = engine(mock.clone());
        let mut conversation = ConversationState::new();

        engine.run(&mut terminal("Hi\n"), &mut conversation).await.unwrap();

        assert!(conversation.is_terminated());
        assert_eq!(conversation.len(), 2);
    }
}
