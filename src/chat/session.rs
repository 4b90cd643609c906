//! Core chat session management.
//!
//! This module provides the `ChatSession` struct which owns one [`Session`], drives a
//! turn through the completion backend, and turns every failure into an assistant reply.

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;

use crate::accumulating_stream::AccumulatingStream;
use crate::backend::CompletionBackend;
use crate::chat::config::ChatConfig;
use crate::client_logger::CompletionLogger;
use crate::observability::{
    PERSONALITY_RESETS, STREAM_DURATION, STREAM_FRAGMENTS, STREAM_TTFF, TURNS_COMPLETED,
    TURNS_FAILED,
};
use crate::render::Renderer;
use crate::session::{HistoryPolicy, Session};
use crate::types::{GenerationParams, Model, Personality};
use crate::{Error, Result};

/// Where a turn is in its lifecycle.
///
/// A turn moves `Idle -> Sending -> Streaming -> Completed | Failed -> Idle`, or straight
/// from `Sending` to `Failed` when the request cannot be made.  Nothing cancels a turn
/// once it is sending.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TurnState {
    /// Waiting for input.
    #[default]
    Idle,
    /// The request is being sent; no fragment has arrived.
    Sending,
    /// At least one fragment has arrived.
    Streaming,
    /// The reply was appended to the transcript.
    Completed,
    /// The error reply was appended to the transcript.
    Failed,
}

impl fmt::Display for TurnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TurnState::Idle => "idle",
            TurnState::Sending => "sending",
            TurnState::Streaming => "streaming",
            TurnState::Completed => "completed",
            TurnState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// The result of submitting one line of input.
#[derive(Debug)]
pub enum TurnOutcome {
    /// The input was blank; nothing was appended and no request was made.
    Skipped,
    /// The assembled reply, now the last transcript message.
    Completed(String),
    /// The request failed; `reply` is the error text now the last transcript message.
    Failed {
        /// What went wrong.
        error: Error,
        /// The assistant message that was appended in its place.
        reply: String,
    },
}

impl TurnOutcome {
    /// The text appended as the assistant message, if any.
    pub fn reply(&self) -> Option<&str> {
        match self {
            TurnOutcome::Skipped => None,
            TurnOutcome::Completed(reply) => Some(reply),
            TurnOutcome::Failed { reply, .. } => Some(reply),
        }
    }

    /// Returns true if the turn failed.
    pub fn is_failed(&self) -> bool {
        matches!(self, TurnOutcome::Failed { .. })
    }
}

/// Builds the assistant message shown in place of a failed reply.
///
/// The result is `"Error: <message>\n\nPlease check your <credential> in the .env file."`
/// where `<message>` is the bare error message.
pub fn format_error_reply(error: &Error, credential_name: &str) -> String {
    format!(
        "Error: {}\n\nPlease check your {} in the .env file.",
        error.message(),
        credential_name
    )
}

/// Aggregated stats for a chat session.
#[derive(Debug, Clone)]
pub struct SessionStats {
    /// The backend serving completions.
    pub backend: &'static str,
    /// The model used for the session.
    pub model: Model,
    /// The active personality.
    pub personality: Personality,
    /// What a personality change does to history.
    pub history_policy: HistoryPolicy,
    /// The number of messages the user can see.
    pub message_count: usize,
    /// Turns that produced a reply.
    pub turns_completed: u64,
    /// Turns that produced an error reply.
    pub turns_failed: u64,
    /// Fragments received across all turns.
    pub fragments_received: u64,
}

/// A chat session that manages conversation state and API interactions.
///
/// The session maintains message history and handles streaming responses from the
/// configured backend.  One turn runs at a time.
pub struct ChatSession<B: CompletionBackend> {
    backend: B,
    session: Session,
    params: GenerationParams,
    logger: Option<Arc<dyn CompletionLogger>>,
    state: TurnState,
    last_turn: Option<TurnState>,
    turns_completed: u64,
    turns_failed: u64,
    fragments_received: u64,
}

impl<B: CompletionBackend> ChatSession<B> {
    /// Creates a new chat session with the given backend and configuration.
    pub fn new(backend: B, config: &ChatConfig) -> Self {
        let session = Session::new()
            .with_personality(config.personality)
            .with_history_policy(config.history_policy);
        Self::with_session(backend, session, config.generation_params())
    }

    /// Creates a chat session around an existing [`Session`].
    pub fn with_session(backend: B, session: Session, params: GenerationParams) -> Self {
        Self {
            backend,
            session,
            params,
            logger: None,
            state: TurnState::Idle,
            last_turn: None,
            turns_completed: 0,
            turns_failed: 0,
            fragments_received: 0,
        }
    }

    /// Attaches a logger that records each turn's outcome.
    pub fn with_logger(mut self, logger: Arc<dyn CompletionLogger>) -> Self {
        self.logger = Some(logger);
        self
    }

    /// Submits one line of input and streams the reply.
    ///
    /// Blank input is skipped.  Otherwise the system message is synchronized, the user
    /// message appended, and the backend called with the whole transcript.  Fragments are
    /// handed to `renderer` as they arrive.  Exactly one assistant message is appended:
    /// the assembled reply, or the error reply if anything failed.  Partial text received
    /// before a failure is not kept.
    pub async fn submit(&mut self, input: &str, renderer: &mut dyn Renderer) -> TurnOutcome {
        if input.trim().is_empty() {
            return TurnOutcome::Skipped;
        }

        self.session.ensure_system_message();
        self.session.append_user(input);
        self.state = TurnState::Sending;

        let started = Instant::now();
        let result = self.stream_reply(started, renderer).await;
        STREAM_DURATION.add(started.elapsed().as_secs_f64());

        if self.state == TurnState::Sending {
            renderer.start_response();
        }
        let outcome = match result {
            Ok(reply) => {
                renderer.finish_response();
                if let Some(logger) = &self.logger {
                    logger.log_reply(&reply);
                }
                self.session.append_assistant(reply.clone());
                self.state = TurnState::Completed;
                self.turns_completed += 1;
                TURNS_COMPLETED.click();
                TurnOutcome::Completed(reply)
            }
            Err(error) => {
                let reply = format_error_reply(&error, self.backend.credential_name());
                renderer.print_failed_reply(&reply);
                renderer.finish_response();
                if let Some(logger) = &self.logger {
                    logger.log_failure(&error);
                }
                self.session.append_assistant(reply.clone());
                self.state = TurnState::Failed;
                self.turns_failed += 1;
                TURNS_FAILED.click();
                TurnOutcome::Failed { error, reply }
            }
        };

        self.last_turn = Some(self.state);
        self.state = TurnState::Idle;
        outcome
    }

    async fn stream_reply(&mut self, started: Instant, renderer: &mut dyn Renderer) -> Result<String> {
        let fragments = self
            .backend
            .stream_completion(self.session.transcript().messages(), &self.params)
            .await?;

        let (mut stream, text_rx) = AccumulatingStream::new(fragments);
        while let Some(fragment) = stream.next().await {
            let fragment = fragment?;
            if self.state == TurnState::Sending {
                self.state = TurnState::Streaming;
                STREAM_TTFF.add(started.elapsed().as_secs_f64());
                renderer.start_response();
            }
            STREAM_FRAGMENTS.click();
            self.fragments_received += 1;
            renderer.print_text(&fragment);
        }

        text_rx
            .await
            .map_err(|_| Error::streaming("reply stream closed before completion", None))?
    }

    /// Switches personality, clearing history under the reset policy.
    ///
    /// Returns true if the personality changed.
    pub fn set_personality(&mut self, personality: Personality) -> bool {
        let changed = self.session.set_personality(personality);
        if changed && self.session.history_policy() == HistoryPolicy::ResetOnChange {
            PERSONALITY_RESETS.click();
        }
        changed
    }

    /// Clears the conversation history.
    pub fn clear(&mut self) {
        self.session.clear();
    }

    /// Draws every visible message.
    pub fn render_history(&mut self, renderer: &mut dyn Renderer) {
        self.session.ensure_system_message();
        for message in self.session.visible_messages() {
            renderer.print_message(message);
        }
    }

    /// Returns the underlying session.
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Returns the backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns the generation parameters sent with each request.
    pub fn params(&self) -> &GenerationParams {
        &self.params
    }

    /// Returns the active personality.
    pub fn personality(&self) -> Personality {
        self.session.personality()
    }

    /// Returns the current turn state.  Outside of [`ChatSession::submit`] this is always
    /// [`TurnState::Idle`].
    pub fn state(&self) -> TurnState {
        self.state
    }

    /// How the most recent turn ended, if there was one.
    pub fn last_turn(&self) -> Option<TurnState> {
        self.last_turn
    }

    /// Returns the number of visible messages in the conversation.
    pub fn message_count(&self) -> usize {
        self.session.visible_messages().count()
    }

    /// Returns session statistics.
    pub fn stats(&self) -> SessionStats {
        SessionStats {
            backend: self.backend.name(),
            model: self.params.model.clone(),
            personality: self.session.personality(),
            history_policy: self.session.history_policy(),
            message_count: self.message_count(),
            turns_completed: self.turns_completed,
            turns_failed: self.turns_failed,
            fragments_received: self.fragments_received,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::FragmentStream;
    use crate::types::Message;

    struct Unreachable;

    #[async_trait::async_trait]
    impl CompletionBackend for Unreachable {
        fn name(&self) -> &'static str {
            "Unreachable"
        }

        fn credential_name(&self) -> &'static str {
            "TEST_API_KEY"
        }

        fn has_credential(&self) -> bool {
            true
        }

        async fn stream_completion(
            &self,
            _transcript: &[Message],
            _params: &GenerationParams,
        ) -> Result<FragmentStream> {
            panic!("no request expected");
        }
    }

    struct NullRenderer;

    impl Renderer for NullRenderer {
        fn print_text(&mut self, _: &str) {}
        fn finish_response(&mut self) {}
        fn print_failed_reply(&mut self, _: &str) {}
        fn print_message(&mut self, _: &Message) {}
        fn print_error(&mut self, _: &str) {}
        fn print_info(&mut self, _: &str) {}
    }

    #[test]
    fn error_reply_format() {
        let err = Error::authentication("invalid API key");
        assert_eq!(
            format_error_reply(&err, "GROQ_API_KEY"),
            "Error: invalid API key\n\nPlease check your GROQ_API_KEY in the .env file."
        );
        let err = Error::timeout("deadline exceeded");
        assert_eq!(
            format_error_reply(&err, "GEMINI_API_KEY"),
            "Error: deadline exceeded\n\nPlease check your GEMINI_API_KEY in the .env file."
        );
    }

    #[tokio::test]
    async fn blank_input_is_skipped() {
        let mut chat = ChatSession::new(Unreachable, &ChatConfig::new());
        let mut renderer = NullRenderer;
        for input in ["", "   ", "\n\t"] {
            assert!(matches!(
                chat.submit(input, &mut renderer).await,
                TurnOutcome::Skipped
            ));
        }
        assert!(chat.session().transcript().is_empty());
        assert_eq!(chat.state(), TurnState::Idle);
        assert_eq!(chat.last_turn(), None);
    }

    #[test]
    fn personality_from_config() {
        let config = ChatConfig::new().with_personality(Personality::Humorous);
        let mut chat = ChatSession::new(Unreachable, &config);
        assert_eq!(chat.personality(), Personality::Humorous);
        assert!(!chat.set_personality(Personality::Humorous));
        assert!(chat.set_personality(Personality::Friendly));
    }

    #[test]
    fn stats_start_empty() {
        let chat = ChatSession::new(Unreachable, &ChatConfig::new());
        let stats = chat.stats();
        assert_eq!(stats.backend, "Unreachable");
        assert_eq!(stats.message_count, 0);
        assert_eq!(stats.turns_completed, 0);
        assert_eq!(stats.turns_failed, 0);
        assert_eq!(stats.personality, Personality::Friendly);
    }

    #[test]
    fn turn_state_names() {
        assert_eq!(TurnState::default().to_string(), "idle");
        assert_eq!(TurnState::Streaming.to_string(), "streaming");
    }
}
