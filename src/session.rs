//! Per-connection conversation state.
//!
//! A [`Session`] pairs a [`Transcript`] with the active [`Personality`] and keeps the
//! system message in step with it.  It does no I/O; driving turns against a backend is
//! the job of [`crate::chat::ChatSession`].

use std::fmt;

use crate::transcript::{Transcript, VisibleMessages};
use crate::types::Personality;

/// What happens to prior turns when the personality changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HistoryPolicy {
    /// Discard the whole transcript.
    #[default]
    ResetOnChange,

    /// Keep prior turns; only the system message is rewritten.
    PreserveOnChange,
}

impl fmt::Display for HistoryPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HistoryPolicy::ResetOnChange => write!(f, "reset"),
            HistoryPolicy::PreserveOnChange => write!(f, "preserve"),
        }
    }
}

/// The transcript and personality owned by one interactive client.
#[derive(Debug, Clone, Default)]
pub struct Session {
    transcript: Transcript,
    personality: Personality,
    history_policy: HistoryPolicy,
}

impl Session {
    /// Creates an empty session with the default personality.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the session in `slot`, creating an empty one first if there is none.
    pub fn initialize(slot: &mut Option<Session>) -> &mut Session {
        slot.get_or_insert_with(Session::new)
    }

    /// Sets the starting personality.
    pub fn with_personality(mut self, personality: Personality) -> Self {
        self.personality = personality;
        self
    }

    /// Sets the history policy.
    pub fn with_history_policy(mut self, policy: HistoryPolicy) -> Self {
        self.history_policy = policy;
        self
    }

    /// Returns the active personality.
    pub fn personality(&self) -> Personality {
        self.personality
    }

    /// Returns the history policy.
    pub fn history_policy(&self) -> HistoryPolicy {
        self.history_policy
    }

    /// Returns the transcript.
    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    /// Switches personality.
    ///
    /// Under [`HistoryPolicy::ResetOnChange`] a change discards every message with no
    /// undo.  Returns true if the personality actually changed.
    pub fn set_personality(&mut self, personality: Personality) -> bool {
        if personality == self.personality {
            return false;
        }
        self.personality = personality;
        if self.history_policy == HistoryPolicy::ResetOnChange {
            self.transcript.clear();
        }
        true
    }

    /// Makes the transcript's system message match the active personality.
    ///
    /// Call before every render and every completion request.
    pub fn ensure_system_message(&mut self) {
        self.transcript.ensure_system_message(self.personality);
    }

    /// Appends user text; blank text is dropped and false is returned.
    pub fn append_user(&mut self, text: &str) -> bool {
        self.transcript.append_user(text)
    }

    /// Appends an assistant reply.
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.transcript.append_assistant(text);
    }

    /// Discards every message.  The personality is kept.
    pub fn clear(&mut self) {
        self.transcript.clear();
    }

    /// Messages to show the user, without the system instruction.
    pub fn visible_messages(&self) -> VisibleMessages<'_> {
        self.transcript.visible_messages()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Message, Role};

    #[test]
    fn new_session_empty_and_friendly() {
        let session = Session::new();
        assert!(session.transcript().is_empty());
        assert_eq!(session.personality(), Personality::Friendly);
        assert_eq!(session.history_policy(), HistoryPolicy::ResetOnChange);
    }

    #[test]
    fn initialize_creates_once() {
        let mut slot = None;
        Session::initialize(&mut slot).append_user("hello");
        let session = Session::initialize(&mut slot);
        assert_eq!(session.transcript().len(), 1);
    }

    #[test]
    fn set_personality_then_ensure_system() {
        for personality in Personality::ALL {
            let mut session = Session::new();
            session.ensure_system_message();
            session.append_user("hi");
            session.set_personality(personality);
            session.ensure_system_message();
            assert_eq!(
                session.transcript().messages()[0],
                Message::system(personality.prompt())
            );
        }
    }

    #[test]
    fn personality_change_resets_history() {
        let mut session = Session::new();
        session.ensure_system_message();
        session.append_user("recommend a game");
        session.append_assistant("Try Celeste");
        assert_eq!(session.transcript().len(), 3);

        assert!(session.set_personality(Personality::Professional));
        assert!(session.transcript().is_empty());

        session.ensure_system_message();
        assert_eq!(
            session.transcript().messages(),
            &[Message::system(Personality::Professional.prompt())]
        );
    }

    #[test]
    fn same_personality_keeps_history() {
        let mut session = Session::new();
        session.ensure_system_message();
        session.append_user("hi");
        assert!(!session.set_personality(Personality::Friendly));
        assert_eq!(session.transcript().len(), 2);
    }

    #[test]
    fn preserve_policy_rewrites_system_only() {
        let mut session = Session::new().with_history_policy(HistoryPolicy::PreserveOnChange);
        session.ensure_system_message();
        session.append_user("hi");
        session.append_assistant("yo");

        assert!(session.set_personality(Personality::Humorous));
        assert_eq!(session.transcript().len(), 3);
        session.ensure_system_message();
        assert_eq!(session.transcript().len(), 3);
        assert_eq!(
            session.transcript().messages()[0].content,
            Personality::Humorous.prompt()
        );
        assert_eq!(session.visible_messages().count(), 2);
    }

    #[test]
    fn clear_keeps_personality() {
        let mut session = Session::new().with_personality(Personality::Humorous);
        session.ensure_system_message();
        session.append_user("hi");
        session.clear();
        assert!(session.transcript().is_empty());
        assert_eq!(session.personality(), Personality::Humorous);
    }

    #[test]
    fn visible_messages_exclude_system() {
        let mut session = Session::new();
        session.ensure_system_message();
        session.append_user("hi");
        assert!(session.visible_messages().all(|m| m.role != Role::System));
    }

    #[test]
    fn history_policy_names() {
        assert_eq!(HistoryPolicy::ResetOnChange.to_string(), "reset");
        assert_eq!(HistoryPolicy::PreserveOnChange.to_string(), "preserve");
    }
}
