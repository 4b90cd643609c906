//! The ordered, append-only conversation record.

use serde::{Deserialize, Serialize};

use crate::types::{Message, Personality, Role};

/// Ordered sequence of messages in conversation order.
///
/// When non-empty and the first entry is a system message, that entry carries the
/// prompt of the personality most recently passed to [`Transcript::ensure_system_message`].
/// Apart from that one in-place rewrite, entries are only ever appended.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// Creates an empty transcript.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of messages, system message included.
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Returns true if the transcript holds no messages.
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Returns every message, system message included.
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Synchronizes the system message with `personality`.
    ///
    /// An empty transcript gains a system message.  A transcript whose first entry is a
    /// system message has that entry's content overwritten.  Anything else is untouched.
    pub fn ensure_system_message(&mut self, personality: Personality) {
        match self.messages.first_mut() {
            None => self.messages.push(Message::system(personality.prompt())),
            Some(first) if first.role == Role::System => {
                if first.content != personality.prompt() {
                    first.content = personality.prompt().to_string();
                }
            }
            Some(_) => {}
        }
    }

    /// Appends a user message.
    ///
    /// Returns false, leaving the transcript unchanged, when `text` is blank.
    pub fn append_user(&mut self, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        self.messages.push(Message::user(text));
        true
    }

    /// Appends an assembled assistant reply.
    pub fn append_assistant(&mut self, text: impl Into<String>) {
        self.messages.push(Message::assistant(text));
    }

    /// Removes every message.
    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Iterates over the messages a reader sees, skipping the system instruction.
    ///
    /// The iterator borrows the transcript and can be cloned to restart the projection.
    pub fn visible_messages(&self) -> VisibleMessages<'_> {
        VisibleMessages {
            inner: self.messages.iter(),
        }
    }
}

/// Iterator returned by [`Transcript::visible_messages`].
#[derive(Debug, Clone)]
pub struct VisibleMessages<'a> {
    inner: std::slice::Iter<'a, Message>,
}

impl<'a> Iterator for VisibleMessages<'a> {
    type Item = &'a Message;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.by_ref().find(|message| !message.is_system())
    }
}
