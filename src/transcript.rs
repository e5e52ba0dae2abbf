//! In-memory message history for one session.

use crate::events::{Message, Role};

/// Ordered messages of a session. The first entry is always the system primer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    /// A transcript holding only the system primer
    pub fn init(primer: &str) -> Self {
        Self {
            messages: vec![Message::new(Role::System, primer)],
        }
    }

    /// Push a message to the end. Content is not validated here.
    pub fn append(&mut self, role: Role, content: impl Into<String>) {
        self.messages.push(Message::new(role, content));
    }

    /// Discard all history and start again from `primer`
    pub fn reset(&mut self, primer: &str) {
        *self = Self::init(primer);
    }

    /// Read-only view for rendering and for the completion request
    pub fn all(&self) -> &[Message] {
        &self.messages
    }

    /// Entries after the system primer
    pub fn turns(&self) -> &[Message] {
        &self.messages[1..]
    }

    pub fn primer(&self) -> &str {
        &self.messages[0].content
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Always false once constructed
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
