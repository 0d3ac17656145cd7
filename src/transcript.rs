//! In-memory conversation transcript
//!
//! Append-only from the outside. Ids are `len + 1` at append time, so they
//! stay gapless as long as a single writer owns the store; the chat session
//! guarantees that by holding its lock for the whole turn.

use crate::llm::{LlmMessage, MessageRole};
use serde::{Deserialize, Serialize};

/// One entry in the transcript
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: MessageRole,
    pub content: String,
}

impl From<&Message> for LlmMessage {
    fn from(message: &Message) -> Self {
        LlmMessage {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// Ordered message history for the one conversation this process serves
#[derive(Debug, Default)]
pub struct Transcript {
    messages: Vec<Message>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return the stored record
    pub fn append(&mut self, role: MessageRole, content: impl Into<String>) -> Message {
        let message = Message {
            id: self.messages.len() as u64 + 1,
            role,
            content: content.into(),
        };
        self.messages.push(message.clone());
        message
    }

    /// Full transcript in insertion order
    pub fn snapshot(&self) -> Vec<Message> {
        self.messages.clone()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Drop everything past `len`. Only used to undo a failed turn.
    pub(crate) fn truncate(&mut self, len: usize) {
        self.messages.truncate(len);
    }
}
