//! Per-model conversation history.

use super::message::ChatMessage;

/// Ordered user/assistant turns sent to one remote model.
///
/// Turns are only ever appended as complete exchanges, so the history always
/// alternates user, assistant, user, assistant. It lives for one session and is
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConversationHistory {
    messages: Vec<ChatMessage>,
}

impl ConversationHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends one user turn followed by the assistant turn answering it.
    pub fn push_exchange(&mut self, user: impl Into<String>, assistant: impl Into<String>) {
        self.messages.push(ChatMessage::user(user));
        self.messages.push(ChatMessage::assistant(assistant));
    }

    /// Builds the full request: system instruction, prior turns, then `user_turn`.
    pub fn request_messages(&self, system_prompt: &str, user_turn: &str) -> Vec<ChatMessage> {
        let mut messages = Vec::with_capacity(self.messages.len() + 2);
        messages.push(ChatMessage::system(system_prompt));
        messages.extend(self.messages.iter().cloned());
        messages.push(ChatMessage::user(user_turn));
        messages
    }

    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of completed user/assistant exchanges.
    pub fn exchanges(&self) -> usize {
        self.messages.len() / 2
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
