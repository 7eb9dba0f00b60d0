//! Ordered, in-memory conversation log.

use chrono::Utc;

use nutribot_core::types::{Message, MessageId, MessageRole};

/// Insertion-ordered sequence of messages for one conversation.
///
/// Messages are never edited once appended. The only removal path is
/// [`ConversationLog::remove_confirmations`], used when a pending
/// confirmation is resolved or cancelled.
#[derive(Debug, Clone, Default)]
pub struct ConversationLog {
    messages: Vec<Message>,
    next_seq: u64,
}

impl ConversationLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate an identifier and append the message built from it.
    pub fn append(&mut self, build: impl FnOnce(MessageId) -> Message) -> MessageId {
        let id = MessageId::new(Utc::now(), self.next_seq);
        self.next_seq += 1;
        let message = build(id);
        tracing::trace!(id = %message.id, role = %message.role, "Message appended");
        self.messages.push(message);
        id
    }

    /// Remove every confirmation-role message. Returns how many were removed.
    pub fn remove_confirmations(&mut self) -> usize {
        let before = self.messages.len();
        self.messages
            .retain(|m| m.role != MessageRole::Confirmation);
        before - self.messages.len()
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn get(&self, id: MessageId) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    pub fn last(&self) -> Option<&Message> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Number of messages with the given role.
    pub fn count_role(&self, role: MessageRole) -> usize {
        self.messages.iter().filter(|m| m.role == role).count()
    }
}
