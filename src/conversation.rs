//! Conversation state: messages, ids, and the local transcript.

use chrono::{DateTime, Utc};
use uuid::Uuid;

/// Opaque token correlating all requests to one chat session.
pub type ConversationId = String;

/// Generate a fresh conversation id from the current UTC timestamp.
///
/// Millisecond resolution; two processes starting within the same
/// millisecond would collide, which is accepted for a local client.
pub fn generate_conversation_id() -> ConversationId {
    Utc::now().timestamp_millis().to_string()
}

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Ai,
}

impl Sender {
    /// Map a server-side role string onto a sender.
    ///
    /// The backend only distinguishes the user; every other role
    /// ("ai", "assistant", "system") renders as the assistant.
    pub fn from_role(role: &str) -> Self {
        match role {
            "user" => Sender::User,
            _ => Sender::Ai,
        }
    }
}

/// Stable key for a message.
///
/// Optimistically created messages get a `Local` id at birth; messages
/// persisted by the backend carry the server's numeric id. Feedback can
/// only be submitted for `Server` ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageId {
    Local(Uuid),
    Server(i64),
}

impl MessageId {
    pub fn fresh_local() -> Self {
        MessageId::Local(Uuid::new_v4())
    }

    /// The backend-assigned id, if this message has been persisted.
    pub fn server_id(&self) -> Option<i64> {
        match self {
            MessageId::Server(id) => Some(*id),
            MessageId::Local(_) => None,
        }
    }
}

/// Round-trip state of an optimistically appended message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryStatus {
    /// Appended locally, not yet acknowledged by the backend.
    Pending,
    /// Acknowledged by the backend (or loaded from it).
    Confirmed,
    /// The request that carried it failed; kept visible so the user can
    /// tell it apart from a delivered message.
    Failed,
}

/// User rating of an AI reply. Immutable once set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Feedback {
    Positive,
    Negative,
}

/// A single message in the transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct ChatMessage {
    pub id: MessageId,
    pub sender: Sender,
    pub text: String,
    pub status: DeliveryStatus,
    pub feedback: Option<Feedback>,
    pub timestamp: DateTime<Utc>,
}

impl ChatMessage {
    /// An optimistic user message awaiting backend acknowledgement.
    pub fn pending_user(text: String) -> Self {
        Self {
            id: MessageId::fresh_local(),
            sender: Sender::User,
            text,
            status: DeliveryStatus::Pending,
            feedback: None,
            timestamp: Utc::now(),
        }
    }

    /// An AI reply echoed by the backend.
    pub fn ai_reply(text: String, id: MessageId) -> Self {
        Self {
            id,
            sender: Sender::Ai,
            text,
            status: DeliveryStatus::Confirmed,
            feedback: None,
            timestamp: Utc::now(),
        }
    }

    /// A message reconstructed from a loaded conversation.
    pub fn loaded(sender: Sender, text: String, id: MessageId) -> Self {
        Self {
            id,
            sender,
            text,
            status: DeliveryStatus::Confirmed,
            feedback: None,
            timestamp: Utc::now(),
        }
    }
}

/// Ordered transcript of the active conversation.
///
/// Mutated only through the methods below: append, bulk replace on load,
/// clear, confirm/fail a pending message, or patch one message's feedback
/// by id. Never merged across conversations.
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    messages: Vec<ChatMessage>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an optimistic user message and return its local id.
    pub fn push_user(&mut self, text: String) -> MessageId {
        let message = ChatMessage::pending_user(text);
        let id = message.id;
        self.messages.push(message);
        id
    }

    /// Append a confirmed AI reply.
    pub fn push_ai(&mut self, text: String, id: MessageId) {
        self.messages.push(ChatMessage::ai_reply(text, id));
    }

    /// Replace the entire transcript with messages loaded from the backend.
    pub fn replace(&mut self, messages: Vec<ChatMessage>) {
        self.messages = messages;
    }

    pub fn clear(&mut self) {
        self.messages.clear();
    }

    /// Mark a pending message as acknowledged.
    pub fn confirm(&mut self, id: MessageId) {
        if let Some(message) = self.get_mut(id) {
            message.status = DeliveryStatus::Confirmed;
        }
    }

    /// Mark a pending message as failed.
    pub fn fail(&mut self, id: MessageId) {
        if let Some(message) = self.get_mut(id) {
            message.status = DeliveryStatus::Failed;
        }
    }

    /// Record feedback on a message. Returns false if the message is
    /// unknown or already has feedback (feedback is immutable once set).
    pub fn set_feedback(&mut self, id: MessageId, feedback: Feedback) -> bool {
        match self.get_mut(id) {
            Some(message) if message.feedback.is_none() => {
                message.feedback = Some(feedback);
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, id: MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| m.id == id)
    }

    fn get_mut(&mut self, id: MessageId) -> Option<&mut ChatMessage> {
        self.messages.iter_mut().find(|m| m.id == id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChatMessage> {
        self.messages.iter()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Ids of AI messages, newest last. Used by the transcript view to
    /// move the feedback cursor.
    pub fn ai_message_ids(&self) -> Vec<MessageId> {
        self.messages
            .iter()
            .filter(|m| m.sender == Sender::Ai)
            .map(|m| m.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_user_starts_pending_with_local_id() {
        let mut history = ChatHistory::new();
        let id = history.push_user("hello".to_string());
        let message = history.get(id).unwrap();
        assert_eq!(message.status, DeliveryStatus::Pending);
        assert!(matches!(message.id, MessageId::Local(_)));
        assert_eq!(message.sender, Sender::User);
    }

    #[test]
    fn confirm_and_fail_transition_status() {
        let mut history = ChatHistory::new();
        let id = history.push_user("a".to_string());
        history.confirm(id);
        assert_eq!(history.get(id).unwrap().status, DeliveryStatus::Confirmed);

        let id2 = history.push_user("b".to_string());
        history.fail(id2);
        assert_eq!(history.get(id2).unwrap().status, DeliveryStatus::Failed);
    }

    #[test]
    fn replace_drops_previous_messages() {
        let mut history = ChatHistory::new();
        history.push_user("old".to_string());
        history.replace(vec![ChatMessage::loaded(
            Sender::Ai,
            "fresh".to_string(),
            MessageId::Server(7),
        )]);
        assert_eq!(history.len(), 1);
        assert_eq!(history.last().unwrap().text, "fresh");
    }

    #[test]
    fn feedback_is_immutable_once_set() {
        let mut history = ChatHistory::new();
        let id = MessageId::Server(42);
        history.push_ai("reply".to_string(), id);
        assert!(history.set_feedback(id, Feedback::Positive));
        assert!(!history.set_feedback(id, Feedback::Negative));
        assert_eq!(history.get(id).unwrap().feedback, Some(Feedback::Positive));
    }

    #[test]
    fn feedback_on_unknown_message_is_refused() {
        let mut history = ChatHistory::new();
        assert!(!history.set_feedback(MessageId::Server(1), Feedback::Positive));
    }

    #[test]
    fn role_mapping_defaults_to_ai() {
        assert_eq!(Sender::from_role("user"), Sender::User);
        assert_eq!(Sender::from_role("ai"), Sender::Ai);
        assert_eq!(Sender::from_role("assistant"), Sender::Ai);
    }
}
