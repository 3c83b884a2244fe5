//! HTTP client for the remote chat backend.

use async_trait::async_trait;
use futures::StreamExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::time::Duration;

use crate::conversation::ConversationId;

/// Errors from backend operations.
///
/// `Transport` and `Status` together cover any failed round-trip; the
/// caller treats them uniformly. `MissingMessageId` is raised locally when
/// feedback is attempted on a message the backend never acknowledged.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("server returned {0}")]
    Status(reqwest::StatusCode),

    #[error("message has no server-assigned id")]
    MissingMessageId,

    #[error("export write failed: {0}")]
    Io(#[from] std::io::Error),
}

/// One persisted message as the backend returns it.
#[derive(Debug, Clone, Deserialize)]
pub struct MessageRecord {
    pub role: String,
    pub content: String,
    #[serde(default)]
    pub id: Option<i64>,
}

/// Reply to a chat completion request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatReply {
    pub response: String,
    #[serde(default)]
    pub message_id: Option<i64>,
}

/// One entry in the conversation listing.
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationSummary {
    pub id: ConversationId,
}

#[derive(Debug, Serialize)]
struct ChatPayload<'a> {
    message: &'a str,
    role: &'a str,
    conversation_id: &'a str,
}

#[derive(Debug, Serialize)]
struct FeedbackPayload<'a> {
    conversation_id: &'a str,
    message_id: i64,
    is_positive: bool,
}

#[derive(Debug, Serialize)]
struct SystemMessagePayload<'a> {
    conversation_id: &'a str,
    system_message: &'a str,
}

#[derive(Debug, Deserialize)]
struct ClearReply {
    conversation_id: ConversationId,
}

/// The remote chat service, abstracted so the controller can be driven
/// against an in-memory fake in tests.
#[async_trait]
pub trait ChatBackend: Send + Sync {
    /// Full ordered message list for a conversation.
    async fn conversation_messages(
        &self,
        id: &str,
    ) -> Result<Vec<MessageRecord>, BackendError>;

    /// Post a user message and get the AI reply.
    async fn send_chat(&self, id: &str, message: &str) -> Result<ChatReply, BackendError>;

    /// Delete the conversation's messages server-side. Returns the id to
    /// continue under, which may differ from the one cleared.
    async fn clear_conversation(&self, id: &str) -> Result<ConversationId, BackendError>;

    /// Rate one persisted message.
    async fn send_feedback(
        &self,
        id: &str,
        message_id: i64,
        is_positive: bool,
    ) -> Result<(), BackendError>;

    /// Replace the conversation's system prompt.
    async fn update_system_message(
        &self,
        id: &str,
        system_message: &str,
    ) -> Result<(), BackendError>;

    /// Download the conversation transcript into `dest_dir` and return the
    /// written path.
    async fn export_conversation(
        &self,
        id: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, BackendError>;

    /// List known conversation ids.
    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, BackendError>;
}

/// `ChatBackend` over HTTP.
#[derive(Clone)]
pub struct HttpBackend {
    base_url: String,
    client: reqwest::Client,
}

impl HttpBackend {
    /// Build a client against the given base URL (no trailing slash).
    pub fn new(base_url: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }

        Self { base_url, client }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

fn ok_or_status(response: &reqwest::Response) -> Result<(), BackendError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(BackendError::Status(response.status()))
    }
}

#[async_trait]
impl ChatBackend for HttpBackend {
    async fn conversation_messages(
        &self,
        id: &str,
    ) -> Result<Vec<MessageRecord>, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/conversations/{}/messages", id)))
            .send()
            .await?;
        ok_or_status(&response)?;
        Ok(response.json().await?)
    }

    async fn send_chat(&self, id: &str, message: &str) -> Result<ChatReply, BackendError> {
        let payload = ChatPayload {
            message,
            role: "user",
            conversation_id: id,
        };
        let response = self
            .client
            .post(self.url("/chat/"))
            .json(&payload)
            .send()
            .await?;
        ok_or_status(&response)?;
        Ok(response.json().await?)
    }

    async fn clear_conversation(&self, id: &str) -> Result<ConversationId, BackendError> {
        let response = self
            .client
            .post(self.url("/clear-conversation/"))
            .query(&[("conversation_id", id)])
            .send()
            .await?;
        ok_or_status(&response)?;
        let reply: ClearReply = response.json().await?;
        Ok(reply.conversation_id)
    }

    async fn send_feedback(
        &self,
        id: &str,
        message_id: i64,
        is_positive: bool,
    ) -> Result<(), BackendError> {
        let payload = FeedbackPayload {
            conversation_id: id,
            message_id,
            is_positive,
        };
        let response = self
            .client
            .post(self.url("/feedback/"))
            .json(&payload)
            .send()
            .await?;
        ok_or_status(&response)
    }

    async fn update_system_message(
        &self,
        id: &str,
        system_message: &str,
    ) -> Result<(), BackendError> {
        let payload = SystemMessagePayload {
            conversation_id: id,
            system_message,
        };
        let response = self
            .client
            .post(self.url("/update-system-message/"))
            .json(&payload)
            .send()
            .await?;
        ok_or_status(&response)
    }

    async fn export_conversation(
        &self,
        id: &str,
        dest_dir: &Path,
    ) -> Result<PathBuf, BackendError> {
        let response = self
            .client
            .get(self.url(&format!("/export-conversation/{}", id)))
            .send()
            .await?;
        ok_or_status(&response)?;

        let path = dest_dir.join(format!("conversation_{}.txt", id));
        let mut file = tokio::fs::File::create(&path).await?;
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(path)
    }

    async fn list_conversations(&self) -> Result<Vec<ConversationSummary>, BackendError> {
        let response = self
            .client
            .get(self.url("/conversations/"))
            .send()
            .await?;
        ok_or_status(&response)?;
        Ok(response.json().await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_payload_matches_wire_shape() {
        let payload = ChatPayload {
            message: "hello",
            role: "user",
            conversation_id: "1700000000000",
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "message": "hello",
                "role": "user",
                "conversation_id": "1700000000000",
            })
        );
    }

    #[test]
    fn feedback_payload_matches_wire_shape() {
        let payload = FeedbackPayload {
            conversation_id: "c1",
            message_id: 42,
            is_positive: true,
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "conversation_id": "c1",
                "message_id": 42,
                "is_positive": true,
            })
        );
    }

    #[test]
    fn message_record_tolerates_missing_id() {
        let record: MessageRecord =
            serde_json::from_str(r#"{"role":"ai","content":"hi"}"#).unwrap();
        assert_eq!(record.role, "ai");
        assert_eq!(record.id, None);

        let record: MessageRecord =
            serde_json::from_str(r#"{"role":"user","content":"hey","id":7}"#).unwrap();
        assert_eq!(record.id, Some(7));
    }

    #[test]
    fn chat_reply_parses_with_and_without_message_id() {
        let reply: ChatReply =
            serde_json::from_str(r#"{"response":"sure","message_id":42}"#).unwrap();
        assert_eq!(reply.message_id, Some(42));

        let reply: ChatReply = serde_json::from_str(r#"{"response":"sure"}"#).unwrap();
        assert_eq!(reply.message_id, None);
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let backend = HttpBackend::new("http://localhost:8000/");
        assert_eq!(backend.url("/chat/"), "http://localhost:8000/chat/");
    }
}
