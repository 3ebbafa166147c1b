/// REST backend contract (request/response collaborators only)
///
/// The sync engine talks to the backend exclusively through this trait, so
/// tests can substitute an in-memory implementation for the wire one.
use crate::error::Result;
use crate::types::{Conversation, Message};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Payload submitted when the operator sends a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OutgoingPayload {
    Text {
        body: String,
    },
    Media {
        url: String,
        mime: String,
        caption: Option<String>,
        one_time: bool,
        animated: bool,
    },
}

/// Result of a media upload round-trip
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaUpload {
    pub url: String,
    pub mime: String,
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Fetch the full conversation snapshot
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>>;

    /// Fetch the message history for a channel identifier
    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>>;

    /// Submit a new message; the backend may return the persisted record
    async fn send_message(
        &self,
        chat_id: &str,
        payload: &OutgoingPayload,
        quoted_id: Option<&str>,
    ) -> Result<Option<Message>>;

    /// Upload a media file, returning its reference URL and MIME type
    async fn upload_media(&self, file_name: &str, data: Vec<u8>) -> Result<MediaUpload>;

    /// Toggle AI-assist for a conversation
    async fn set_ai_enabled(&self, chat_id: &str, enabled: bool) -> Result<()>;

    /// Toggle the archived flag for a conversation
    async fn set_archived(&self, chat_id: &str, archived: bool) -> Result<()>;
}
