/// Push-channel wire types
///
/// Loose JSON arriving on the push channel is narrowed here, once, into a
/// closed set of typed events. Reconciliation logic never sees untyped
/// payloads.
use crate::error::Result;
use crate::types::{Message, MessageContent, Reaction};
use serde::{Deserialize, Serialize};

/// Inbound message as delivered by the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireMessage {
    pub id: String,
    #[serde(default)]
    pub alt_id: Option<String>,
    pub chat_id: String,
    pub from_me: bool,
    /// Epoch millis
    pub timestamp: i64,
    /// Text body, or caption for media messages
    #[serde(default)]
    pub content: Option<String>,
    /// Content discriminator: "text"/"chat" or a media kind ("image", ...)
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub media_url: Option<String>,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub quoted_id: Option<String>,
    /// Contact number newly learned from this event, if any
    #[serde(default)]
    pub sender_contact: Option<String>,
    #[serde(default)]
    pub sender_name: Option<String>,
}

/// Sender identity carried alongside a wire message
#[derive(Debug, Clone, Default)]
pub struct SenderInfo {
    pub contact: Option<String>,
    pub name: Option<String>,
}

impl WireMessage {
    /// Narrow the wire shape into the domain message plus sender identity
    pub fn into_parts(self) -> (Message, SenderInfo) {
        let content = match self.kind.as_str() {
            "text" | "chat" => MessageContent::Text {
                body: self.content.unwrap_or_default(),
            },
            _ => MessageContent::Media {
                url: self.media_url.unwrap_or_default(),
                mime: self.mime_type.unwrap_or_default(),
                caption: self.content.filter(|c| !c.is_empty()),
            },
        };
        let message = Message {
            id: self.id,
            alt_id: self.alt_id,
            chat_id: self.chat_id,
            from_me: self.from_me,
            timestamp: self.timestamp,
            content,
            quoted_id: self.quoted_id,
            reactions: Vec::new(),
        };
        let sender = SenderInfo {
            contact: self.sender_contact,
            name: self.sender_name,
        };
        (message, sender)
    }
}

/// Patch for an existing message (no reordering, no unread effect)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePatch {
    /// Matches either identifier of the target message
    pub id: String,
    #[serde(default)]
    pub reactions: Option<Vec<Reaction>>,
    /// Replacement text (body for text messages, caption for media)
    #[serde(default)]
    pub content: Option<String>,
}

/// Patch for a conversation's summary fields
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatPatch {
    pub chat_id: String,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
    #[serde(default)]
    pub ai_enabled: Option<bool>,
}

/// The closed set of push events the engine reconciles
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", content = "data")]
pub enum PushEvent {
    #[serde(rename = "message:new")]
    NewMessage { message: WireMessage },
    #[serde(rename = "message:update")]
    MessageUpdate(MessagePatch),
    #[serde(rename = "chat:update")]
    ChatUpdate { chat: ChatPatch },
}

impl PushEvent {
    /// Parse a raw channel frame into a typed event
    pub fn parse(raw: &str) -> Result<PushEvent> {
        Ok(serde_json::from_str(raw)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_new_message() {
        let raw = r#"{
            "event": "message:new",
            "data": {
                "message": {
                    "id": "m1",
                    "chatId": "4915550001@c.us",
                    "fromMe": false,
                    "timestamp": 1700000000000,
                    "content": "hi",
                    "type": "text",
                    "senderContact": "+4915550001",
                    "senderName": "Ada"
                }
            }
        }"#;
        let event = PushEvent::parse(raw).unwrap();
        match event {
            PushEvent::NewMessage { message } => {
                let (msg, sender) = message.into_parts();
                assert_eq!(msg.id, "m1");
                assert!(!msg.from_me);
                assert_eq!(
                    msg.content,
                    MessageContent::Text {
                        body: "hi".to_string()
                    }
                );
                assert_eq!(sender.name.as_deref(), Some("Ada"));
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_parse_media_message() {
        let raw = r#"{
            "event": "message:new",
            "data": {
                "message": {
                    "id": "m2",
                    "chatId": "4915550001@c.us",
                    "fromMe": false,
                    "timestamp": 1700000000001,
                    "type": "image",
                    "mediaUrl": "https://x.test/a.jpg",
                    "mimeType": "image/jpeg"
                }
            }
        }"#;
        let event = PushEvent::parse(raw).unwrap();
        let PushEvent::NewMessage { message } = event else {
            panic!("wrong variant");
        };
        let (msg, _) = message.into_parts();
        match msg.content {
            MessageContent::Media { url, mime, caption } => {
                assert_eq!(url, "https://x.test/a.jpg");
                assert_eq!(mime, "image/jpeg");
                assert!(caption.is_none());
            }
            other => panic!("wrong content: {:?}", other),
        }
    }

    #[test]
    fn test_parse_message_update() {
        let raw = r#"{
            "event": "message:update",
            "data": { "id": "m1", "reactions": [{"emoji": "👍", "sender": null}] }
        }"#;
        let event = PushEvent::parse(raw).unwrap();
        let PushEvent::MessageUpdate(patch) = event else {
            panic!("wrong variant");
        };
        assert_eq!(patch.id, "m1");
        assert_eq!(patch.reactions.unwrap().len(), 1);
        assert!(patch.content.is_none());
    }

    #[test]
    fn test_parse_chat_update() {
        let raw = r#"{
            "event": "chat:update",
            "data": { "chat": { "chatId": "c1@c.us", "sentiment": "positive", "aiEnabled": true } }
        }"#;
        let event = PushEvent::parse(raw).unwrap();
        let PushEvent::ChatUpdate { chat } = event else {
            panic!("wrong variant");
        };
        assert_eq!(chat.chat_id, "c1@c.us");
        assert_eq!(chat.sentiment.as_deref(), Some("positive"));
        assert_eq!(chat.ai_enabled, Some(true));
        assert!(chat.summary.is_none());
    }

    #[test]
    fn test_unknown_event_rejected() {
        let raw = r#"{ "event": "presence:update", "data": {} }"#;
        assert!(PushEvent::parse(raw).is_err());
    }
}
