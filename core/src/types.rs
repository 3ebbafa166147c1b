/// Shared types for the conversation sync engine
use serde::{Deserialize, Serialize};

/// Reserved broadcast channel used for network status updates.
/// Never admitted into the conversation directory.
pub const STATUS_BROADCAST: &str = "status@broadcast";

/// Snippet shown in the directory when a message carries only media
pub const MEDIA_PLACEHOLDER: &str = "[media]";

/// One conversation in the directory (summary view of a chat)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    /// Stable channel identifier (primary key, e.g. "4915550001@c.us")
    pub chat_id: String,
    /// Contact number (secondary key for 1:1 chats, absent for groups)
    pub phone: Option<String>,
    /// Display name; may be a placeholder derived from the channel id
    pub name: String,
    /// Preview text of the last message
    pub last_message: String,
    /// Epoch millis of the last message
    pub last_timestamp: i64,
    /// Unread messages (local, per-session view)
    pub unread: u32,
    pub archived: bool,
    pub is_group: bool,
    pub ai_enabled: bool,
    pub sentiment: Option<String>,
    pub summary: Option<String>,
    pub suggestions: Vec<String>,
}

impl Conversation {
    /// Broadcast channels are identified by their address suffix
    pub fn is_broadcast(&self) -> bool {
        self.chat_id.ends_with("@broadcast")
    }

    /// True when the display name was never set by a human: it still equals
    /// the numeric portion of the channel id or the known contact number.
    pub fn has_placeholder_name(&self) -> bool {
        let numeric = self.chat_id.split('@').next().unwrap_or_default();
        self.name == numeric || Some(self.name.as_str()) == self.phone.as_deref()
    }
}

/// Typed message content payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MessageContent {
    Text {
        body: String,
    },
    Media {
        url: String,
        mime: String,
        caption: Option<String>,
    },
}

impl MessageContent {
    /// Directory preview text for this content
    pub fn snippet(&self) -> String {
        match self {
            MessageContent::Text { body } => body.clone(),
            MessageContent::Media { caption, .. } => match caption {
                Some(c) if !c.is_empty() => c.clone(),
                _ => MEDIA_PLACEHOLDER.to_string(),
            },
        }
    }

    /// Plain text of this content, if any (used by drop predicates)
    pub fn text(&self) -> Option<&str> {
        match self {
            MessageContent::Text { body } => Some(body),
            MessageContent::Media { caption, .. } => caption.as_deref(),
        }
    }
}

/// A reaction attached to a message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    pub emoji: String,
    pub sender: Option<String>,
}

/// One message in a conversation's cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Server-assigned identifier (primary)
    pub id: String,
    /// Alternate identifier some backends attach (secondary dedup key)
    pub alt_id: Option<String>,
    pub chat_id: String,
    /// Sent by the operator (vs received from the contact)
    pub from_me: bool,
    /// Epoch millis
    pub timestamp: i64,
    pub content: MessageContent,
    /// Identifier of a quoted message, if this is a reply
    pub quoted_id: Option<String>,
    pub reactions: Vec<Reaction>,
}

impl Message {
    /// True if `id` matches either of this message's identifiers
    pub fn matches_id(&self, id: &str) -> bool {
        self.id == id || self.alt_id.as_deref() == Some(id)
    }

    /// True if the two messages share any identifier
    pub fn shares_id(&self, other: &Message) -> bool {
        self.matches_id(&other.id)
            || other.matches_id(&self.id)
            || (self.alt_id.is_some() && self.alt_id == other.alt_id)
    }
}

/// Identity pair of the currently active conversation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Selection {
    pub chat_id: String,
    pub phone: Option<String>,
}

/// Events broadcast to the view layer
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UiEvent {
    /// The directory was replaced by a full-snapshot refresh
    DirectoryRefreshed,
    /// A message was appended to a conversation's cache
    MessageAppended { chat_id: String, message: Message },
    /// An existing message was patched (reactions/content)
    MessagePatched { chat_id: String, message_id: String },
    /// A conversation's summary fields changed
    ConversationUpdated { chat_id: String },
    /// The active conversation changed
    SelectionChanged { chat_id: Option<String> },
    /// The active conversation's cache was replaced by a background fetch
    MessagesRefreshed { chat_id: String },
    /// An operator send failed (no retry is attempted)
    SendFailed { chat_id: String, reason: String },
    /// The credential expired; the operator must sign in again
    SignedOut,
}
