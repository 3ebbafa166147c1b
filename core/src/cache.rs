/// Message Cache: per-conversation ordered buffers
///
/// Entries are kept in arrival order and de-duplicated by message
/// identifier. The cache is the single source of truth for rendered message
/// lists; nothing is ever deleted, only appended, patched, or wholesale
/// replaced by a background fetch.
use crate::events::MessagePatch;
use crate::types::{Message, MessageContent};
use std::collections::HashMap;

#[derive(Debug, Clone, Default)]
pub struct MessageCache {
    buffers: HashMap<String, Vec<Message>>,
}

impl MessageCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, chat_id: &str) -> Option<&[Message]> {
        self.buffers.get(chat_id).map(|v| v.as_slice())
    }

    pub fn contains(&self, chat_id: &str) -> bool {
        self.buffers.contains_key(chat_id)
    }

    /// Append a message unless either of its identifiers is already present.
    /// Returns true if the message was appended.
    pub fn append(&mut self, message: Message) -> bool {
        let buffer = self.buffers.entry(message.chat_id.clone()).or_default();
        if buffer.iter().any(|m| m.shares_id(&message)) {
            return false;
        }
        buffer.push(message);
        true
    }

    /// Merge a patch into the message matching either identifier.
    /// Returns the owning chat id when a target was found.
    pub fn patch(&mut self, patch: &MessagePatch) -> Option<String> {
        for (chat_id, buffer) in self.buffers.iter_mut() {
            if let Some(msg) = buffer.iter_mut().find(|m| m.matches_id(&patch.id)) {
                if let Some(reactions) = &patch.reactions {
                    msg.reactions = reactions.clone();
                }
                if let Some(text) = &patch.content {
                    match &mut msg.content {
                        MessageContent::Text { body } => *body = text.clone(),
                        MessageContent::Media { caption, .. } => *caption = Some(text.clone()),
                    }
                }
                return Some(chat_id.clone());
            }
        }
        None
    }

    /// Replace a conversation's buffer wholesale (background fetch result)
    pub fn replace(&mut self, chat_id: &str, messages: Vec<Message>) {
        self.buffers.insert(chat_id.to_string(), messages);
    }
}
