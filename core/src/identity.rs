/// Identity resolution: which directory entry does a reference pair denote?
///
/// A conversation reference is a channel identifier plus an optional contact
/// number. The same human contact can be reachable under two addressing
/// schemes, so resolution falls back to the contact number for 1:1 chats.
use crate::types::Conversation;

/// Derive a contact number from the non-suffix portion of a channel id
/// ("4915550001@c.us" → "4915550001"). Group and broadcast addresses have
/// no meaningful number.
pub fn phone_from_chat_id(chat_id: &str) -> Option<String> {
    let prefix = chat_id.split('@').next()?;
    if !prefix.is_empty() && prefix.chars().all(|c| c.is_ascii_digit() || c == '+') {
        Some(prefix.to_string())
    } else {
        None
    }
}

/// Resolve a reference pair against the directory.
///
/// Order: exact channel-id match, then contact-number match among 1:1
/// conversations. `None` means "unknown conversation": the caller must
/// fall back to a full refresh, since the client never fabricates an entry.
pub fn resolve(
    directory: &[Conversation],
    chat_id: &str,
    phone: Option<&str>,
) -> Option<usize> {
    if let Some(idx) = directory.iter().position(|c| c.chat_id == chat_id) {
        return Some(idx);
    }
    let phone = phone?;
    directory.iter().position(|c| {
        !c.is_group && !c.is_broadcast() && c.phone.as_deref() == Some(phone)
    })
}
