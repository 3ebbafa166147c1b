/// Event Reconciler: applies push events to the directory and message cache
///
/// Every mutation here is an atomic replace-or-merge of one entry. A render
/// scheduled between two handler invocations therefore never observes a
/// half-applied event.
use crate::cache::MessageCache;
use crate::directory::Directory;
use crate::events::{ChatPatch, MessagePatch, SenderInfo};
use crate::identity;
use crate::types::{Message, Selection, UiEvent};
use std::sync::Arc;
use tracing::debug;

/// Predicate deciding whether an inbound message is protocol metadata that
/// should be dropped before reconciliation. The marker list is heuristic and
/// deployment-specific, so the predicate is pluggable rather than the
/// substrings being semantically meaningful.
pub type MessageFilter = Arc<dyn Fn(&Message) -> bool + Send + Sync>;

const DEFAULT_PROTOCOL_MARKERS: &[&str] = &[
    "protocolMessage",
    "messageContextInfo",
    "senderKeyDistributionMessage",
];

/// Default filter: drop messages whose text contains a protocol marker
pub fn default_filter() -> MessageFilter {
    Arc::new(|msg: &Message| {
        msg.content
            .text()
            .is_some_and(|t| DEFAULT_PROTOCOL_MARKERS.iter().any(|m| t.contains(m)))
    })
}

/// What the reconciler decided about an event
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// State was mutated
    Applied,
    /// Duplicate, filtered, or stale; nothing changed
    Ignored,
    /// The event references an unseen conversation; the caller must perform
    /// a full refresh (the client never fabricates directory entries)
    NeedsRefresh,
}

/// Apply an inbound (or echoed outbound) message.
///
/// Unread delta is 0 for the selected conversation and for operator-sent
/// messages, +1 otherwise. The target conversation's summary fields are
/// updated, its display name upgraded when a contact number is newly
/// learned, and the conversation moves to the head of the directory. The
/// append into the cache is guarded by identifier de-duplication; a
/// duplicate leaves directory and cache untouched.
pub fn apply_new_message(
    directory: &mut Directory,
    cache: &mut MessageCache,
    selection: Option<&Selection>,
    mut message: Message,
    sender: &SenderInfo,
    filter: &MessageFilter,
) -> (Outcome, Vec<UiEvent>) {
    if (filter.as_ref())(&message) {
        debug!("dropping protocol-metadata message {}", message.id);
        return (Outcome::Ignored, Vec::new());
    }

    let phone = sender
        .contact
        .clone()
        .or_else(|| identity::phone_from_chat_id(&message.chat_id));
    let Some(idx) = identity::resolve(directory.entries(), &message.chat_id, phone.as_deref())
    else {
        debug!("message {} references unknown chat {}", message.id, message.chat_id);
        return (Outcome::NeedsRefresh, Vec::new());
    };

    // The event may address the conversation under an alternate scheme;
    // the cache is keyed by the directory's channel id.
    let chat_id = directory.entries()[idx].chat_id.clone();
    message.chat_id = chat_id.clone();

    if cache
        .get(&chat_id)
        .is_some_and(|buf| buf.iter().any(|m| m.shares_id(&message)))
    {
        debug!("duplicate message {} for chat {}", message.id, chat_id);
        return (Outcome::Ignored, Vec::new());
    }

    let is_selected = selection.is_some_and(|s| s.chat_id == chat_id);

    let conv = directory.at_mut(idx);
    conv.last_message = message.content.snippet();
    conv.last_timestamp = message.timestamp;
    if !is_selected && !message.from_me {
        conv.unread += 1;
    }
    if let Some(contact) = &sender.contact {
        if conv.has_placeholder_name() {
            conv.name = sender.name.clone().unwrap_or_else(|| contact.clone());
        }
        if conv.phone.is_none() && !conv.is_group && !conv.is_broadcast() {
            conv.phone = Some(contact.clone());
        }
    }
    directory.promote(idx);

    cache.append(message.clone());

    (
        Outcome::Applied,
        vec![
            UiEvent::MessageAppended {
                chat_id: chat_id.clone(),
                message,
            },
            UiEvent::ConversationUpdated { chat_id },
        ],
    )
}

/// Apply a message patch: merge reactions/content into the existing record.
/// No reordering, no unread effect.
pub fn apply_message_patch(
    cache: &mut MessageCache,
    patch: &MessagePatch,
) -> (Outcome, Vec<UiEvent>) {
    match cache.patch(patch) {
        Some(chat_id) => (
            Outcome::Applied,
            vec![UiEvent::MessagePatched {
                chat_id,
                message_id: patch.id.clone(),
            }],
        ),
        None => {
            debug!("patch for unknown message {}", patch.id);
            (Outcome::Ignored, Vec::new())
        }
    }
}

/// Apply a conversation patch: merge sentiment, summary, suggestions and the
/// AI-assist flag. Unread count and ordering are unaffected.
pub fn apply_chat_patch(directory: &mut Directory, patch: &ChatPatch) -> (Outcome, Vec<UiEvent>) {
    let Some(conv) = directory.get_mut(&patch.chat_id) else {
        debug!("chat patch references unknown chat {}", patch.chat_id);
        return (Outcome::NeedsRefresh, Vec::new());
    };
    if let Some(sentiment) = &patch.sentiment {
        conv.sentiment = Some(sentiment.clone());
    }
    if let Some(summary) = &patch.summary {
        conv.summary = Some(summary.clone());
    }
    if let Some(suggestions) = &patch.suggestions {
        conv.suggestions = suggestions.clone();
    }
    if let Some(ai_enabled) = patch.ai_enabled {
        conv.ai_enabled = ai_enabled;
    }
    (
        Outcome::Applied,
        vec![UiEvent::ConversationUpdated {
            chat_id: patch.chat_id.clone(),
        }],
    )
}
