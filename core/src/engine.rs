/// Sync engine: ties directory, cache, selection, backend and event fan-out
/// together behind one clonable handle
use crate::backend::Backend;
use crate::cache::MessageCache;
use crate::directory::Directory;
use crate::error::{Result, SyncError};
use crate::events::{PushEvent, SenderInfo};
use crate::reconciler::{self, default_filter, MessageFilter, Outcome};
use crate::selection::SelectionCell;
use crate::sender::{self, Draft};
use crate::store::ClientStore;
use crate::types::{Conversation, Message, Selection, UiEvent};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tracing::{debug, error, info, warn};

const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Directory and cache live behind a single lock so every mutation is an
/// atomic replace-or-merge; a render scheduled between two handler
/// invocations never observes partial state.
#[derive(Default)]
struct EngineState {
    directory: Directory,
    cache: MessageCache,
}

pub struct SyncEngine {
    state: Arc<RwLock<EngineState>>,
    selection: SelectionCell,
    backend: Arc<dyn Backend>,
    filter: MessageFilter,
    events: broadcast::Sender<UiEvent>,
    store: Option<ClientStore>,
}

impl SyncEngine {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Arc::new(RwLock::new(EngineState::default())),
            selection: SelectionCell::new(),
            backend,
            filter: default_filter(),
            events,
            store: None,
        }
    }

    /// Attach the local store (credential, notes)
    pub fn with_store(mut self, store: ClientStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Replace the protocol-metadata drop predicate
    pub fn with_filter(mut self, filter: MessageFilter) -> Self {
        self.filter = filter;
        self
    }

    /// Subscribe to view-layer events
    pub fn subscribe(&self) -> broadcast::Receiver<UiEvent> {
        self.events.subscribe()
    }

    /// Snapshot of the ordered conversation directory
    pub async fn conversations(&self) -> Vec<Conversation> {
        self.state.read().await.directory.entries().to_vec()
    }

    /// Cached message list for a conversation (possibly empty)
    pub async fn messages_for(&self, chat_id: &str) -> Vec<Message> {
        self.state
            .read()
            .await
            .cache
            .get(chat_id)
            .map(|m| m.to_vec())
            .unwrap_or_default()
    }

    /// Message list of the active conversation: always a read of the cache
    /// for the selected identifier
    pub async fn active_messages(&self) -> Vec<Message> {
        match self.selection.get().await {
            Some(sel) => self.messages_for(&sel.chat_id).await,
            None => Vec::new(),
        }
    }

    pub async fn current_selection(&self) -> Option<Selection> {
        self.selection.get().await
    }

    /// Fetch a full conversation snapshot and replace the directory.
    ///
    /// The selected conversation's unread count is re-zeroed afterwards so
    /// the local reset survives snapshot replacement.
    pub async fn refresh_all(&self) -> Result<()> {
        let records = match self.backend.fetch_conversations().await {
            Ok(records) => records,
            Err(e) => return Err(self.intercept_auth(e).await),
        };
        let selection = self.selection.get().await;
        let count = {
            let mut state = self.state.write().await;
            state.directory.replace(records);
            if let Some(sel) = &selection {
                if let Some(conv) = state.directory.get_mut(&sel.chat_id) {
                    conv.unread = 0;
                }
            }
            state.directory.len()
        };
        info!("directory refreshed ({} conversations)", count);
        self.emit(UiEvent::DirectoryRefreshed);
        Ok(())
    }

    /// Apply one push event in arrival order.
    ///
    /// Events referencing an unknown conversation fall back to a full
    /// refresh instead of failing; the refresh picks the conversation up.
    pub async fn handle_event(&self, event: PushEvent) -> Result<Outcome> {
        let outcome = match event {
            PushEvent::NewMessage { message } => {
                let (message, sender) = message.into_parts();
                // Selection is read fresh at handling time, never captured
                let selection = self.selection.get().await;
                let mut guard = self.state.write().await;
                let state = &mut *guard;
                let (outcome, events) = reconciler::apply_new_message(
                    &mut state.directory,
                    &mut state.cache,
                    selection.as_ref(),
                    message,
                    &sender,
                    &self.filter,
                );
                drop(guard);
                self.emit_all(events);
                outcome
            }
            PushEvent::MessageUpdate(patch) => {
                let mut state = self.state.write().await;
                let (outcome, events) = reconciler::apply_message_patch(&mut state.cache, &patch);
                drop(state);
                self.emit_all(events);
                outcome
            }
            PushEvent::ChatUpdate { chat } => {
                let mut state = self.state.write().await;
                let (outcome, events) = reconciler::apply_chat_patch(&mut state.directory, &chat);
                drop(state);
                self.emit_all(events);
                outcome
            }
        };

        if outcome == Outcome::NeedsRefresh {
            self.refresh_all().await?;
        }
        Ok(outcome)
    }

    /// Make a conversation active.
    ///
    /// The selection cell is written before any network round-trip so
    /// concurrently-scheduled handlers attribute events correctly. The
    /// cached message list is returned immediately (cache-first); a
    /// background fetch then reconciles against server truth, and its
    /// response is discarded if the selection has moved on meanwhile.
    /// The unread reset is local only and never propagated to the backend.
    pub async fn select(&self, chat_id: &str) -> Result<Vec<Message>> {
        let phone = {
            let state = self.state.read().await;
            let Some(conv) = state.directory.get(chat_id) else {
                return Err(SyncError::UnknownConversation(chat_id.to_string()));
            };
            conv.phone.clone()
        };

        self.selection
            .set(Some(Selection {
                chat_id: chat_id.to_string(),
                phone,
            }))
            .await;

        let cached = {
            let mut state = self.state.write().await;
            if let Some(conv) = state.directory.get_mut(chat_id) {
                conv.unread = 0;
            }
            state
                .cache
                .get(chat_id)
                .map(|m| m.to_vec())
                .unwrap_or_default()
        };

        self.emit(UiEvent::SelectionChanged {
            chat_id: Some(chat_id.to_string()),
        });
        self.emit(UiEvent::ConversationUpdated {
            chat_id: chat_id.to_string(),
        });

        let engine = self.clone();
        let chat_id = chat_id.to_string();
        tokio::spawn(async move {
            engine.refresh_history(&chat_id).await;
        });

        Ok(cached)
    }

    /// Clear the active conversation
    pub async fn deselect(&self) {
        self.selection.set(None).await;
        self.emit(UiEvent::SelectionChanged { chat_id: None });
    }

    /// Background history fetch issued by `select`
    async fn refresh_history(&self, chat_id: &str) {
        match self.backend.fetch_messages(chat_id).await {
            Ok(messages) => {
                // A late response for a conversation that is no longer
                // selected must not overwrite newer state
                if !self.selection.is_selected(chat_id).await {
                    debug!("discarding stale history fetch for {}", chat_id);
                    return;
                }
                self.state.write().await.cache.replace(chat_id, messages);
                self.emit(UiEvent::MessagesRefreshed {
                    chat_id: chat_id.to_string(),
                });
            }
            Err(e) => {
                let e = self.intercept_auth(e).await;
                warn!("history fetch for {} failed: {}", chat_id, e);
            }
        }
    }

    /// Send an operator-composed draft.
    ///
    /// Media uploads first; the resulting message (server echo, or a local
    /// synthesized record when the backend omits one) runs through the same
    /// deduplicating reconciliation path as inbound events. Failures are
    /// surfaced as a diagnostic event; there is no automatic retry and no
    /// rollback of an already-completed upload.
    pub async fn send_draft(&self, chat_id: &str, draft: Draft) -> Result<Message> {
        let upload = match &draft.media {
            Some(media) => {
                match self
                    .backend
                    .upload_media(&media.file_name, media.data.clone())
                    .await
                {
                    Ok(upload) => Some(upload),
                    Err(e) => return Err(self.report_send_failure(chat_id, e).await),
                }
            }
            None => None,
        };

        let payload = sender::build_payload(&draft, upload)?;
        let echo = match self
            .backend
            .send_message(chat_id, &payload, draft.quoted_id.as_deref())
            .await
        {
            Ok(echo) => echo,
            Err(e) => return Err(self.report_send_failure(chat_id, e).await),
        };

        let message =
            echo.unwrap_or_else(|| sender::synthesize_local(chat_id, &payload, draft.quoted_id));

        let selection = self.selection.get().await;
        {
            let mut guard = self.state.write().await;
            let state = &mut *guard;
            let (_, events) = reconciler::apply_new_message(
                &mut state.directory,
                &mut state.cache,
                selection.as_ref(),
                message.clone(),
                &SenderInfo::default(),
                &self.filter,
            );
            drop(guard);
            self.emit_all(events);
        }
        Ok(message)
    }

    /// Toggle AI-assist: applied optimistically, rolled back on failure
    pub async fn set_ai_enabled(&self, chat_id: &str, enabled: bool) -> Result<()> {
        let previous = {
            let mut state = self.state.write().await;
            let Some(conv) = state.directory.get_mut(chat_id) else {
                return Err(SyncError::UnknownConversation(chat_id.to_string()));
            };
            let previous = conv.ai_enabled;
            conv.ai_enabled = enabled;
            previous
        };
        self.emit(UiEvent::ConversationUpdated {
            chat_id: chat_id.to_string(),
        });

        let engine = self.clone();
        let chat_id = chat_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = engine.backend.set_ai_enabled(&chat_id, enabled).await {
                let e = engine.intercept_auth(e).await;
                warn!("ai-assist toggle for {} failed, rolling back: {}", chat_id, e);
                if let Some(conv) = engine.state.write().await.directory.get_mut(&chat_id) {
                    conv.ai_enabled = previous;
                }
                engine.emit(UiEvent::ConversationUpdated { chat_id });
            }
        });
        Ok(())
    }

    /// Toggle the archived flag: applied optimistically, rolled back on
    /// failure. Archival is a flag, never removal from the directory.
    pub async fn set_archived(&self, chat_id: &str, archived: bool) -> Result<()> {
        let previous = {
            let mut state = self.state.write().await;
            let Some(conv) = state.directory.get_mut(chat_id) else {
                return Err(SyncError::UnknownConversation(chat_id.to_string()));
            };
            let previous = conv.archived;
            conv.archived = archived;
            previous
        };
        self.emit(UiEvent::ConversationUpdated {
            chat_id: chat_id.to_string(),
        });

        let engine = self.clone();
        let chat_id = chat_id.to_string();
        tokio::spawn(async move {
            if let Err(e) = engine.backend.set_archived(&chat_id, archived).await {
                let e = engine.intercept_auth(e).await;
                warn!("archive toggle for {} failed, rolling back: {}", chat_id, e);
                if let Some(conv) = engine.state.write().await.directory.get_mut(&chat_id) {
                    conv.archived = previous;
                }
                engine.emit(UiEvent::ConversationUpdated { chat_id });
            }
        });
        Ok(())
    }

    /// Free-text note for a conversation (local store)
    pub fn note(&self, chat_id: &str) -> Result<Option<String>> {
        self.store()?.note(chat_id)
    }

    pub fn set_note(&self, chat_id: &str, note: &str) -> Result<()> {
        self.store()?.set_note(chat_id, note)
    }

    fn store(&self) -> Result<&ClientStore> {
        self.store
            .as_ref()
            .ok_or_else(|| SyncError::Storage("no local store configured".to_string()))
    }

    /// Expired credentials force a sign-out: clear the stored credential and
    /// tell the view layer. The error is passed through for the caller.
    async fn intercept_auth(&self, e: SyncError) -> SyncError {
        if matches!(e, SyncError::Auth) {
            error!("credential expired, signing out");
            if let Some(store) = &self.store {
                if let Err(se) = store.clear_credential() {
                    warn!("failed to clear credential: {}", se);
                }
            }
            self.emit(UiEvent::SignedOut);
        }
        e
    }

    async fn report_send_failure(&self, chat_id: &str, e: SyncError) -> SyncError {
        let e = self.intercept_auth(e).await;
        error!("send to {} failed: {}", chat_id, e);
        self.emit(UiEvent::SendFailed {
            chat_id: chat_id.to_string(),
            reason: e.to_string(),
        });
        e
    }

    fn emit(&self, event: UiEvent) {
        // No subscribers is fine
        let _ = self.events.send(event);
    }

    fn emit_all(&self, events: Vec<UiEvent>) {
        for event in events {
            self.emit(event);
        }
    }
}

impl Clone for SyncEngine {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            selection: self.selection.clone(),
            backend: self.backend.clone(),
            filter: self.filter.clone(),
            events: self.events.clone(),
            store: self.store.clone(),
        }
    }
}
