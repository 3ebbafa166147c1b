/// Shared test support: an in-memory backend standing in for the REST layer
use async_trait::async_trait;
use deskline_core::backend::{Backend, MediaUpload, OutgoingPayload};
use deskline_core::error::{Result, SyncError};
use deskline_core::types::{Conversation, Message, MessageContent};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, Notify};

#[derive(Default)]
pub struct FakeBackend {
    /// Snapshot returned by fetch_conversations
    pub snapshot: Mutex<Vec<Conversation>>,
    /// Histories returned by fetch_messages, keyed by chat id
    pub histories: Mutex<HashMap<String, Vec<Message>>>,
    /// Per-chat gates: fetch_messages blocks until the gate is notified
    pub gates: Mutex<HashMap<String, Arc<Notify>>>,
    /// Echo sends back as persisted records (vs omitting the echo)
    pub echo_sends: bool,
    pub fail_sends: bool,
    pub fail_toggles: bool,
    /// Every payload submitted through send_message
    pub sent: Mutex<Vec<(String, OutgoingPayload)>>,
    pub send_counter: AtomicU64,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            echo_sends: true,
            ..Self::default()
        }
    }

    pub async fn set_snapshot(&self, records: Vec<Conversation>) {
        *self.snapshot.lock().await = records;
    }

    pub async fn set_history(&self, chat_id: &str, messages: Vec<Message>) {
        self.histories
            .lock()
            .await
            .insert(chat_id.to_string(), messages);
    }

    /// Make the next fetch_messages for `chat_id` block until released
    pub async fn gate(&self, chat_id: &str) -> Arc<Notify> {
        let notify = Arc::new(Notify::new());
        self.gates
            .lock()
            .await
            .insert(chat_id.to_string(), notify.clone());
        notify
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let gate = self.gates.lock().await.get(chat_id).cloned();
        if let Some(gate) = gate {
            gate.notified().await;
        }
        Ok(self
            .histories
            .lock()
            .await
            .get(chat_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_message(
        &self,
        chat_id: &str,
        payload: &OutgoingPayload,
        quoted_id: Option<&str>,
    ) -> Result<Option<Message>> {
        if self.fail_sends {
            return Err(SyncError::Send("backend rejected the message".to_string()));
        }
        self.sent
            .lock()
            .await
            .push((chat_id.to_string(), payload.clone()));
        if !self.echo_sends {
            return Ok(None);
        }
        let n = self.send_counter.fetch_add(1, Ordering::SeqCst);
        let content = match payload {
            OutgoingPayload::Text { body } => MessageContent::Text { body: body.clone() },
            OutgoingPayload::Media { url, mime, caption, .. } => MessageContent::Media {
                url: url.clone(),
                mime: mime.clone(),
                caption: caption.clone(),
            },
        };
        Ok(Some(Message {
            id: format!("srv-{}", n),
            alt_id: None,
            chat_id: chat_id.to_string(),
            from_me: true,
            timestamp: 1_700_000_100_000 + n as i64,
            content,
            quoted_id: quoted_id.map(|q| q.to_string()),
            reactions: Vec::new(),
        }))
    }

    async fn upload_media(&self, file_name: &str, _data: Vec<u8>) -> Result<MediaUpload> {
        Ok(MediaUpload {
            url: format!("https://fake.test/media/{}", file_name),
            mime: "image/jpeg".to_string(),
        })
    }

    async fn set_ai_enabled(&self, _chat_id: &str, _enabled: bool) -> Result<()> {
        if self.fail_toggles {
            return Err(SyncError::Send("toggle rejected".to_string()));
        }
        Ok(())
    }

    async fn set_archived(&self, _chat_id: &str, _archived: bool) -> Result<()> {
        if self.fail_toggles {
            return Err(SyncError::Send("toggle rejected".to_string()));
        }
        Ok(())
    }
}

pub fn conv(chat_id: &str, phone: Option<&str>, name: &str, ts: i64) -> Conversation {
    Conversation {
        chat_id: chat_id.to_string(),
        phone: phone.map(|p| p.to_string()),
        name: name.to_string(),
        last_message: String::new(),
        last_timestamp: ts,
        unread: 0,
        archived: false,
        is_group: false,
        ai_enabled: false,
        sentiment: None,
        summary: None,
        suggestions: Vec::new(),
    }
}

pub fn text_msg(id: &str, chat_id: &str, body: &str, ts: i64) -> Message {
    Message {
        id: id.to_string(),
        alt_id: None,
        chat_id: chat_id.to_string(),
        from_me: false,
        timestamp: ts,
        content: MessageContent::Text {
            body: body.to_string(),
        },
        quoted_id: None,
        reactions: Vec::new(),
    }
}

/// Wire frame for a message:new push event
pub fn new_message_frame(id: &str, chat_id: &str, body: &str, ts: i64) -> String {
    format!(
        r#"{{"event":"message:new","data":{{"message":{{"id":"{}","chatId":"{}","fromMe":false,"timestamp":{},"content":"{}","type":"text"}}}}}}"#,
        id, chat_id, ts, body
    )
}
