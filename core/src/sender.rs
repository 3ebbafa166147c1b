/// Send Coordinator: composing operator drafts into backend payloads
use crate::backend::{MediaUpload, OutgoingPayload};
use crate::error::{Result, SyncError};
use crate::types::{Message, MessageContent};
use uuid::Uuid;

/// Operator-composed content before submission
#[derive(Debug, Clone, Default)]
pub struct Draft {
    pub text: Option<String>,
    pub media: Option<MediaDraft>,
    /// Identifier of the message being replied to
    pub quoted_id: Option<String>,
}

/// A media attachment pending upload
#[derive(Debug, Clone)]
pub struct MediaDraft {
    pub file_name: String,
    pub data: Vec<u8>,
    /// View-once treatment
    pub one_time: bool,
    /// Animated-image treatment (e.g. GIF-style playback)
    pub animated: bool,
}

impl Draft {
    pub fn text(body: impl Into<String>) -> Self {
        Self {
            text: Some(body.into()),
            ..Draft::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.media.is_none() && self.text.as_deref().map_or(true, |t| t.is_empty())
    }
}

/// Build the submission payload. With a media attachment the upload result
/// supplies the reference URL and MIME type and the draft text becomes the
/// caption; otherwise the draft is a plain text payload.
pub fn build_payload(draft: &Draft, upload: Option<MediaUpload>) -> Result<OutgoingPayload> {
    if draft.is_empty() {
        return Err(SyncError::Send("empty draft".to_string()));
    }
    match (&draft.media, upload) {
        (Some(media), Some(upload)) => Ok(OutgoingPayload::Media {
            url: upload.url,
            mime: upload.mime,
            caption: draft.text.clone().filter(|t| !t.is_empty()),
            one_time: media.one_time,
            animated: media.animated,
        }),
        (Some(_), None) => Err(SyncError::Send("media draft without upload".to_string())),
        (None, _) => Ok(OutgoingPayload::Text {
            body: draft.text.clone().unwrap_or_default(),
        }),
    }
}

/// Synthesize a minimal local record when the backend omits an echo
pub fn synthesize_local(
    chat_id: &str,
    payload: &OutgoingPayload,
    quoted_id: Option<String>,
) -> Message {
    let content = match payload {
        OutgoingPayload::Text { body } => MessageContent::Text { body: body.clone() },
        OutgoingPayload::Media { url, mime, caption, .. } => MessageContent::Media {
            url: url.clone(),
            mime: mime.clone(),
            caption: caption.clone(),
        },
    };
    Message {
        id: format!("local-{}", Uuid::new_v4()),
        alt_id: None,
        chat_id: chat_id.to_string(),
        from_me: true,
        timestamp: chrono::Utc::now().timestamp_millis(),
        content,
        quoted_id,
        reactions: Vec::new(),
    }
}
