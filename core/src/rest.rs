/// REST implementation of the backend contract
use crate::backend::{Backend, MediaUpload, OutgoingPayload};
use crate::config::Config;
use crate::error::{Result, SyncError};
use crate::events::WireMessage;
use crate::types::{Conversation, Message};
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

/// Conversation record as the snapshot endpoint delivers it
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRecord {
    pub chat_id: String,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub last_message: Option<String>,
    #[serde(default)]
    pub last_timestamp: Option<i64>,
    #[serde(default)]
    pub unread: u32,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub is_group: bool,
    #[serde(default)]
    pub ai_enabled: bool,
    #[serde(default)]
    pub sentiment: Option<String>,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub suggestions: Option<Vec<String>>,
}

impl ChatRecord {
    pub fn into_conversation(self) -> Conversation {
        let name = self
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| self.chat_id.split('@').next().unwrap_or_default().to_string());
        Conversation {
            chat_id: self.chat_id,
            phone: self.phone,
            name,
            last_message: self.last_message.unwrap_or_default(),
            last_timestamp: self.last_timestamp.unwrap_or_default(),
            unread: self.unread,
            archived: self.archived,
            is_group: self.is_group,
            ai_enabled: self.ai_enabled,
            sentiment: self.sentiment,
            summary: self.summary,
            suggestions: self.suggestions.unwrap_or_default(),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    payload: &'a OutgoingPayload,
    #[serde(skip_serializing_if = "Option::is_none")]
    quoted_id: Option<&'a str>,
}

#[derive(Deserialize)]
struct SendResponse {
    #[serde(default)]
    message: Option<WireMessage>,
}

#[derive(Serialize)]
struct ToggleRequest {
    enabled: bool,
}

pub struct RestClient {
    http: reqwest::Client,
    base: String,
    token: Option<String>,
}

impl RestClient {
    pub fn new(config: &Config, token: Option<String>) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;
        Ok(Self {
            http,
            base: config.api_base.clone(),
            token,
        })
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self.http.request(method, format!("{}{}", self.base, path));
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Central response check: an expired credential forces a sign-out, so
    /// 401 is mapped to `SyncError::Auth` here for every endpoint.
    fn check(response: reqwest::Response) -> Result<reqwest::Response> {
        if response.status() == StatusCode::UNAUTHORIZED {
            return Err(SyncError::Auth);
        }
        Ok(response.error_for_status()?)
    }
}

#[async_trait]
impl Backend for RestClient {
    async fn fetch_conversations(&self) -> Result<Vec<Conversation>> {
        let response = self.request(reqwest::Method::GET, "/chats").send().await?;
        let records: Vec<ChatRecord> = Self::check(response)?.json().await?;
        Ok(records.into_iter().map(ChatRecord::into_conversation).collect())
    }

    async fn fetch_messages(&self, chat_id: &str) -> Result<Vec<Message>> {
        let response = self
            .request(reqwest::Method::GET, &format!("/chats/{}/messages", chat_id))
            .send()
            .await?;
        let wire: Vec<WireMessage> = Self::check(response)?.json().await?;
        Ok(wire.into_iter().map(|m| m.into_parts().0).collect())
    }

    async fn send_message(
        &self,
        chat_id: &str,
        payload: &OutgoingPayload,
        quoted_id: Option<&str>,
    ) -> Result<Option<Message>> {
        let response = self
            .request(reqwest::Method::POST, &format!("/chats/{}/messages", chat_id))
            .json(&SendRequest { payload, quoted_id })
            .send()
            .await?;
        let body: SendResponse = Self::check(response)?.json().await?;
        Ok(body.message.map(|m| m.into_parts().0))
    }

    async fn upload_media(&self, file_name: &str, data: Vec<u8>) -> Result<MediaUpload> {
        let part = reqwest::multipart::Part::bytes(data).file_name(file_name.to_string());
        let form = reqwest::multipart::Form::new().part("file", part);
        let response = self
            .request(reqwest::Method::POST, "/media")
            .multipart(form)
            .send()
            .await?;
        Ok(Self::check(response)?.json().await?)
    }

    async fn set_ai_enabled(&self, chat_id: &str, enabled: bool) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/chats/{}/ai", chat_id))
            .json(&ToggleRequest { enabled })
            .send()
            .await?;
        Self::check(response)?;
        Ok(())
    }

    async fn set_archived(&self, chat_id: &str, archived: bool) -> Result<()> {
        let response = self
            .request(reqwest::Method::PUT, &format!("/chats/{}/archive", chat_id))
            .json(&ToggleRequest { enabled: archived })
            .send()
            .await?;
        Self::check(response)?;
        Ok(())
    }
}
