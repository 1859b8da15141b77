//! Telegram Bot API client.
//!
//! Talks to `https://api.telegram.org/bot<token>/<method>` with JSON bodies,
//! except `sendDocument` which is a multipart upload. Every response is
//! decoded from the `{ok, result, description}` envelope.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde_json::json;
use tracing::debug;

use super::types::{ApiResponse, File, Update, User};
use super::{ChatGateway, ChatId};
use crate::api::MOBI_CONTENT_TYPE;
use crate::{Error, Result};

/// Default Bot API endpoint.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// Telegram `sendMessage` text limit (UTF-8 characters).
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Long-poll timeout for `getUpdates`, in seconds.
pub const LONG_POLL_TIMEOUT_SECS: u64 = 60;

/// Telegram Bot API client.
pub struct TelegramClient {
    token: String,
    base_url: String,
    client: Client,
}

impl TelegramClient {
    /// Create a client for the public Bot API.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_base_url(token, TELEGRAM_API_BASE)
    }

    /// Create a client against a custom Bot API server.
    pub fn with_base_url(token: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    fn method_url(&self, method: &str) -> String {
        format!("{}/bot{}/{}", self.base_url, self.token, method)
    }

    /// Download URL for a `file_path` returned by `getFile`.
    pub fn file_download_url(&self, file_path: &str) -> String {
        format!("{}/file/bot{}/{}", self.base_url, self.token, file_path)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        payload: &serde_json::Value,
        timeout: Option<Duration>,
    ) -> Result<T> {
        let mut request = self.client.post(self.method_url(method)).json(payload);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }

        let response = request
            .send()
            .await
            .map_err(|e| Error::telegram(format!("{} request failed: {}", method, e)))?;

        let envelope: ApiResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::telegram(format!("{} returned malformed body: {}", method, e)))?;
        envelope.into_result(method)
    }

    /// Identity of the bot behind the token.
    pub async fn get_me(&self) -> Result<User> {
        self.call("getMe", &json!({}), None).await
    }

    /// Long-poll for updates with `update_id >= offset`.
    pub async fn get_updates(&self, offset: i64) -> Result<Vec<Update>> {
        let payload = json!({
            "offset": offset,
            "timeout": LONG_POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });
        // The HTTP timeout has to outlive the server-side long poll.
        let timeout = Duration::from_secs(LONG_POLL_TIMEOUT_SECS + 10);
        self.call("getUpdates", &payload, Some(timeout)).await
    }

    /// Resolve file metadata for a file identifier.
    pub async fn get_file(&self, file_id: &str) -> Result<File> {
        self.call("getFile", &json!({ "file_id": file_id }), None)
            .await
    }

    /// Send a text message, truncated to the Bot API limit.
    pub async fn send_message(&self, chat_id: ChatId, text: &str) -> Result<()> {
        let payload = json!({
            "chat_id": chat_id,
            "text": truncate_message(text, TELEGRAM_MESSAGE_LIMIT),
        });
        let _: serde_json::Value = self.call("sendMessage", &payload, None).await?;
        debug!(chat_id, "Telegram message sent");
        Ok(())
    }

    /// Upload a document from memory.
    pub async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        let size = bytes.len();
        let part = Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(MOBI_CONTENT_TYPE)?;

        let mut form = Form::new()
            .text("chat_id", chat_id.to_string())
            .part("document", part);
        if let Some(caption) = caption {
            form = form.text("caption", caption.to_string());
        }

        let response = self
            .client
            .post(self.method_url("sendDocument"))
            .multipart(form)
            .send()
            .await
            .map_err(|e| Error::telegram(format!("sendDocument request failed: {}", e)))?;

        let envelope: ApiResponse<serde_json::Value> = response.json().await.map_err(|e| {
            Error::telegram(format!("sendDocument returned malformed body: {}", e))
        })?;
        envelope.into_result("sendDocument")?;

        debug!(chat_id, file_name, size, "Telegram document sent");
        Ok(())
    }
}

#[async_trait]
impl ChatGateway for TelegramClient {
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()> {
        self.send_message(chat_id, text).await
    }

    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()> {
        TelegramClient::send_document(self, chat_id, file_name, bytes, caption).await
    }

    async fn file_url(&self, file_id: &str) -> Result<String> {
        let file = self.get_file(file_id).await?;
        let path = file
            .file_path
            .ok_or_else(|| Error::telegram(format!("file {} has no download path", file_id)))?;
        Ok(self.file_download_url(&path))
    }
}

/// Truncate a message to fit within the Telegram character limit.
fn truncate_message(text: &str, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text.to_string();
    }
    let suffix = "\n\n[truncated]";
    let budget = limit - suffix.len();
    let truncated: String = text.chars().take(budget).collect();
    format!("{truncated}{suffix}")
}
