//! Telegram Bot API front-end.
//!
//! - [`client`]: HTTP client for the Bot API (`getUpdates`, `getFile`,
//!   `sendMessage`, `sendDocument`).
//! - [`dispatcher`]: long-polling loop that turns updates into
//!   [`InboundEvent`]s and hands documents to the conversion pipeline.
//! - [`types`]: wire types for the subset of the Bot API used here.
//!
//! The pipeline only sees the [`ChatGateway`] trait, never the client.

pub mod client;
pub mod dispatcher;
pub mod types;

pub use client::TelegramClient;
pub use dispatcher::Dispatcher;

use async_trait::async_trait;

use crate::Result;

/// Chat identifier as used by the Bot API.
pub type ChatId = i64;

/// A document attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentDescriptor {
    /// Original filename as sent by the user (may be empty).
    pub file_name: String,
    /// Remote file identifier, resolved to a download URL via [`ChatGateway::file_url`].
    pub file_id: String,
}

/// Platform-neutral view of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub chat_id: ChatId,
    /// Bot command without the leading slash or `@botname` suffix.
    pub command: Option<String>,
    pub document: Option<DocumentDescriptor>,
}

/// Outbound side of the chat platform.
#[async_trait]
pub trait ChatGateway: Send + Sync {
    /// Send a plain-text message.
    async fn send_text(&self, chat_id: ChatId, text: &str) -> Result<()>;

    /// Send a named byte blob as a document attachment.
    async fn send_document(
        &self,
        chat_id: ChatId,
        file_name: &str,
        bytes: Vec<u8>,
        caption: Option<&str>,
    ) -> Result<()>;

    /// Resolve a remote file identifier to a URL the downloader can fetch.
    async fn file_url(&self, file_id: &str) -> Result<String>;
}
