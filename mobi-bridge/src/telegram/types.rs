//! Bot API wire types (only the fields this bot reads).

use serde::Deserialize;

use super::{DocumentDescriptor, InboundEvent};
use crate::{Error, Result};

/// Response envelope shared by every Bot API method.
#[derive(Debug, Deserialize)]
pub struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<i64>,
}

impl<T> ApiResponse<T> {
    /// Unwrap the envelope, mapping `ok: false` to [`Error::Telegram`].
    pub fn into_result(self, method: &str) -> Result<T> {
        if !self.ok {
            return Err(Error::telegram(format!(
                "{} failed ({}): {}",
                method,
                self.error_code.unwrap_or_default(),
                self.description.unwrap_or_else(|| "no description".to_string())
            )));
        }
        self.result
            .ok_or_else(|| Error::telegram(format!("{} returned no result", method)))
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub first_name: String,
    pub username: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Document {
    pub file_id: String,
    pub file_name: Option<String>,
    pub mime_type: Option<String>,
    pub file_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub text: Option<String>,
    pub document: Option<Document>,
}

impl Message {
    /// Bot command carried by the message text, e.g. `start` for `/start@my_bot arg`.
    pub fn command(&self) -> Option<String> {
        let text = self.text.as_deref()?.trim_start();
        let word = text.strip_prefix('/')?.split_whitespace().next()?;
        let name = word.split('@').next().unwrap_or(word);
        if name.is_empty() {
            None
        } else {
            Some(name.to_string())
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

impl Update {
    /// Project the update onto an [`InboundEvent`]; updates without a message yield `None`.
    pub fn into_event(self) -> Option<InboundEvent> {
        let message = self.message?;
        let command = message.command();
        let document = message.document.map(|doc| DocumentDescriptor {
            file_name: doc.file_name.unwrap_or_default(),
            file_id: doc.file_id,
        });
        Some(InboundEvent {
            chat_id: message.chat.id,
            command,
            document,
        })
    }
}

/// Result of `getFile`.
#[derive(Debug, Clone, Deserialize)]
pub struct File {
    pub file_id: String,
    pub file_size: Option<u64>,
    pub file_path: Option<String>,
}
