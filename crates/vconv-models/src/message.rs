//! Platform message types.
//!
//! Only the fields the downloader reads are typed. Everything else is kept in
//! `extra` so a message survives the trip to the converter queue unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Chat a message belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// File attached to an inbound message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Platform file identifier used to resolve the download path
    #[serde(alias = "fileId")]
    pub file_id: String,
    /// Original file name, if the sender provided one
    #[serde(default, alias = "fileName", skip_serializing_if = "Option::is_none")]
    pub file_name: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A chat message as delivered by the messaging platform.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlatformMessage {
    #[serde(alias = "messageId")]
    pub message_id: i32,
    pub chat: Chat,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub document: Option<Document>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl PlatformMessage {
    /// Build a bare message with no attachment.
    pub fn new(chat_id: i64, message_id: i32) -> Self {
        Self {
            message_id,
            chat: Chat {
                id: chat_id,
                extra: Map::new(),
            },
            document: None,
            extra: Map::new(),
        }
    }

    /// Attach a document reference.
    pub fn with_document(mut self, file_id: impl Into<String>, file_name: Option<String>) -> Self {
        self.document = Some(Document {
            file_id: file_id.into(),
            file_name,
            extra: Map::new(),
        });
        self
    }
}
