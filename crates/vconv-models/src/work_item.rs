//! Downloader work items.

use serde::{Deserialize, Serialize};

use crate::message::{Document, PlatformMessage};

/// Identity of an editable status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StatusMessageRef {
    pub chat_id: i64,
    pub message_id: i32,
}

impl From<&PlatformMessage> for StatusMessageRef {
    fn from(msg: &PlatformMessage) -> Self {
        Self {
            chat_id: msg.chat.id,
            message_id: msg.message_id,
        }
    }
}

/// Where the bytes for a work item come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource<'a> {
    /// Remote link supplied by the requester
    Url(&'a str),
    /// File attached to the inbound message
    Attachment,
}

/// Unit of work read from the downloader queue.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkItem {
    /// The requester's original message
    pub received_message: PlatformMessage,
    /// The status message the bot already sent back
    pub sent_message: PlatformMessage,
    /// Link to download, absent for attachments
    #[serde(default)]
    pub link_or_file_name: Option<String>,
}

impl WorkItem {
    /// Parse a queue payload.
    pub fn from_json(body: &str) -> serde_json::Result<Self> {
        serde_json::from_str(body)
    }

    /// Route by link presence. Only a missing or empty link means attachment.
    pub fn source(&self) -> FetchSource<'_> {
        match self.link_or_file_name.as_deref().filter(|link| !link.is_empty()) {
            Some(link) => FetchSource::Url(link),
            None => FetchSource::Attachment,
        }
    }

    /// Status message to edit while this item is processed.
    pub fn status_ref(&self) -> StatusMessageRef {
        StatusMessageRef::from(&self.sent_message)
    }

    /// Attachment carried by the original message, if any.
    pub fn attachment(&self) -> Option<&Document> {
        self.received_message.document.as_ref()
    }

    /// Text prefix used in every status line.
    pub fn status_label(&self) -> &str {
        self.link_or_file_name.as_deref().unwrap_or_default()
    }
}
