//! Downloader error types.

use thiserror::Error;

use vconv_queue::QueueError;
use vconv_telegram::TelegramError;

pub type DownloaderResult<T> = Result<T, DownloaderError>;

#[derive(Debug, Error)]
pub enum DownloaderError {
    #[error("Malformed work item: {0}")]
    MalformedItem(#[source] serde_json::Error),

    #[error("Work item has neither a link nor an attachment")]
    MissingAttachment,

    #[error("Download of {url} failed with HTTP {status}")]
    UnclassifiedStatus { url: String, status: u16 },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Queue error: {0}")]
    Queue(#[from] QueueError),

    #[error("Messaging error: {0}")]
    Messaging(#[from] TelegramError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DownloaderError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    pub fn unclassified_status(url: impl Into<String>, status: u16) -> Self {
        Self::UnclassifiedStatus {
            url: url.into(),
            status,
        }
    }

    /// Short label for logs and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            DownloaderError::MalformedItem(_) => "malformed_item",
            DownloaderError::MissingAttachment => "missing_attachment",
            DownloaderError::UnclassifiedStatus { .. } => "unclassified_status",
            DownloaderError::Config(_) => "config",
            DownloaderError::Http(_) => "http",
            DownloaderError::Queue(_) => "queue",
            DownloaderError::Messaging(_) => "messaging",
            DownloaderError::Json(_) => "json",
            DownloaderError::Io(_) => "io",
        }
    }
}
