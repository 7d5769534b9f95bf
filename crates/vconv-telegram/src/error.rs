//! Telegram client error types.

use thiserror::Error;

pub type TelegramResult<T> = Result<T, TelegramError>;

#[derive(Debug, Error)]
pub enum TelegramError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bot API request failed: {0}")]
    Request(#[from] teloxide::RequestError),

    #[error("File download failed: {0}")]
    Download(#[from] teloxide::DownloadError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl TelegramError {
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// The Bot API rejects edits that would not change the message.
    pub fn is_not_modified(&self) -> bool {
        matches!(
            self,
            TelegramError::Request(teloxide::RequestError::Api(
                teloxide::ApiError::MessageNotModified
            ))
        )
    }
}
