//! Telegram Bot API client.

use std::path::Path;

use async_trait::async_trait;
use teloxide::net::Download;
use teloxide::prelude::*;
use teloxide::types::{FileId, MessageId};
use tokio::io::AsyncWriteExt;
use tracing::debug;

use vconv_models::StatusMessageRef;

use crate::error::{TelegramError, TelegramResult};

/// Operations the downloader needs from the messaging platform.
#[async_trait]
pub trait MessagingClient: Send + Sync {
    /// Replace the text of an already sent message.
    ///
    /// Re-sending identical text succeeds without further effect.
    async fn edit_status(&self, status: StatusMessageRef, text: &str) -> TelegramResult<()>;

    /// Resolve an attachment and write its bytes to `dest`.
    ///
    /// Returns the number of bytes written.
    async fn download_attachment(&self, file_id: &str, dest: &Path) -> TelegramResult<u64>;
}

/// Telegram client configuration.
#[derive(Clone)]
pub struct TelegramConfig {
    /// Bot token
    pub token: String,
    /// Custom Bot API server, for self-hosted servers without the 20MB download cap
    pub api_url: Option<String>,
}

impl std::fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("token", &"<redacted>")
            .field("api_url", &self.api_url)
            .finish()
    }
}

impl TelegramConfig {
    /// Create config from environment variables.
    pub fn from_env() -> TelegramResult<Self> {
        let token = std::env::var("TELEGRAM_BOT_TOKEN")
            .map_err(|_| TelegramError::config("TELEGRAM_BOT_TOKEN is not set"))?;
        Ok(Self {
            token,
            api_url: std::env::var("TELEGRAM_API_URL").ok(),
        })
    }
}

/// `MessagingClient` backed by teloxide.
pub struct TelegramClient {
    bot: Bot,
}

impl TelegramClient {
    pub fn new(config: TelegramConfig) -> TelegramResult<Self> {
        let mut bot = Bot::new(config.token);
        if let Some(api_url) = config.api_url {
            let url = reqwest::Url::parse(&api_url)
                .map_err(|e| TelegramError::config(format!("invalid TELEGRAM_API_URL: {}", e)))?;
            bot = bot.set_api_url(url);
        }
        Ok(Self { bot })
    }

    pub fn from_env() -> TelegramResult<Self> {
        Self::new(TelegramConfig::from_env()?)
    }
}

#[async_trait]
impl MessagingClient for TelegramClient {
    async fn edit_status(&self, status: StatusMessageRef, text: &str) -> TelegramResult<()> {
        let result = self
            .bot
            .edit_message_text(ChatId(status.chat_id), MessageId(status.message_id), text)
            .await
            .map_err(TelegramError::from);

        match result {
            Ok(_) => Ok(()),
            Err(e) if e.is_not_modified() => {
                debug!(
                    chat_id = status.chat_id,
                    message_id = status.message_id,
                    "Status text unchanged, skipping edit"
                );
                Ok(())
            }
            Err(e) => Err(e),
        }
    }

    async fn download_attachment(&self, file_id: &str, dest: &Path) -> TelegramResult<u64> {
        let file = self.bot.get_file(FileId(file_id.to_owned())).await?;

        let mut dst = tokio::fs::File::create(dest).await?;
        self.bot.download_file(&file.path, &mut dst).await?;
        dst.flush().await?;

        let written = dst.metadata().await?.len();
        debug!(file_id = file_id, path = %dest.display(), bytes = written, "Downloaded attachment");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_modified_is_detected() {
        let err = TelegramError::from(teloxide::RequestError::Api(
            teloxide::ApiError::MessageNotModified,
        ));
        assert!(err.is_not_modified());

        let err = TelegramError::from(teloxide::RequestError::Api(
            teloxide::ApiError::MessageToEditNotFound,
        ));
        assert!(!err.is_not_modified());
    }

    #[test]
    fn test_config_debug_hides_token() {
        let config = TelegramConfig {
            token: "123:secret".to_string(),
            api_url: None,
        };
        assert!(!format!("{:?}", config).contains("secret"));
    }

    #[test]
    fn test_invalid_api_url_is_rejected() {
        let result = TelegramClient::new(TelegramConfig {
            token: "123:secret".to_string(),
            api_url: Some("not a url".to_string()),
        });
        assert!(matches!(result, Err(TelegramError::Config(_))));
    }
}
