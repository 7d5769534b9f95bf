//! Status message updates.

use std::sync::Arc;

use tracing::debug;

use vconv_models::StatusMessageRef;
use vconv_telegram::MessagingClient;

use crate::error::DownloaderResult;

/// Edits the requester's status message at each lifecycle milestone.
pub struct StatusNotifier {
    messaging: Arc<dyn MessagingClient>,
}

impl StatusNotifier {
    pub fn new(messaging: Arc<dyn MessagingClient>) -> Self {
        Self { messaging }
    }

    /// Replace the status message text.
    pub async fn update(&self, status: StatusMessageRef, text: &str) -> DownloaderResult<()> {
        debug!(
            chat_id = status.chat_id,
            message_id = status.message_id,
            text = text,
            "Updating status message"
        );
        self.messaging.edit_status(status, text).await?;
        Ok(())
    }
}
