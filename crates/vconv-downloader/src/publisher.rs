//! Converter handoff.

use std::sync::Arc;

use tracing::info;

use vconv_models::HandoffDescriptor;
use vconv_queue::WorkQueue;

use crate::error::DownloaderResult;

/// Publishes handoff descriptors to the converter queue.
pub struct HandoffPublisher {
    queue: Arc<dyn WorkQueue>,
    destination: String,
}

impl HandoffPublisher {
    pub fn new(queue: Arc<dyn WorkQueue>, destination: impl Into<String>) -> Self {
        Self {
            queue,
            destination: destination.into(),
        }
    }

    /// Enqueue a descriptor, returning the destination message id.
    pub async fn publish(&self, descriptor: &HandoffDescriptor) -> DownloaderResult<String> {
        let body = descriptor.to_json()?;
        let message_id = self.queue.send(&self.destination, &body).await?;

        info!(
            queue = %self.destination,
            message_id = %message_id,
            path = %descriptor.local_file_path.display(),
            "Handed off to converter"
        );
        Ok(message_id)
    }
}
