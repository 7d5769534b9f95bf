//! Converter handoff descriptors.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::message::PlatformMessage;
use crate::work_item::WorkItem;

/// Payload published to the converter queue after a successful download.
///
/// The converter owns `local_file_path` from here on; the downloader never
/// removes a file it has handed off.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HandoffDescriptor {
    pub received_message: PlatformMessage,
    pub sent_message: PlatformMessage,
    /// Where the downloaded bytes live
    pub local_file_path: PathBuf,
    /// Source link, or the attachment's file name
    pub link_or_file_name: Option<String>,
}

impl HandoffDescriptor {
    /// Build a descriptor for a fetched work item.
    pub fn new(
        item: &WorkItem,
        local_file_path: impl AsRef<Path>,
        link_or_file_name: Option<String>,
    ) -> Self {
        Self {
            received_message: item.received_message.clone(),
            sent_message: item.sent_message.clone(),
            local_file_path: local_file_path.as_ref().to_path_buf(),
            link_or_file_name,
        }
    }

    /// Serialize for the queue.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_wire_shape() {
        let item = WorkItem {
            received_message: PlatformMessage::new(5, 1),
            sent_message: PlatformMessage::new(5, 2),
            link_or_file_name: None,
        };

        let descriptor = HandoffDescriptor::new(&item, "/tmp/abc.webm", None);
        let value: serde_json::Value = serde_json::from_str(&descriptor.to_json().unwrap()).unwrap();

        assert_eq!(
            value,
            json!({
                "receivedMessage": { "message_id": 1, "chat": { "id": 5 } },
                "sentMessage": { "message_id": 2, "chat": { "id": 5 } },
                "localFilePath": "/tmp/abc.webm",
                "linkOrFileName": null
            })
        );
    }
}
