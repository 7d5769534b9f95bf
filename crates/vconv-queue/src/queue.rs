//! Queue trait and configuration.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::QueueResult;

/// Queue configuration.
#[derive(Debug, Clone)]
pub struct QueueConfig {
    /// Redis URL
    pub redis_url: String,
    /// Consumer group shared by all downloader instances
    pub consumer_group: String,
    /// Stream that receives items exceeding `max_receive_count`
    pub dead_letter_stream: String,
    /// Deliveries allowed before an item is dead-lettered
    pub max_receive_count: u32,
    /// Idle time after which an unacknowledged item is redelivered
    pub visibility_timeout: Duration,
    /// How long a receive blocks waiting for new items
    pub receive_wait: Duration,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            redis_url: "redis://localhost:6379".to_string(),
            consumer_group: "vconv:downloaders".to_string(),
            dead_letter_stream: "vconv:downloader:dlq".to_string(),
            max_receive_count: 5,
            visibility_timeout: Duration::from_secs(300), // 5 minutes
            receive_wait: Duration::from_millis(1000),
        }
    }
}

impl QueueConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            redis_url: std::env::var("REDIS_URL").unwrap_or(defaults.redis_url),
            consumer_group: std::env::var("QUEUE_CONSUMER_GROUP")
                .unwrap_or(defaults.consumer_group),
            dead_letter_stream: std::env::var("DOWNLOADER_DLQ")
                .unwrap_or(defaults.dead_letter_stream),
            max_receive_count: std::env::var("QUEUE_MAX_RECEIVE_COUNT")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_receive_count),
            visibility_timeout: std::env::var("QUEUE_VISIBILITY_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.visibility_timeout),
            receive_wait: std::env::var("QUEUE_RECEIVE_WAIT_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.receive_wait),
        }
    }

    /// Whether an item already delivered `times_delivered` times must go to
    /// the dead-letter stream instead of being handed out again.
    pub fn should_dead_letter(&self, times_delivered: u32) -> bool {
        times_delivered >= self.max_receive_count
    }
}

/// A message handed out by `WorkQueue::receive`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceivedItem {
    /// Handle used to delete the item once it is fully processed
    pub receipt: String,
    /// Raw JSON body
    pub body: String,
    /// How many times this item has been delivered, this delivery included
    pub receive_count: u32,
}

/// At-least-once work queue.
///
/// Items that are received but never deleted become visible again once the
/// backend's visibility timeout expires.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    /// Receive at most one item from `queue`.
    async fn receive(&self, queue: &str) -> QueueResult<Option<ReceivedItem>>;

    /// Permanently remove a received item.
    async fn delete(&self, queue: &str, receipt: &str) -> QueueResult<()>;

    /// Append a message to `queue`, returning its id.
    async fn send(&self, queue: &str, body: &str) -> QueueResult<String>;
}
