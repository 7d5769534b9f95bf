//! Work queue using Redis Streams.
//!
//! Each message is a stream entry with a single `body` field. The receipt
//! handle is the entry id. Unacknowledged entries stay in the consumer
//! group's pending list and are reclaimed once idle for longer than the
//! visibility timeout.

use async_trait::async_trait;
use redis::streams::{StreamClaimReply, StreamId, StreamPendingCountReply, StreamReadReply};
use tracing::{debug, info, warn};

use crate::error::{QueueError, QueueResult};
use crate::queue::{QueueConfig, ReceivedItem, WorkQueue};

/// Stream entry field holding the JSON payload.
const BODY_FIELD: &str = "body";

/// Redis Streams work queue client.
pub struct RedisWorkQueue {
    client: redis::Client,
    config: QueueConfig,
    consumer_name: String,
}

impl RedisWorkQueue {
    /// Create a new queue client.
    pub fn new(config: QueueConfig, consumer_name: impl Into<String>) -> QueueResult<Self> {
        let client = redis::Client::open(config.redis_url.as_str())
            .map_err(|e| QueueError::connection_failed(format!("{}: {}", config.redis_url, e)))?;
        Ok(Self {
            client,
            config,
            consumer_name: consumer_name.into(),
        })
    }

    /// Create from environment variables.
    pub fn from_env(consumer_name: impl Into<String>) -> QueueResult<Self> {
        Self::new(QueueConfig::from_env(), consumer_name)
    }

    pub fn config(&self) -> &QueueConfig {
        &self.config
    }

    /// Create the consumer group on `stream` if it does not exist yet.
    ///
    /// The group starts at the beginning of the stream so items enqueued
    /// before the first worker came up are not skipped.
    pub async fn init(&self, stream: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let result: Result<(), redis::RedisError> = redis::cmd("XGROUP")
            .arg("CREATE")
            .arg(stream)
            .arg(&self.config.consumer_group)
            .arg("0")
            .arg("MKSTREAM")
            .query_async(&mut conn)
            .await;

        match result {
            Ok(_) => info!("Created consumer group {} on {}", self.config.consumer_group, stream),
            Err(e) if e.to_string().contains("BUSYGROUP") => {
                debug!("Consumer group already exists: {}", self.config.consumer_group);
            }
            Err(e) => return Err(QueueError::Redis(e)),
        }

        Ok(())
    }

    /// Number of entries in the dead-letter stream.
    pub async fn dead_letter_len(&self) -> QueueResult<u64> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        let len: u64 = redis::cmd("XLEN")
            .arg(&self.config.dead_letter_stream)
            .query_async(&mut conn)
            .await?;
        Ok(len)
    }

    /// Reclaim the oldest entry idle for longer than the visibility timeout.
    ///
    /// Entries over the redelivery limit are dead-lettered and skipped.
    async fn reclaim_idle(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        stream: &str,
    ) -> QueueResult<Option<ReceivedItem>> {
        let min_idle_ms = self.config.visibility_timeout.as_millis() as u64;

        loop {
            let pending: StreamPendingCountReply = redis::cmd("XPENDING")
                .arg(stream)
                .arg(&self.config.consumer_group)
                .arg("IDLE")
                .arg(min_idle_ms)
                .arg("-")
                .arg("+")
                .arg(1)
                .query_async(conn)
                .await?;

            let Some(entry) = pending.ids.into_iter().next() else {
                return Ok(None);
            };
            let times_delivered = entry.times_delivered as u32;

            let claimed: StreamClaimReply = redis::cmd("XCLAIM")
                .arg(stream)
                .arg(&self.config.consumer_group)
                .arg(&self.consumer_name)
                .arg(min_idle_ms)
                .arg(&entry.id)
                .query_async(conn)
                .await?;

            let Some(claimed) = claimed.ids.into_iter().next() else {
                // Trimmed from the stream while still pending; drop the
                // dangling pending entry.
                redis::cmd("XACK")
                    .arg(stream)
                    .arg(&self.config.consumer_group)
                    .arg(&entry.id)
                    .query_async::<()>(conn)
                    .await?;
                continue;
            };

            if self.config.should_dead_letter(times_delivered) {
                self.dead_letter(conn, stream, &claimed, times_delivered).await?;
                continue;
            }

            info!(
                stream = stream,
                receipt = %claimed.id,
                receive_count = times_delivered + 1,
                "Redelivering idle queue item"
            );
            return Ok(Some(to_received(claimed, times_delivered + 1)));
        }
    }

    /// Copy an entry to the dead-letter stream and remove it from `stream`.
    async fn dead_letter(
        &self,
        conn: &mut redis::aio::MultiplexedConnection,
        stream: &str,
        entry: &StreamId,
        times_delivered: u32,
    ) -> QueueResult<()> {
        let body: String = entry.get(BODY_FIELD).unwrap_or_default();

        redis::cmd("XADD")
            .arg(&self.config.dead_letter_stream)
            .arg("*")
            .arg(BODY_FIELD)
            .arg(&body)
            .arg("source")
            .arg(stream)
            .arg("original_id")
            .arg(&entry.id)
            .arg("receive_count")
            .arg(times_delivered)
            .query_async::<()>(conn)
            .await?;

        ack_and_delete(conn, stream, &self.config.consumer_group, &entry.id).await?;

        warn!(
            stream = stream,
            receipt = %entry.id,
            receive_count = times_delivered,
            dead_letter_stream = %self.config.dead_letter_stream,
            "Queue item exceeded redelivery limit, moved to dead-letter stream"
        );
        Ok(())
    }
}

#[async_trait]
impl WorkQueue for RedisWorkQueue {
    async fn receive(&self, queue: &str) -> QueueResult<Option<ReceivedItem>> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        if let Some(item) = self.reclaim_idle(&mut conn, queue).await? {
            return Ok(Some(item));
        }

        let reply: Option<StreamReadReply> = redis::cmd("XREADGROUP")
            .arg("GROUP")
            .arg(&self.config.consumer_group)
            .arg(&self.consumer_name)
            .arg("COUNT")
            .arg(1)
            .arg("BLOCK")
            .arg(self.config.receive_wait.as_millis() as u64)
            .arg("STREAMS")
            .arg(queue)
            .arg(">") // Only new messages
            .query_async(&mut conn)
            .await?;

        let entry = reply
            .into_iter()
            .flat_map(|r| r.keys)
            .flat_map(|k| k.ids)
            .next();

        Ok(entry.map(|entry| {
            debug!(stream = queue, receipt = %entry.id, "Received queue item");
            to_received(entry, 1)
        }))
    }

    async fn delete(&self, queue: &str, receipt: &str) -> QueueResult<()> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;
        ack_and_delete(&mut conn, queue, &self.config.consumer_group, receipt).await?;
        debug!(stream = queue, receipt = receipt, "Deleted queue item");
        Ok(())
    }

    async fn send(&self, queue: &str, body: &str) -> QueueResult<String> {
        let mut conn = self.client.get_multiplexed_async_connection().await?;

        let message_id: Option<String> = redis::cmd("XADD")
            .arg(queue)
            .arg("*")
            .arg(BODY_FIELD)
            .arg(body)
            .query_async(&mut conn)
            .await?;

        let message_id =
            message_id.ok_or_else(|| QueueError::send_failed(format!("XADD to {} returned no id", queue)))?;

        debug!(stream = queue, message_id = %message_id, "Sent queue item");
        Ok(message_id)
    }
}

async fn ack_and_delete(
    conn: &mut redis::aio::MultiplexedConnection,
    stream: &str,
    group: &str,
    id: &str,
) -> QueueResult<()> {
    redis::cmd("XACK")
        .arg(stream)
        .arg(group)
        .arg(id)
        .query_async::<()>(&mut *conn)
        .await?;

    redis::cmd("XDEL")
        .arg(stream)
        .arg(id)
        .query_async::<()>(&mut *conn)
        .await?;

    Ok(())
}

fn to_received(entry: StreamId, receive_count: u32) -> ReceivedItem {
    // A missing body is passed through as empty; it fails to parse and is
    // eventually dead-lettered like any other poison message.
    let body: String = entry.get(BODY_FIELD).unwrap_or_default();
    ReceivedItem {
        receipt: entry.id,
        body,
        receive_count,
    }
}
