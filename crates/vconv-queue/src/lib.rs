//! Work queue abstraction backed by Redis Streams.
//!
//! This crate provides:
//! - The `WorkQueue` trait the downloader polls and publishes through
//! - A Redis Streams implementation with consumer groups
//! - Explicit redelivery limits with a dead-letter stream

pub mod error;
pub mod queue;
pub mod redis_queue;

pub use error::{QueueError, QueueResult};
pub use queue::{QueueConfig, ReceivedItem, WorkQueue};
pub use redis_queue::RedisWorkQueue;
