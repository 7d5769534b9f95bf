//! Shared data models for the vconv pipeline.
//!
//! This crate provides Serde-serializable types for:
//! - Platform messages carried through the queues
//! - Downloader work items and converter handoff descriptors
//! - Status message texts shown to the requester

pub mod handoff;
pub mod message;
pub mod status;
pub mod work_item;

// Re-export common types
pub use handoff::HandoffDescriptor;
pub use message::{Chat, Document, PlatformMessage};
pub use status::{FailureKind, StatusText};
pub use work_item::{FetchSource, StatusMessageRef, WorkItem};
