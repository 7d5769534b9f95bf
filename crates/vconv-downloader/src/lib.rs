//! Downloader stage of the vconv pipeline.
//!
//! This crate provides:
//! - The retrieval worker loop (poll, fetch, report, hand off)
//! - URL and attachment fetching with failure classification
//! - Status message updates and converter handoff
//! - Graceful shutdown

pub mod classifier;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod logging;
pub mod metrics;
pub mod notifier;
pub mod publisher;
pub mod worker;

pub use config::WorkerConfig;
pub use error::{DownloaderError, DownloaderResult};
pub use fetcher::{ContentFetcher, FetchOutcome};
pub use logging::ItemLogger;
pub use notifier::StatusNotifier;
pub use publisher::HandoffPublisher;
pub use worker::{IterationOutcome, RetrievalWorker};
