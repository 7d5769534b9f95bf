//! Downloader configuration.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use uuid::Uuid;

use crate::error::{DownloaderError, DownloaderResult};

/// Downloader configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Stream the downloader consumes work items from
    pub source_queue: String,
    /// Stream the converter consumes handoff descriptors from
    pub destination_queue: String,
    /// Pause between loop iterations
    pub processing_delay: Duration,
    /// Directory downloaded files are written to
    pub download_dir: PathBuf,
    /// Extension given to downloaded files
    pub file_extension: String,
    /// HTTP connect timeout for URL downloads
    pub connect_timeout: Duration,
    /// Longest a URL download may go without receiving data
    pub read_timeout: Duration,
    /// User agent sent with URL downloads
    pub user_agent: String,
    /// Prometheus listener address, disabled when unset
    pub metrics_addr: Option<SocketAddr>,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            source_queue: "vconv:downloader".to_string(),
            destination_queue: "vconv:converter".to_string(),
            processing_delay: Duration::from_millis(1000),
            download_dir: std::env::temp_dir(),
            file_extension: "webm".to_string(),
            connect_timeout: Duration::from_secs(30),
            read_timeout: Duration::from_secs(60),
            user_agent: concat!("vconv-downloader/", env!("CARGO_PKG_VERSION")).to_string(),
            metrics_addr: None,
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> DownloaderResult<Self> {
        let defaults = Self::default();

        let metrics_addr = match std::env::var("METRICS_ADDR") {
            Ok(addr) => Some(addr.parse().map_err(|e| {
                DownloaderError::config(format!("invalid METRICS_ADDR {:?}: {}", addr, e))
            })?),
            Err(_) => None,
        };

        Ok(Self {
            source_queue: std::env::var("DOWNLOADER_QUEUE").unwrap_or(defaults.source_queue),
            destination_queue: std::env::var("CONVERTER_QUEUE")
                .unwrap_or(defaults.destination_queue),
            processing_delay: std::env::var("PROCESSING_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_millis)
                .unwrap_or(defaults.processing_delay),
            download_dir: std::env::var("DOWNLOAD_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.download_dir),
            file_extension: std::env::var("DOWNLOAD_EXTENSION")
                .unwrap_or(defaults.file_extension),
            connect_timeout: std::env::var("DOWNLOAD_CONNECT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.connect_timeout),
            read_timeout: std::env::var("DOWNLOAD_READ_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs)
                .unwrap_or(defaults.read_timeout),
            user_agent: std::env::var("DOWNLOAD_USER_AGENT").unwrap_or(defaults.user_agent),
            metrics_addr,
        })
    }

    /// Fresh, collision-free path for a downloaded file.
    pub fn new_local_path(&self) -> PathBuf {
        self.download_dir
            .join(format!("{}.{}", Uuid::new_v4(), self.file_extension))
    }
}
