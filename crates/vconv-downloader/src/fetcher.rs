//! Content fetching from URLs and platform attachments.
//!
//! Both paths write to a caller-chosen local path. A failed or cancelled
//! fetch never leaves a file behind; a successful one leaves exactly one
//! complete file.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

use vconv_models::FailureKind;
use vconv_telegram::MessagingClient;

use crate::classifier::classify;
use crate::config::WorkerConfig;
use crate::error::DownloaderResult;
use crate::metrics;

/// Result of a URL download that reached the remote server.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    /// The full body was written to disk
    Completed { bytes: u64 },
    /// The server answered with a non-success status
    Failed(FailureKind),
}

/// Downloads work item content to local files.
pub struct ContentFetcher {
    http: reqwest::Client,
    messaging: Arc<dyn MessagingClient>,
}

impl ContentFetcher {
    pub fn new(config: &WorkerConfig, messaging: Arc<dyn MessagingClient>) -> DownloaderResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(config.connect_timeout)
            .read_timeout(config.read_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self { http, messaging })
    }

    /// Stream `url` into `dest`.
    ///
    /// Non-success statuses come back as `FetchOutcome::Failed`; transport
    /// and disk errors are returned as `Err`.
    pub async fn fetch_from_url(&self, url: &str, dest: &Path) -> DownloaderResult<FetchOutcome> {
        let started = Instant::now();
        let partial = PartialDownload::new(dest);

        let outcome = self.stream_to_file(url, dest).await?;
        match outcome {
            FetchOutcome::Completed { bytes } => {
                partial.keep();
                metrics::record_download("url", bytes, started.elapsed().as_secs_f64());
                info!(url = url, path = %dest.display(), bytes = bytes, "Downloaded URL");
            }
            FetchOutcome::Failed(kind) => {
                debug!(url = url, kind = %kind, "URL download rejected by server");
            }
        }

        Ok(outcome)
    }

    /// Resolve a platform attachment and write it to `dest`.
    pub async fn fetch_from_attachment(&self, file_id: &str, dest: &Path) -> DownloaderResult<u64> {
        let started = Instant::now();
        let partial = PartialDownload::new(dest);

        let bytes = self.messaging.download_attachment(file_id, dest).await?;
        partial.keep();

        metrics::record_download("attachment", bytes, started.elapsed().as_secs_f64());
        info!(file_id = file_id, path = %dest.display(), bytes = bytes, "Downloaded attachment");
        Ok(bytes)
    }

    async fn stream_to_file(&self, url: &str, dest: &Path) -> DownloaderResult<FetchOutcome> {
        let response = self.http.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Ok(FetchOutcome::Failed(classify(status)));
        }

        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut bytes = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await?;
            bytes += chunk.len() as u64;
        }
        file.flush().await?;

        Ok(FetchOutcome::Completed { bytes })
    }
}

/// Removes the destination file when dropped before `keep()`.
///
/// Covers error returns as well as the fetch future being dropped mid-stream
/// on shutdown.
struct PartialDownload<'a> {
    path: &'a Path,
    kept: bool,
}

impl<'a> PartialDownload<'a> {
    fn new(path: &'a Path) -> Self {
        Self { path, kept: false }
    }

    fn keep(mut self) {
        self.kept = true;
    }
}

impl Drop for PartialDownload<'_> {
    fn drop(&mut self) {
        if self.kept {
            return;
        }
        match std::fs::remove_file(self.path) {
            Ok(()) => debug!(path = %self.path.display(), "Removed partial download"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(path = %self.path.display(), error = %e, "Failed to remove partial download"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use async_trait::async_trait;
    use vconv_models::StatusMessageRef;
    use vconv_telegram::{TelegramError, TelegramResult};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Attachment source that writes a few bytes and then fails.
    struct BrokenAttachments;

    #[async_trait]
    impl MessagingClient for BrokenAttachments {
        async fn edit_status(&self, _status: StatusMessageRef, _text: &str) -> TelegramResult<()> {
            Ok(())
        }

        async fn download_attachment(&self, _file_id: &str, dest: &Path) -> TelegramResult<u64> {
            tokio::fs::write(dest, b"partial").await?;
            Err(TelegramError::Io(std::io::Error::other("connection reset")))
        }
    }

    /// Attachment source that writes a few bytes and then never finishes.
    struct StalledAttachments;

    #[async_trait]
    impl MessagingClient for StalledAttachments {
        async fn edit_status(&self, _status: StatusMessageRef, _text: &str) -> TelegramResult<()> {
            Ok(())
        }

        async fn download_attachment(&self, _file_id: &str, dest: &Path) -> TelegramResult<u64> {
            tokio::fs::write(dest, b"partial").await?;
            std::future::pending().await
        }
    }

    fn fetcher() -> ContentFetcher {
        ContentFetcher::new(&WorkerConfig::default(), Arc::new(BrokenAttachments)).unwrap()
    }

    #[tokio::test]
    async fn test_stalled_server_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/stalled"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(b"late".to_vec())
                    .set_delay(std::time::Duration::from_secs(30)),
            )
            .mount(&server)
            .await;

        let config = WorkerConfig {
            read_timeout: std::time::Duration::from_millis(200),
            ..Default::default()
        };
        let fetcher = ContentFetcher::new(&config, Arc::new(BrokenAttachments)).unwrap();

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.webm");

        let result = tokio::time::timeout(
            std::time::Duration::from_secs(10),
            fetcher.fetch_from_url(&format!("{}/stalled", server.uri()), &dest),
        )
        .await
        .expect("download did not time out");

        assert!(matches!(result, Err(crate::DownloaderError::Http(ref e)) if e.is_timeout()));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_url_download_writes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/y.mp4"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![7u8; 4096]))
            .expect(1)
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.webm");

        let outcome = fetcher()
            .fetch_from_url(&format!("{}/y.mp4", server.uri()), &dest)
            .await
            .unwrap();

        assert_eq!(outcome, FetchOutcome::Completed { bytes: 4096 });
        assert_eq!(tokio::fs::read(&dest).await.unwrap(), vec![7u8; 4096]);
    }

    #[tokio::test]
    async fn test_error_status_is_classified_and_leaves_no_file() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/404"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/503"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.webm");
        let fetcher = fetcher();

        let outcome = fetcher
            .fetch_from_url(&format!("{}/404", server.uri()), &dest)
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Failed(FailureKind::NotFound));
        assert!(!dest.exists());

        let outcome = fetcher
            .fetch_from_url(&format!("{}/503", server.uri()), &dest)
            .await
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Failed(FailureKind::Other(503)));
    }

    #[tokio::test]
    async fn test_transport_error_is_returned() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.webm");

        // Nothing listens on port 1.
        let result = fetcher().fetch_from_url("http://127.0.0.1:1/video.webm", &dest).await;

        assert!(matches!(result, Err(crate::DownloaderError::Http(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_failed_attachment_removes_partial_file() {
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.webm");

        let result = fetcher().fetch_from_attachment("file-1", &dest).await;

        assert!(matches!(result, Err(crate::DownloaderError::Messaging(_))));
        assert!(!dest.exists());
    }

    #[tokio::test]
    async fn test_cancelled_download_removes_partial_file() {
        let fetcher =
            ContentFetcher::new(&WorkerConfig::default(), Arc::new(StalledAttachments)).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("out.webm");

        let result = tokio::time::timeout(
            std::time::Duration::from_millis(200),
            fetcher.fetch_from_attachment("file-1", &dest),
        )
        .await;

        assert!(result.is_err());
        assert!(!dest.exists());
    }
}
