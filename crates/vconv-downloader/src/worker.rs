//! Retrieval worker loop.
//!
//! One item is in flight at a time. Each iteration receives at most one work
//! item, reports "downloading", fetches the content, then either reports the
//! classified failure and stops, or reports "queued", publishes the handoff
//! and deletes the source item.
//!
//! The source item is deleted only after the handoff was published. Anything
//! else leaves it in the queue, where it is redelivered after the visibility
//! timeout until the queue's redelivery limit moves it to the dead-letter
//! stream.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, error, info, Instrument};

use vconv_models::{FailureKind, FetchSource, HandoffDescriptor, StatusText, WorkItem};
use vconv_queue::{ReceivedItem, WorkQueue};
use vconv_telegram::MessagingClient;

use crate::config::WorkerConfig;
use crate::error::{DownloaderError, DownloaderResult};
use crate::fetcher::{ContentFetcher, FetchOutcome};
use crate::logging::ItemLogger;
use crate::metrics;
use crate::notifier::StatusNotifier;
use crate::publisher::HandoffPublisher;

/// What a single loop iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IterationOutcome {
    /// The source queue had nothing to hand out
    Idle,
    /// Content was fetched, handed off and the source item deleted
    HandedOff { local_file_path: PathBuf },
    /// The download was rejected with a classified failure; the item stays queued
    Rejected(FailureKind),
}

/// Polls the downloader queue and drives each item to the converter.
pub struct RetrievalWorker {
    config: WorkerConfig,
    queue: Arc<dyn WorkQueue>,
    fetcher: ContentFetcher,
    notifier: StatusNotifier,
    publisher: HandoffPublisher,
}

impl RetrievalWorker {
    /// Create a worker from its collaborators.
    pub fn new(
        config: WorkerConfig,
        queue: Arc<dyn WorkQueue>,
        messaging: Arc<dyn MessagingClient>,
    ) -> DownloaderResult<Self> {
        let fetcher = ContentFetcher::new(&config, Arc::clone(&messaging))?;
        let notifier = StatusNotifier::new(messaging);
        let publisher = HandoffPublisher::new(Arc::clone(&queue), config.destination_queue.clone());

        Ok(Self {
            config,
            queue,
            fetcher,
            notifier,
            publisher,
        })
    }

    /// Run until `shutdown` flips to `true` or its sender is dropped.
    ///
    /// Errors never end the loop: they are logged and the next iteration
    /// starts after the processing delay.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) {
        info!(
            source = %self.config.source_queue,
            destination = %self.config.destination_queue,
            delay_ms = self.config.processing_delay.as_millis() as u64,
            "Starting retrieval worker"
        );

        while !*shutdown.borrow() {
            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                result = self.run_once() => match result {
                    Ok(outcome) => debug!(?outcome, "Iteration finished"),
                    Err(e) => {
                        metrics::record_iteration_error(e.kind());
                        error!(error = %e, kind = e.kind(), "Error during downloader iteration");
                    }
                },
            }

            tokio::select! {
                _ = wait_for_shutdown(&mut shutdown) => break,
                _ = tokio::time::sleep(self.config.processing_delay) => {}
            }
        }

        info!("Retrieval worker stopped");
    }

    /// Run a single iteration.
    pub async fn run_once(&self) -> DownloaderResult<IterationOutcome> {
        let Some(received) = self.queue.receive(&self.config.source_queue).await? else {
            return Ok(IterationOutcome::Idle);
        };
        metrics::record_received();

        let item = WorkItem::from_json(&received.body).map_err(DownloaderError::MalformedItem)?;

        let source = match item.source() {
            FetchSource::Url(_) => "url",
            FetchSource::Attachment => "attachment",
        };
        let logger = ItemLogger::new(&received.receipt, source);

        let result = self
            .process(&received, &item, &logger)
            .instrument(logger.create_span())
            .await;
        if let Err(e) = &result {
            logger.log_warning(&format!("item left in queue: {}", e));
        }
        result
    }

    async fn process(
        &self,
        received: &ReceivedItem,
        item: &WorkItem,
        logger: &ItemLogger,
    ) -> DownloaderResult<IterationOutcome> {
        logger.log_start(&format!("delivery {}", received.receive_count));

        let status = item.status_ref();
        let label = item.status_label();

        self.notifier
            .update(status, &StatusText::Downloading.render(label))
            .await?;

        let local_file_path = self.config.new_local_path();

        let forwarded_name = match item.source() {
            FetchSource::Attachment => {
                let document = item.attachment().ok_or(DownloaderError::MissingAttachment)?;
                self.fetcher
                    .fetch_from_attachment(&document.file_id, &local_file_path)
                    .await?;
                document.file_name.clone()
            }
            FetchSource::Url(url) => {
                match self.fetcher.fetch_from_url(url, &local_file_path).await? {
                    FetchOutcome::Completed { .. } => {}
                    FetchOutcome::Failed(FailureKind::Other(code)) => {
                        return Err(DownloaderError::unclassified_status(url, code));
                    }
                    FetchOutcome::Failed(kind) => {
                        if let Some(text) = kind.status_text() {
                            self.notifier.update(status, &text.render(label)).await?;
                        }
                        metrics::record_fetch_failure(kind);
                        logger.log_warning(&format!("download rejected: {}", kind));
                        return Ok(IterationOutcome::Rejected(kind));
                    }
                }
                item.link_or_file_name.clone()
            }
        };
        logger.log_progress(&format!("fetched to {}", local_file_path.display()));

        self.notifier
            .update(status, &StatusText::Queued.render(label))
            .await?;

        let descriptor = HandoffDescriptor::new(item, &local_file_path, forwarded_name);
        self.publisher.publish(&descriptor).await?;

        self.queue
            .delete(&self.config.source_queue, &received.receipt)
            .await?;

        metrics::record_handed_off(logger.source());
        logger.log_completion("handed off to converter");

        Ok(IterationOutcome::HandedOff { local_file_path })
    }
}

/// Resolves once shutdown is requested or the sender is gone.
async fn wait_for_shutdown(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}
