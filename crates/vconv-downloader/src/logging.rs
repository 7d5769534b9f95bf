//! Structured work item logging.
//!
//! Keeps the receipt handle and source on every lifecycle line so a single
//! item can be followed through the logs.

use tracing::{info, warn, Span};

/// Logger bound to one received work item.
#[derive(Debug, Clone)]
pub struct ItemLogger {
    receipt: String,
    source: &'static str,
}

impl ItemLogger {
    /// Create a logger for a queue receipt and fetch source ("url" or "attachment").
    pub fn new(receipt: &str, source: &'static str) -> Self {
        Self {
            receipt: receipt.to_string(),
            source,
        }
    }

    pub fn log_start(&self, message: &str) {
        info!(
            receipt = %self.receipt,
            source = self.source,
            "Item started: {}", message
        );
    }

    pub fn log_progress(&self, message: &str) {
        info!(
            receipt = %self.receipt,
            source = self.source,
            "Item progress: {}", message
        );
    }

    pub fn log_warning(&self, message: &str) {
        warn!(
            receipt = %self.receipt,
            source = self.source,
            "Item warning: {}", message
        );
    }

    pub fn log_completion(&self, message: &str) {
        info!(
            receipt = %self.receipt,
            source = self.source,
            "Item completed: {}", message
        );
    }

    pub fn receipt(&self) -> &str {
        &self.receipt
    }

    pub fn source(&self) -> &'static str {
        self.source
    }

    /// Span covering the processing of this item.
    pub fn create_span(&self) -> Span {
        tracing::info_span!("work_item", receipt = %self.receipt, source = self.source)
    }
}
