//! Downloader metrics.
//!
//! Counters and histograms for the retrieval loop, optionally exported over
//! HTTP in Prometheus format.

use std::net::SocketAddr;

use metrics::{counter, histogram};
use metrics_exporter_prometheus::{BuildError, PrometheusBuilder};

use vconv_models::FailureKind;

/// Metric name constants for consistency.
pub mod names {
    /// Work items received from the source queue.
    pub const ITEMS_RECEIVED_TOTAL: &str = "vconv_downloader_items_received_total";

    /// Work items handed off to the converter, by source.
    pub const ITEMS_HANDED_OFF_TOTAL: &str = "vconv_downloader_items_handed_off_total";

    /// Classified download failures, by kind.
    pub const FETCH_FAILURES_TOTAL: &str = "vconv_downloader_fetch_failures_total";

    /// Iterations that ended in an unrecovered error, by error kind.
    pub const ITERATION_ERRORS_TOTAL: &str = "vconv_downloader_iteration_errors_total";

    /// Size of downloaded files in bytes.
    pub const DOWNLOAD_BYTES: &str = "vconv_downloader_download_bytes";

    /// Download duration in seconds, by source.
    pub const DOWNLOAD_DURATION_SECONDS: &str = "vconv_downloader_download_duration_seconds";
}

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn install_exporter(addr: SocketAddr) -> Result<(), BuildError> {
    PrometheusBuilder::new().with_http_listener(addr).install()
}

pub fn record_received() {
    counter!(names::ITEMS_RECEIVED_TOTAL).increment(1);
}

pub fn record_handed_off(source: &'static str) {
    counter!(names::ITEMS_HANDED_OFF_TOTAL, "source" => source).increment(1);
}

pub fn record_fetch_failure(kind: FailureKind) {
    counter!(names::FETCH_FAILURES_TOTAL, "kind" => kind.as_str()).increment(1);
}

pub fn record_iteration_error(kind: &'static str) {
    counter!(names::ITERATION_ERRORS_TOTAL, "kind" => kind).increment(1);
}

pub fn record_download(source: &'static str, bytes: u64, seconds: f64) {
    histogram!(names::DOWNLOAD_BYTES).record(bytes as f64);
    histogram!(names::DOWNLOAD_DURATION_SECONDS, "source" => source).record(seconds);
}
