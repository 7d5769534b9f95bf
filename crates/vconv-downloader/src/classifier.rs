//! HTTP failure classification.

use reqwest::StatusCode;

use vconv_models::FailureKind;

/// Map a non-success download status to a failure kind.
///
/// Only 401, 404 and 500 have a tailored user message; everything else is
/// `FailureKind::Other` and is treated as an unrecovered error by the worker.
pub fn classify(status: StatusCode) -> FailureKind {
    FailureKind::from_status(status.as_u16())
}
