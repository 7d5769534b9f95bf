//! Status message texts and download failure kinds.

use std::fmt;

/// Outcome of a failed HTTP download, keyed by response status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// 401 from the source
    Unauthorized,
    /// 404 from the source
    NotFound,
    /// 500 from the source
    ServerError,
    /// Any other non-success status
    Other(u16),
}

impl FailureKind {
    /// Map an HTTP status code to a failure kind.
    pub fn from_status(code: u16) -> Self {
        match code {
            401 => FailureKind::Unauthorized,
            404 => FailureKind::NotFound,
            500 => FailureKind::ServerError,
            other => FailureKind::Other(other),
        }
    }

    /// Status text shown to the requester, if this kind has one.
    pub fn status_text(&self) -> Option<StatusText> {
        match self {
            FailureKind::Unauthorized => Some(StatusText::Unauthorized),
            FailureKind::NotFound => Some(StatusText::NotFound),
            FailureKind::ServerError => Some(StatusText::ServerError),
            FailureKind::Other(_) => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FailureKind::Unauthorized => "unauthorized",
            FailureKind::NotFound => "not_found",
            FailureKind::ServerError => "server_error",
            FailureKind::Other(_) => "other",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::Other(code) => write!(f, "other ({})", code),
            kind => f.write_str(kind.as_str()),
        }
    }
}

/// Lifecycle stage shown in the status message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatusText {
    Downloading,
    Queued,
    Unauthorized,
    NotFound,
    ServerError,
}

impl StatusText {
    /// Suffix appended under the link line.
    pub fn suffix(&self) -> &'static str {
        match self {
            StatusText::Downloading => "Downloading file 🚀",
            StatusText::Queued => "Your file is waiting to be converted 🕒",
            StatusText::Unauthorized => "I am not authorized to download video from this source 🚫",
            StatusText::NotFound => "Video not found ⚠️",
            StatusText::ServerError => "Server error 🛑",
        }
    }

    /// Full message text for a given link label.
    pub fn render(&self, label: &str) -> String {
        format!("{}\n{}", label, self.suffix())
    }
}
