//! User-facing notices and persistent error records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info};

/// Structured record for persistent error logging.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorRecord {
    pub message: String,
    pub detail: Option<String>,

    /// Originating URL/screen, when the caller knows it.
    pub source_url: Option<String>,

    pub occurred_at: DateTime<Utc>,
}

impl ErrorRecord {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            detail: None,
            source_url: None,
            occurred_at: Utc::now(),
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_source_url(mut self, url: impl Into<String>) -> Self {
        self.source_url = Some(url.into());
        self
    }
}

/// Where user-visible outcomes land.
///
/// `success`/`error` are toast-style messages; `record` feeds persistent
/// error logging. Implementations must not block or panic — the controller
/// calls this from its event-handling path.
pub trait NotificationSink: Send + Sync {
    fn success(&self, message: &str);

    fn error(&self, message: &str);

    fn record(&self, record: ErrorRecord);
}

/// Sink that forwards everything to `tracing`.
///
/// The default for headless processes and tests that don't assert on
/// notices.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl NotificationSink for TracingSink {
    fn success(&self, message: &str) {
        info!(notice = message, "user notice");
    }

    fn error(&self, message: &str) {
        error!(notice = message, "user notice");
    }

    fn record(&self, record: ErrorRecord) {
        error!(
            summary = record.message.as_str(),
            detail = record.detail.as_deref(),
            source_url = record.source_url.as_deref(),
            "error record"
        );
    }
}
