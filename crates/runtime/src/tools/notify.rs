//! User-facing notifications.

use async_trait::async_trait;
use std::io::Write;
use thiserror::Error;
use tracing::info;

/// How a notification was delivered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Permission was already granted.
    Sent,
    /// Permission had to be requested first.
    SentAfterGrant,
}

impl Delivery {
    pub fn confirmation(self) -> &'static str {
        match self {
            Delivery::Sent => "Persistent notification sent.",
            Delivery::SentAfterGrant => "Persistent notification sent after permission grant.",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NotifyError {
    #[error("Notification permission denied.")]
    Denied,

    #[error("System notifications are not supported.")]
    Unsupported,

    #[error("{0}")]
    Failed(String),
}

/// The host's alerting surface.
///
/// Delivery is best effort and never retried.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, body: &str) -> Result<Delivery, NotifyError>;
}

/// Writes notifications to the controlling terminal's stderr, ringing the
/// bell so the alert is noticed.
#[derive(Debug, Default)]
pub struct TerminalNotifier;

#[async_trait]
impl Notifier for TerminalNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<Delivery, NotifyError> {
        info!(title, "notification");
        let mut stderr = std::io::stderr().lock();
        writeln!(stderr, "\x07\n[notification] {title}\n{body}\n")
            .and_then(|_| stderr.flush())
            .map_err(|e| NotifyError::Failed(e.to_string()))?;
        Ok(Delivery::Sent)
    }
}
