//! Progress events emitted during an orchestration run.

use serde::Serialize;

/// Phase of an orchestration run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Status {
    /// Waiting on the model.
    Loading,
    /// A tool is executing.
    ToolRunning,
    /// A tool finished.
    ToolResult,
    /// The run is over. Emitted exactly once.
    Done,
    /// The model call failed and the run is ending.
    Error,
}

/// A status event with an optional human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusUpdate {
    pub status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl StatusUpdate {
    pub fn new(status: Status) -> Self {
        Self {
            status,
            message: None,
        }
    }

    pub fn with_message(status: Status, message: impl Into<String>) -> Self {
        Self {
            status,
            message: Some(message.into()),
        }
    }
}

/// Receiver for status events.
///
/// Any `Fn(StatusUpdate)` closure that is `Send + Sync` qualifies.
pub trait Progress: Send + Sync {
    fn update(&self, update: StatusUpdate);
}

impl<F> Progress for F
where
    F: Fn(StatusUpdate) + Send + Sync,
{
    fn update(&self, update: StatusUpdate) {
        self(update)
    }
}
