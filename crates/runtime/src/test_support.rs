//! Test doubles shared by the unit tests.

use crate::model::{Backend, Message, ModelError, ModelRequest};
use crate::status::{Progress, Status, StatusUpdate};
use crate::tools::{Delegate, Delivery, Notifier, NotifyError, ToolError, VaultError, VaultReader};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::{HashMap, VecDeque};
use storage::Agent;

/// Delegate that answers with the prompt it was given.
pub struct EchoDelegate;

#[async_trait]
impl Delegate for EchoDelegate {
    async fn delegate(&self, _target: &Agent, prompt: &str) -> Result<String, ToolError> {
        Ok(format!("echo: {prompt}"))
    }
}

/// In-memory vault keyed by normalized path.
pub struct MemoryVault {
    files: HashMap<String, String>,
}

impl MemoryVault {
    pub fn new<'a>(files: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        Self {
            files: files
                .into_iter()
                .map(|(path, text)| (path.to_string(), text.to_string()))
                .collect(),
        }
    }
}

#[async_trait]
impl VaultReader for MemoryVault {
    async fn read(&self, path: &str) -> Result<String, VaultError> {
        self.files
            .get(path)
            .cloned()
            .ok_or_else(|| VaultError::NotFound(path.to_string()))
    }
}

/// Notifier that records what it was asked to send.
pub struct RecordingNotifier {
    outcome: Result<Delivery, NotifyError>,
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn delivering(delivery: Delivery) -> Self {
        Self {
            outcome: Ok(delivery),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: NotifyError) -> Self {
        Self {
            outcome: Err(error),
            sent: Mutex::new(Vec::new()),
        }
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().clone()
    }
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, title: &str, body: &str) -> Result<Delivery, NotifyError> {
        self.sent.lock().push((title.to_string(), body.to_string()));
        self.outcome.clone()
    }
}

/// An owned copy of a [`ModelRequest`].
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub model: String,
    pub messages: Vec<Message>,
    pub tools: Vec<String>,
}

type Reply = Box<dyn Fn(&RecordedRequest) -> Result<Message, ModelError> + Send + Sync>;

/// Backend driven by a closure or a fixed reply sequence.
pub struct ScriptedBackend {
    reply: Reply,
    queue: Mutex<VecDeque<Result<Message, ModelError>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl ScriptedBackend {
    pub fn new<F>(reply: F) -> Self
    where
        F: Fn(&RecordedRequest) -> Result<Message, ModelError> + Send + Sync + 'static,
    {
        Self {
            reply: Box::new(reply),
            queue: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// Replies in order, then fails once the script runs out.
    pub fn sequence(replies: Vec<Result<Message, ModelError>>) -> Self {
        let backend = Self::new(|_| Err(ModelError::Api("script exhausted".into())));
        *backend.queue.lock() = replies.into();
        backend
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl Backend for ScriptedBackend {
    async fn chat(&self, request: ModelRequest<'_>) -> Result<Message, ModelError> {
        let recorded = RecordedRequest {
            model: request.model.to_string(),
            messages: request.messages.to_vec(),
            tools: request.tools.iter().map(|t| t.name.clone()).collect(),
        };
        self.requests.lock().push(recorded.clone());

        let queued = self.queue.lock().pop_front();
        queued.unwrap_or_else(|| (self.reply)(&recorded))
    }
}

/// Progress sink that keeps every update.
#[derive(Default)]
pub struct RecordingProgress {
    updates: Mutex<Vec<StatusUpdate>>,
}

impl RecordingProgress {
    pub fn statuses(&self) -> Vec<Status> {
        self.updates.lock().iter().map(|u| u.status).collect()
    }

    pub fn count(&self, status: Status) -> usize {
        self.updates.lock().iter().filter(|u| u.status == status).count()
    }

    pub fn messages(&self, status: Status) -> Vec<String> {
        self.updates
            .lock()
            .iter()
            .filter(|u| u.status == status)
            .filter_map(|u| u.message.clone())
            .collect()
    }
}

impl Progress for RecordingProgress {
    fn update(&self, update: StatusUpdate) {
        self.updates.lock().push(update);
    }
}
