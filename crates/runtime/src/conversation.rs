//! Caller-owned transcript bound to one agent.

use crate::model::Message;
use crate::orchestrator::{Orchestrator, Stop};
use crate::status::Progress;
use crate::{Error, Result};
use std::sync::Arc;
use storage::Agent;

/// A running chat with one agent.
///
/// The transcript lives only as long as the value; nothing is persisted.
pub struct Conversation {
    orchestrator: Arc<Orchestrator>,
    agent: Agent,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(orchestrator: Arc<Orchestrator>, agent: Agent) -> Self {
        Self {
            orchestrator,
            agent,
            messages: Vec::new(),
        }
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    /// Send a user turn and return the agent's final answer.
    ///
    /// The transcript adopts whatever the run appended, even when the model
    /// call fails part way through.
    pub async fn send(&mut self, input: &str, progress: Option<&dyn Progress>) -> Result<String> {
        let mut history = std::mem::take(&mut self.messages);
        history.push(Message::user(input));

        let run = self.orchestrator.run(&self.agent, history, progress).await;
        let reply = run.final_reply().unwrap_or_default().to_string();
        self.messages = run.messages;

        match run.stop {
            Stop::Failed(message) => Err(Error::Inference(message)),
            Stop::Answered | Stop::IterationLimit => Ok(reply),
        }
    }

    /// Forget the transcript.
    pub fn clear(&mut self) {
        self.messages.clear();
    }
}
