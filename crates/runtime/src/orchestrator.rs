//! The bounded tool-calling loop.

use crate::model::{Backend, Message, ModelRequest, Role};
use crate::prompt::compose_system_prompt;
use crate::registry::AgentRegistry;
use crate::status::{Progress, Status, StatusUpdate};
use crate::tools::{Delegate, EmptyVault, NoNotifier, Notifier, ToolCatalog, ToolError, VaultReader};
use async_trait::async_trait;
use policy::PathMatch;
use std::sync::Arc;
use storage::{Agent, DEFAULT_MODEL};
use tracing::{debug, info, warn};

/// Model calls allowed per run.
pub const DEFAULT_MAX_ITERATIONS: usize = 5;

/// Nested `call_agent` levels allowed below a top-level run.
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Why a run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Stop {
    /// The model produced a plain answer.
    Answered,
    /// The iteration budget ran out. Not an error.
    IterationLimit,
    /// A model call failed.
    Failed(String),
}

/// The outcome of one orchestration run.
#[derive(Debug, Clone)]
pub struct Run {
    /// The input history plus everything appended during the run.
    pub messages: Vec<Message>,
    /// Model calls made.
    pub iterations: usize,
    pub stop: Stop,
}

impl Run {
    /// Content of the last assistant message, if any.
    pub fn final_reply(&self) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::Assistant)
            .map(|m| m.content.as_str())
    }
}

/// Builder for an [`Orchestrator`].
pub struct OrchestratorBuilder {
    backend: Arc<dyn Backend>,
    registry: Arc<dyn AgentRegistry>,
    vault: Arc<dyn VaultReader>,
    notifier: Arc<dyn Notifier>,
    path_match: PathMatch,
    max_iterations: usize,
    max_depth: usize,
}

impl OrchestratorBuilder {
    pub fn new(backend: Arc<dyn Backend>, registry: Arc<dyn AgentRegistry>) -> Self {
        Self {
            backend,
            registry,
            vault: Arc::new(EmptyVault),
            notifier: Arc::new(NoNotifier),
            path_match: PathMatch::default(),
            max_iterations: DEFAULT_MAX_ITERATIONS,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }

    pub fn vault(mut self, vault: Arc<dyn VaultReader>) -> Self {
        self.vault = vault;
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    pub fn path_match(mut self, mode: PathMatch) -> Self {
        self.path_match = mode;
        self
    }

    /// Model calls allowed per run. At least one.
    pub fn max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations.max(1);
        self
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn build(self) -> Orchestrator {
        let catalog = ToolCatalog::new(self.registry.clone(), self.vault, self.notifier)
            .with_path_match(self.path_match);

        Orchestrator {
            backend: self.backend,
            registry: self.registry,
            catalog,
            max_iterations: self.max_iterations,
            max_depth: self.max_depth,
        }
    }
}

/// Drives model inference and tool execution for an agent.
///
/// Each run is strictly sequential: tool calls from one assistant turn are
/// executed and recorded in the order the model listed them.
pub struct Orchestrator {
    backend: Arc<dyn Backend>,
    registry: Arc<dyn AgentRegistry>,
    catalog: ToolCatalog,
    max_iterations: usize,
    max_depth: usize,
}

impl Orchestrator {
    pub fn builder(backend: Arc<dyn Backend>, registry: Arc<dyn AgentRegistry>) -> OrchestratorBuilder {
        OrchestratorBuilder::new(backend, registry)
    }

    /// Run `agent` over `history` until it answers, fails, or exhausts its
    /// iteration budget.
    ///
    /// Nothing is rolled back on failure: the returned history holds every
    /// message appended before the failing model call.
    pub async fn run(
        &self,
        agent: &Agent,
        history: Vec<Message>,
        progress: Option<&dyn Progress>,
    ) -> Run {
        self.run_at_depth(agent, history, progress, 0).await
    }

    async fn run_at_depth(
        &self,
        agent: &Agent,
        mut messages: Vec<Message>,
        progress: Option<&dyn Progress>,
        depth: usize,
    ) -> Run {
        let emit = |update: StatusUpdate| {
            if let Some(progress) = progress {
                progress.update(update);
            }
        };

        let system = Message::system(compose_system_prompt(agent, &self.registry.agents()));
        let tools = self.catalog.definitions_for(agent);
        let model = if agent.model.trim().is_empty() {
            DEFAULT_MODEL
        } else {
            agent.model.as_str()
        };
        let nested = Nested {
            orchestrator: self,
            depth: depth + 1,
        };

        info!(agent = %agent.id, model, depth, tools = tools.len(), "run started");

        let mut iterations = 0;
        let mut stop = Stop::IterationLimit;

        while iterations < self.max_iterations {
            iterations += 1;
            emit(StatusUpdate::new(Status::Loading));
            debug!(agent = %agent.id, iteration = iterations, "model call");

            let request: Vec<Message> = std::iter::once(system.clone())
                .chain(messages.iter().cloned())
                .collect();

            let reply = self
                .backend
                .chat(ModelRequest {
                    model,
                    messages: &request,
                    tools: &tools,
                })
                .await;

            let reply = match reply {
                Ok(reply) => Message {
                    role: Role::Assistant,
                    ..reply
                },
                Err(e) => {
                    let message = e.to_string();
                    warn!(agent = %agent.id, iteration = iterations, error = %message, "model call failed");
                    emit(StatusUpdate::with_message(Status::Error, message.clone()));
                    stop = Stop::Failed(message);
                    break;
                }
            };

            if !reply.has_tool_calls() {
                messages.push(reply);
                stop = Stop::Answered;
                break;
            }

            let calls = reply.tool_calls.clone();
            messages.push(reply);

            for call in &calls {
                emit(StatusUpdate::with_message(
                    Status::ToolRunning,
                    format!("Running tool: {}...", call.name),
                ));
                let result = self.catalog.execute(call, agent, &nested).await;
                emit(StatusUpdate::with_message(Status::ToolResult, call.name.clone()));
                messages.push(Message::tool(result));
            }
        }

        if stop == Stop::IterationLimit {
            warn!(agent = %agent.id, iterations, "iteration limit reached");
        }
        info!(agent = %agent.id, iterations, stop = ?stop, "run finished");
        emit(StatusUpdate::new(Status::Done));

        Run {
            messages,
            iterations,
            stop,
        }
    }
}

/// Delegation handle for one nesting level.
struct Nested<'a> {
    orchestrator: &'a Orchestrator,
    depth: usize,
}

#[async_trait]
impl<'a> Delegate for Nested<'a> {
    async fn delegate(&self, target: &Agent, prompt: &str) -> Result<String, ToolError> {
        let limit = self.orchestrator.max_depth;
        if self.depth > limit {
            warn!(agent = %target.id, depth = self.depth, limit, "delegation depth limit");
            return Err(ToolError::DepthExceeded {
                limit,
                agent: target.name.clone(),
            });
        }

        let run = self
            .orchestrator
            .run_at_depth(target, vec![Message::user(prompt)], None, self.depth)
            .await;

        let reply = match &run.stop {
            Stop::Failed(message) => {
                return Err(ToolError::Delegation {
                    agent: target.name.clone(),
                    message: message.clone(),
                });
            }
            Stop::Answered => run.final_reply(),
            // Capped runs usually end on a tool result, not an answer.
            Stop::IterationLimit => run.messages.last().map(|m| m.content.as_str()),
        };

        reply
            .map(str::to_string)
            .ok_or_else(|| ToolError::NoResponse(target.name.clone()))
    }
}
