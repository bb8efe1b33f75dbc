//! Convoy runtime: the agent orchestration core.
//!
//! This crate drives multi-turn conversations between a local model server
//! and a set of named agents, executing the tools those agents are allowed to
//! use, including delegation to other agents.
//!
//! # Overview
//!
//! - **Backend**: a stateless bridge to the model server. [`OllamaBackend`]
//!   speaks the Ollama chat API.
//! - **AgentRegistry**: read-only lookup of agent definitions.
//! - **ToolCatalog**: the built-in tools, filtered and re-checked per agent.
//! - **Orchestrator**: the bounded loop that interleaves model calls with
//!   tool execution and recurses on `call_agent`.
//! - **Conversation**: a caller-owned transcript bound to one agent.
//!
//! # Example
//!
//! ```ignore
//! use runtime::{Conversation, OllamaBackend, Orchestrator, SharedRegistry};
//! use std::sync::Arc;
//! use storage::Agent;
//!
//! # async fn example() -> runtime::Result<()> {
//! let backend = OllamaBackend::builder("http://localhost:11434").build()?;
//! let agent = Agent::default_assistant();
//! let registry = SharedRegistry::new(vec![agent.clone()]);
//! let orchestrator = Orchestrator::builder(Arc::new(backend), Arc::new(registry)).build();
//!
//! let mut convo = Conversation::new(Arc::new(orchestrator), agent);
//! let reply = convo.send("What time is it?", None).await?;
//! println!("{reply}");
//! # Ok(())
//! # }
//! ```

mod conversation;
mod error;
pub mod model;
mod orchestrator;
mod prompt;
mod providers;
mod registry;
mod status;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use conversation::Conversation;
pub use error::{Error, Result};
pub use model::{Backend, Message, ModelError, ModelRequest, Role, ToolCall, ToolSpec};
pub use orchestrator::{
    DEFAULT_MAX_DEPTH, DEFAULT_MAX_ITERATIONS, Orchestrator, OrchestratorBuilder, Run, Stop,
};
pub use prompt::compose_system_prompt;
pub use providers::{ModelInfo, ModelSummary, OllamaBackend, OllamaBackendBuilder};
pub use registry::{AgentRegistry, SharedRegistry};
pub use status::{Progress, Status, StatusUpdate};
pub use tools::{
    Delegate, Delivery, EmptyVault, FsVault, NoNotifier, Notifier, NotifyError, TerminalNotifier,
    ToolCatalog, ToolError, VaultError, VaultReader,
};
