//! Read-only agent lookup for the orchestration core.

use parking_lot::RwLock;
use storage::{Agent, AgentId};

/// Source of agent definitions.
///
/// The core only reads from a registry. Implementations must tolerate
/// concurrent readers; writes are the settings layer's concern.
pub trait AgentRegistry: Send + Sync {
    /// All agents, in display order.
    fn agents(&self) -> Vec<Agent>;

    /// Look up one agent by id.
    fn agent(&self, id: &AgentId) -> Option<Agent> {
        self.agents().into_iter().find(|agent| &agent.id == id)
    }
}

impl AgentRegistry for Vec<Agent> {
    fn agents(&self) -> Vec<Agent> {
        self.clone()
    }
}

/// An in-memory registry snapshot that the settings layer can swap out.
#[derive(Debug, Default)]
pub struct SharedRegistry {
    agents: RwLock<Vec<Agent>>,
}

impl SharedRegistry {
    pub fn new(agents: Vec<Agent>) -> Self {
        Self {
            agents: RwLock::new(agents),
        }
    }

    /// Replace the snapshot, e.g. after the settings store was edited.
    pub fn replace(&self, agents: Vec<Agent>) {
        *self.agents.write() = agents;
    }
}

impl AgentRegistry for SharedRegistry {
    fn agents(&self) -> Vec<Agent> {
        self.agents.read().clone()
    }

    fn agent(&self, id: &AgentId) -> Option<Agent> {
        self.agents.read().iter().find(|agent| &agent.id == id).cloned()
    }
}
