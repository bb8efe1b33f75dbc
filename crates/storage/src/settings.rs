//! In-memory view of persisted settings.

use crate::Agent;
use serde::{Deserialize, Serialize};

/// Default model-server base URL.
pub const DEFAULT_SERVER_URL: &str = "http://localhost:11434";

/// Everything the settings store persists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub agents: Vec<Agent>,
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            agents: vec![Agent::default_assistant()],
            server_url: DEFAULT_SERVER_URL.to_string(),
        }
    }
}
