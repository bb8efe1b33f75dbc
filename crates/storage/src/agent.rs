//! Agent definitions.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Tool names granted to the seeded default agent.
pub const DEFAULT_TOOLS: [&str; 4] = [
    "get_current_time",
    "read_vault_file",
    "call_agent",
    "send_notification",
];

/// Model used by the seeded default agent.
pub const DEFAULT_MODEL: &str = "llama3.2-latest";

/// A stable agent identifier.
///
/// Ids are opaque strings. Freshly created agents receive a UUID, but
/// hand-written ids such as `default-assistant` are equally valid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AgentId(String);

impl AgentId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<&str> for AgentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for AgentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl std::fmt::Display for AgentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A named persona: prompt, model and permissions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub id: AgentId,
    pub name: String,
    pub system_prompt: String,
    pub model: String,
    /// Tool names this agent may invoke. Empty means no tools.
    #[serde(default)]
    pub enabled_tools: Vec<String>,
    /// Comma-separated vault path prefixes for `read_vault_file`.
    /// Empty means unrestricted.
    #[serde(default)]
    pub allowed_paths: String,
}

impl Agent {
    /// Create an agent with a fresh id and no tools.
    pub fn new(
        name: impl Into<String>,
        system_prompt: impl Into<String>,
        model: impl Into<String>,
    ) -> Self {
        Self {
            id: AgentId::new(),
            name: name.into(),
            system_prompt: system_prompt.into(),
            model: model.into(),
            enabled_tools: Vec::new(),
            allowed_paths: String::new(),
        }
    }

    /// The agent seeded into an empty store.
    pub fn default_assistant() -> Self {
        Self {
            id: AgentId::from("default-assistant"),
            name: "General Assistant".to_string(),
            system_prompt: "You are a helpful AI assistant.".to_string(),
            model: DEFAULT_MODEL.to_string(),
            enabled_tools: DEFAULT_TOOLS.iter().map(|t| t.to_string()).collect(),
            allowed_paths: String::new(),
        }
    }

    /// Replace the enabled tools.
    pub fn with_tools<I, S>(mut self, tools: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enabled_tools = tools.into_iter().map(Into::into).collect();
        self
    }

    /// Replace the path allowlist.
    pub fn with_allowed_paths(mut self, paths: impl Into<String>) -> Self {
        self.allowed_paths = paths.into();
        self
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.enabled_tools.iter().any(|t| t == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_agents_get_distinct_ids_and_no_tools() {
        let a = Agent::new("Writer", "You write.", "llama3");
        let b = Agent::new("Writer", "You write.", "llama3");
        assert_ne!(a.id, b.id);
        assert!(a.enabled_tools.is_empty());
        assert!(a.allowed_paths.is_empty());
    }

    #[test]
    fn default_assistant_has_every_builtin_tool() {
        let agent = Agent::default_assistant();
        assert_eq!(agent.id.as_str(), "default-assistant");
        for tool in DEFAULT_TOOLS {
            assert!(agent.has_tool(tool));
        }
    }

    #[test]
    fn missing_permission_fields_deserialize_empty() {
        let json = r#"{"id":"x","name":"X","system_prompt":"","model":"m"}"#;
        let agent: Agent = serde_json::from_str(json).unwrap();
        assert!(agent.enabled_tools.is_empty());
        assert_eq!(agent.allowed_paths, "");
        assert_eq!(agent.id, AgentId::from("x"));
    }
}
