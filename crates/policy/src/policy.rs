//! Policy construction and enforcement.

use crate::{CapabilityRequest, PathAllowlist, PathMatch};
use std::collections::BTreeSet;

/// Result of a capability check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny { reason: String },
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// The grants of a single agent.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    tools: BTreeSet<String>,
    paths: PathAllowlist,
}

impl Policy {
    /// Build a policy from an agent's enabled tool names and its
    /// comma-separated path allowlist.
    pub fn new<I, S>(enabled_tools: I, allowed_paths: &str) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            tools: enabled_tools.into_iter().map(Into::into).collect(),
            paths: PathAllowlist::parse(allowed_paths),
        }
    }

    /// Use a different path matching mode.
    pub fn with_path_match(mut self, mode: PathMatch) -> Self {
        self.paths = self.paths.with_mode(mode);
        self
    }

    pub fn allows_tool(&self, name: &str) -> bool {
        self.tools.contains(name)
    }

    /// Check if a capability request is allowed.
    pub fn check(&self, request: &CapabilityRequest) -> Decision {
        match request {
            CapabilityRequest::Tool { name } if self.allows_tool(name) => Decision::Allow,
            CapabilityRequest::Tool { name } => Decision::Deny {
                reason: format!("tool {name} is not enabled"),
            },
            CapabilityRequest::VaultRead { path } if self.paths.permits(path) => Decision::Allow,
            CapabilityRequest::VaultRead { path } => Decision::Deny {
                reason: format!(
                    "path {path} is outside the allowlist ({})",
                    self.paths.prefixes().join(", ")
                ),
            },
        }
    }
}
