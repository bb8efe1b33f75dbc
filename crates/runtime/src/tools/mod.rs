//! Tool catalog: schemas, permission checks and execution.

mod definitions;
mod empty;
pub mod errors;
mod notify;
mod vault;

pub use definitions::{
    CALL_AGENT, GET_CURRENT_TIME, READ_VAULT_FILE, SEND_NOTIFICATION, builtin_specs,
};
pub use empty::{EmptyVault, NoNotifier};
pub use errors::ToolError;
pub use notify::{Delivery, Notifier, NotifyError, TerminalNotifier};
pub use vault::{FsVault, VaultError, VaultReader};

use crate::model::{ToolCall, ToolSpec};
use crate::registry::AgentRegistry;
use async_trait::async_trait;
use policy::{CapabilityRequest, Decision, PathMatch, Policy, normalize_path};
use std::sync::Arc;
use storage::{Agent, AgentId};
use tracing::{debug, warn};

const DEFAULT_NOTIFICATION_TITLE: &str = "AI Agent alert";
const DEFAULT_NOTIFICATION_BODY: &str = "No message content was provided by the agent.";

/// Runs a nested conversation on behalf of `call_agent`.
///
/// The orchestrator implements this; the catalog only sees the trait, so
/// the two modules don't depend on each other directly.
#[async_trait]
pub trait Delegate: Send + Sync {
    /// Run `target` on a fresh single-message history and return its final
    /// assistant content.
    async fn delegate(&self, target: &Agent, prompt: &str) -> Result<String, ToolError>;
}

/// The fixed set of built-in tools bound to their host collaborators.
pub struct ToolCatalog {
    specs: Vec<ToolSpec>,
    registry: Arc<dyn AgentRegistry>,
    vault: Arc<dyn VaultReader>,
    notifier: Arc<dyn Notifier>,
    path_match: PathMatch,
}

impl ToolCatalog {
    pub fn new(
        registry: Arc<dyn AgentRegistry>,
        vault: Arc<dyn VaultReader>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            specs: builtin_specs(),
            registry,
            vault,
            notifier,
            path_match: PathMatch::default(),
        }
    }

    /// Use a different path allowlist matching mode.
    pub fn with_path_match(mut self, mode: PathMatch) -> Self {
        self.path_match = mode;
        self
    }

    /// Every tool, regardless of agent.
    pub fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    /// The tools `agent` may invoke, in catalog order.
    pub fn definitions_for(&self, agent: &Agent) -> Vec<ToolSpec> {
        self.specs
            .iter()
            .filter(|spec| agent.has_tool(&spec.name))
            .cloned()
            .collect()
    }

    /// Execute a tool call for `agent`. Never fails: errors come back as
    /// result text for the model.
    pub async fn execute(&self, call: &ToolCall, agent: &Agent, delegate: &dyn Delegate) -> String {
        match self.dispatch(call, agent, delegate).await {
            Ok(text) => text,
            Err(e) => {
                debug!(tool = %call.name, agent = %agent.id, error = %e, "tool failed");
                e.into_result_text()
            }
        }
    }

    fn policy(&self, agent: &Agent) -> Policy {
        Policy::new(agent.enabled_tools.iter().cloned(), &agent.allowed_paths)
            .with_path_match(self.path_match)
    }

    async fn dispatch(
        &self,
        call: &ToolCall,
        agent: &Agent,
        delegate: &dyn Delegate,
    ) -> Result<String, ToolError> {
        let policy = self.policy(agent);

        // The advertised schema is already filtered, but models can still
        // name a tool they were never offered.
        if let Decision::Deny { reason } = policy.check(&CapabilityRequest::tool(&call.name)) {
            warn!(tool = %call.name, agent = %agent.id, %reason, "tool denied");
            return Err(ToolError::ToolDenied {
                agent: agent.name.clone(),
                tool: call.name.clone(),
            });
        }

        match call.name.as_str() {
            GET_CURRENT_TIME => Ok(current_time()),
            READ_VAULT_FILE => self.read_vault_file(call, agent, &policy).await,
            CALL_AGENT => self.call_agent(call, delegate).await,
            SEND_NOTIFICATION => self.send_notification(call).await,
            other => Err(ToolError::UnknownTool(other.to_string())),
        }
    }

    async fn read_vault_file(
        &self,
        call: &ToolCall,
        agent: &Agent,
        policy: &Policy,
    ) -> Result<String, ToolError> {
        let path = required_arg(call, "path")?;

        if let Decision::Deny { reason } = policy.check(&CapabilityRequest::vault_read(&path)) {
            warn!(agent = %agent.id, %reason, "vault read denied");
            return Err(ToolError::PathDenied {
                agent: agent.name.clone(),
                path,
            });
        }

        match self.vault.read(&normalize_path(&path)).await {
            Ok(text) => Ok(text),
            Err(VaultError::NotFound(_)) => Err(ToolError::FileNotFound(path)),
            Err(VaultError::Io { source, .. }) => Err(ToolError::Read {
                path,
                message: source.to_string(),
            }),
        }
    }

    async fn call_agent(&self, call: &ToolCall, delegate: &dyn Delegate) -> Result<String, ToolError> {
        let id = required_arg(call, "agentId")?;
        let prompt = required_arg(call, "prompt")?;

        let Some(target) = self.registry.agent(&AgentId::from(id.as_str())) else {
            let available = self
                .registry
                .agents()
                .iter()
                .map(|a| format!("\"{}\" (id: {})", a.name, a.id))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ToolError::UnknownAgent { id, available });
        };

        let content = delegate.delegate(&target, &prompt).await?;
        Ok(format!("Response from {}: {content}", target.name))
    }

    async fn send_notification(&self, call: &ToolCall) -> Result<String, ToolError> {
        let title = non_empty_arg(call, "title").unwrap_or_else(|| DEFAULT_NOTIFICATION_TITLE.into());
        let body = non_empty_arg(call, "body").unwrap_or_else(|| DEFAULT_NOTIFICATION_BODY.into());

        let delivery = self.notifier.notify(&title, &body).await?;
        Ok(delivery.confirmation().to_string())
    }
}

/// Local time, formatted like `1/2/2025, 3:04:05 PM`.
fn current_time() -> String {
    chrono::Local::now()
        .format("%-m/%-d/%Y, %-I:%M:%S %p")
        .to_string()
}

fn required_arg(call: &ToolCall, arg: &str) -> Result<String, ToolError> {
    call.text_arg(arg).ok_or_else(|| ToolError::MissingArgument {
        tool: call.name.clone(),
        arg: arg.to_string(),
    })
}

fn non_empty_arg(call: &ToolCall, arg: &str) -> Option<String> {
    call.text_arg(arg).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{EchoDelegate, MemoryVault, RecordingNotifier};
    use serde_json::json;
    use storage::DEFAULT_TOOLS;

    fn agent(tools: &[&str], paths: &str) -> Agent {
        Agent::new("Scout", "You scout.", "llama3")
            .with_tools(tools.iter().copied())
            .with_allowed_paths(paths)
    }

    fn catalog_with(agents: Vec<Agent>) -> (ToolCatalog, Arc<RecordingNotifier>) {
        let notifier = Arc::new(RecordingNotifier::delivering(Delivery::Sent));
        let vault = MemoryVault::new([
            ("Project/notes.md", "project notes"),
            ("Journal/today.md", "dear diary"),
        ]);
        let catalog = ToolCatalog::new(Arc::new(agents), Arc::new(vault), notifier.clone());
        (catalog, notifier)
    }

    async fn run(catalog: &ToolCatalog, agent: &Agent, name: &str, args: serde_json::Value) -> String {
        catalog
            .execute(&ToolCall::new(name, args), agent, &EchoDelegate)
            .await
    }

    #[test]
    fn no_tools_means_no_definitions() {
        let (catalog, _) = catalog_with(Vec::new());
        assert!(catalog.definitions_for(&agent(&[], "")).is_empty());
    }

    #[test]
    fn definitions_follow_catalog_order() {
        let (catalog, _) = catalog_with(Vec::new());
        let specs = catalog.definitions_for(&agent(&[SEND_NOTIFICATION, GET_CURRENT_TIME, "bogus"], ""));
        let names: Vec<_> = specs.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, [GET_CURRENT_TIME, SEND_NOTIFICATION]);
    }

    #[test]
    fn catalog_covers_default_tools() {
        let (catalog, _) = catalog_with(Vec::new());
        let names: Vec<_> = catalog.specs().iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, DEFAULT_TOOLS);
    }

    #[tokio::test]
    async fn agent_without_tools_is_denied_everything() {
        let (catalog, notifier) = catalog_with(Vec::new());
        let scout = agent(&[], "");
        for name in [GET_CURRENT_TIME, READ_VAULT_FILE, CALL_AGENT, SEND_NOTIFICATION, "launch_rockets"] {
            let result = run(&catalog, &scout, name, json!({})).await;
            assert_eq!(
                result,
                format!("Error: Agent \"Scout\" does not have permission to use the \"{name}\" tool.")
            );
        }
        assert!(notifier.sent().is_empty());
    }

    #[tokio::test]
    async fn unknown_tool_is_reported() {
        let (catalog, _) = catalog_with(Vec::new());
        let scout = agent(&["launch_rockets"], "");
        let result = run(&catalog, &scout, "launch_rockets", json!({})).await;
        assert_eq!(result, "Error: Unknown tool \"launch_rockets\"");
    }

    #[tokio::test]
    async fn current_time_is_formatted() {
        let (catalog, _) = catalog_with(Vec::new());
        let result = run(&catalog, &agent(&[GET_CURRENT_TIME], ""), GET_CURRENT_TIME, json!({})).await;
        assert!(result.contains(", "), "{result}");
        assert!(result.ends_with("AM") || result.ends_with("PM"), "{result}");
    }

    #[tokio::test]
    async fn read_vault_file_respects_allowlist() {
        let (catalog, _) = catalog_with(Vec::new());
        let scout = agent(&[READ_VAULT_FILE], "Project");

        let ok = run(&catalog, &scout, READ_VAULT_FILE, json!({"path": "Project/notes.md"})).await;
        assert_eq!(ok, "project notes");

        let denied = run(&catalog, &scout, READ_VAULT_FILE, json!({"path": "Journal/today.md"})).await;
        assert_eq!(
            denied,
            "Error: Agent \"Scout\" does not have permission to access the path \"Journal/today.md\"."
        );
    }

    #[tokio::test]
    async fn read_vault_file_normalizes_and_reports_missing() {
        let (catalog, _) = catalog_with(Vec::new());
        let scout = agent(&[READ_VAULT_FILE], "");

        let ok = run(&catalog, &scout, READ_VAULT_FILE, json!({"path": "/Project//notes.md"})).await;
        assert_eq!(ok, "project notes");

        let missing = run(&catalog, &scout, READ_VAULT_FILE, json!({"path": "Nope.md"})).await;
        assert_eq!(missing, "Error: File not found at path \"Nope.md\"");

        let no_arg = run(&catalog, &scout, READ_VAULT_FILE, json!({})).await;
        assert_eq!(
            no_arg,
            "Error: Missing required argument \"path\" for tool \"read_vault_file\"."
        );
    }

    #[tokio::test]
    async fn segment_mode_blocks_sibling_prefixes() {
        let (catalog, _) = catalog_with(Vec::new());
        let catalog = catalog.with_path_match(PathMatch::Segment);
        let scout = agent(&[READ_VAULT_FILE], "Proj");
        let result = run(&catalog, &scout, READ_VAULT_FILE, json!({"path": "Project/notes.md"})).await;
        assert!(result.contains("does not have permission to access the path"));
    }

    #[tokio::test]
    async fn call_agent_unknown_id_lists_every_agent() {
        let writer = Agent::new("Writer", "", "llama3");
        let default = Agent::default_assistant();
        let (catalog, _) = catalog_with(vec![default.clone(), writer.clone()]);

        let result = run(
            &catalog,
            &agent(&[CALL_AGENT], ""),
            CALL_AGENT,
            json!({"agentId": "ghost", "prompt": "hello"}),
        )
        .await;

        assert!(result.starts_with("Error: Agent with ID \"ghost\" not found. Available agents: "));
        assert!(result.contains("\"General Assistant\" (id: default-assistant)"));
        assert!(result.contains(&format!("\"Writer\" (id: {})", writer.id)));
    }

    #[tokio::test]
    async fn call_agent_prefixes_target_name() {
        let writer = Agent::new("Writer", "", "llama3");
        let (catalog, _) = catalog_with(vec![writer.clone()]);

        let result = run(
            &catalog,
            &agent(&[CALL_AGENT], ""),
            CALL_AGENT,
            json!({"agentId": writer.id.as_str(), "prompt": "draft a haiku"}),
        )
        .await;
        assert_eq!(result, "Response from Writer: echo: draft a haiku");
    }

    #[tokio::test]
    async fn notification_defaults_missing_fields() {
        let (catalog, notifier) = catalog_with(Vec::new());
        let scout = agent(&[SEND_NOTIFICATION], "");

        let result = run(&catalog, &scout, SEND_NOTIFICATION, json!({"title": ""})).await;
        assert_eq!(result, "Persistent notification sent.");
        assert_eq!(
            notifier.sent(),
            [(DEFAULT_NOTIFICATION_TITLE.to_string(), DEFAULT_NOTIFICATION_BODY.to_string())]
        );
    }

    #[tokio::test]
    async fn notification_host_states_become_text() {
        let scout = agent(&[SEND_NOTIFICATION], "");
        let args = json!({"title": "Done", "body": "All finished."});
        let cases = [
            (
                RecordingNotifier::delivering(Delivery::SentAfterGrant),
                "Persistent notification sent after permission grant.",
            ),
            (
                RecordingNotifier::failing(NotifyError::Denied),
                "Error: Notification permission denied.",
            ),
            (
                RecordingNotifier::failing(NotifyError::Unsupported),
                "Error: System notifications are not supported.",
            ),
            (
                RecordingNotifier::failing(NotifyError::Failed("bus closed".into())),
                "Error triggering notification: bus closed",
            ),
        ];

        for (notifier, expected) in cases {
            let catalog = ToolCatalog::new(
                Arc::new(Vec::<Agent>::new()),
                Arc::new(EmptyVault),
                Arc::new(notifier),
            );
            assert_eq!(run(&catalog, &scout, SEND_NOTIFICATION, args.clone()).await, expected);
        }
    }

    #[tokio::test]
    async fn no_notifier_is_unsupported() {
        let catalog = ToolCatalog::new(
            Arc::new(Vec::<Agent>::new()),
            Arc::new(EmptyVault),
            Arc::new(NoNotifier),
        );
        let result = run(
            &catalog,
            &agent(&[SEND_NOTIFICATION], ""),
            SEND_NOTIFICATION,
            json!({"title": "t", "body": "b"}),
        )
        .await;
        assert_eq!(result, "Error: System notifications are not supported.");
    }
}
