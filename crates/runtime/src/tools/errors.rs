use super::notify::NotifyError;
use thiserror::Error;

/// A tool-level failure.
///
/// These never abort a run. They are rendered to text with
/// [`ToolError::into_result_text`] and handed back to the model as the
/// tool's result so it can recover.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Agent \"{agent}\" does not have permission to use the \"{tool}\" tool.")]
    ToolDenied { agent: String, tool: String },

    #[error("Agent \"{agent}\" does not have permission to access the path \"{path}\".")]
    PathDenied { agent: String, path: String },

    #[error("File not found at path \"{0}\"")]
    FileNotFound(String),

    #[error("Failed to read \"{path}\": {message}")]
    Read { path: String, message: String },

    #[error("Unknown tool \"{0}\"")]
    UnknownTool(String),

    #[error("Missing required argument \"{arg}\" for tool \"{tool}\".")]
    MissingArgument { tool: String, arg: String },

    #[error("Agent with ID \"{id}\" not found. Available agents: {available}")]
    UnknownAgent { id: String, available: String },

    #[error("Delegation depth limit ({limit}) reached; agent \"{agent}\" was not called.")]
    DepthExceeded { limit: usize, agent: String },

    #[error("No response from {0}")]
    NoResponse(String),

    #[error("agent {agent} failed: {message}")]
    Delegation { agent: String, message: String },

    #[error(transparent)]
    Notify(#[from] NotifyError),
}

impl ToolError {
    /// The text fed back to the model.
    pub fn into_result_text(self) -> String {
        match self {
            Self::Delegation { agent, message } => {
                format!("Error calling agent {agent}: {message}")
            }
            Self::Notify(NotifyError::Failed(message)) => {
                format!("Error triggering notification: {message}")
            }
            other => format!("Error: {other}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn permission_text() {
        let err = ToolError::ToolDenied {
            agent: "Scout".into(),
            tool: "call_agent".into(),
        };
        assert_eq!(
            err.into_result_text(),
            "Error: Agent \"Scout\" does not have permission to use the \"call_agent\" tool."
        );
    }

    #[test]
    fn delegation_and_notify_failures_have_own_prefix() {
        let err = ToolError::Delegation {
            agent: "Writer".into(),
            message: "network: refused".into(),
        };
        assert_eq!(err.into_result_text(), "Error calling agent Writer: network: refused");

        let err = ToolError::from(NotifyError::Failed("dbus down".into()));
        assert_eq!(err.into_result_text(), "Error triggering notification: dbus down");

        let err = ToolError::from(NotifyError::Denied);
        assert_eq!(err.into_result_text(), "Error: Notification permission denied.");
    }
}
