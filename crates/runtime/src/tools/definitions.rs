//! Built-in tool schemas.
//!
//! Property names (`path`, `agentId`, `prompt`, `title`, `body`) are what
//! models are steered toward; renaming them breaks argument matching.

use crate::model::ToolSpec;
use serde_json::json;

pub const GET_CURRENT_TIME: &str = "get_current_time";
pub const READ_VAULT_FILE: &str = "read_vault_file";
pub const CALL_AGENT: &str = "call_agent";
pub const SEND_NOTIFICATION: &str = "send_notification";

/// Every built-in tool, in advertising order.
pub fn builtin_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec {
            name: GET_CURRENT_TIME.to_string(),
            description: "Get the current date and time.".to_string(),
            schema: json!({
                "type": "object",
                "properties": {},
                "required": []
            }),
        },
        ToolSpec {
            name: READ_VAULT_FILE.to_string(),
            description: "Read the content of a file from the vault.".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "path": {
                        "type": "string",
                        "description": "The relative path to the file in the vault (e.g., 'Folder/Note.md')."
                    }
                },
                "required": ["path"]
            }),
        },
        ToolSpec {
            name: CALL_AGENT.to_string(),
            description: "Ask another AI agent for help or specific information.".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "agentId": {
                        "type": "string",
                        "description": "The ID of the agent to call."
                    },
                    "prompt": {
                        "type": "string",
                        "description": "The question or task for the other agent."
                    }
                },
                "required": ["agentId", "prompt"]
            }),
        },
        ToolSpec {
            name: SEND_NOTIFICATION.to_string(),
            description: "Show a persistent system-level notification. Use this to make sure the user sees an important message even when the app is not in focus.".to_string(),
            schema: json!({
                "type": "object",
                "properties": {
                    "title": {
                        "type": "string",
                        "description": "A very SHORT title for the notification (e.g. 'Project Update')."
                    },
                    "body": {
                        "type": "string",
                        "description": "The COMPLETE and DETAILED message text to show in the notification. Do NOT leave this empty."
                    }
                },
                "required": ["title", "body"]
            }),
        },
    ]
}
