//! Effective system prompt composition.

use storage::Agent;

const ORCHESTRATION_RULES: &str = "\
### Orchestration Rules:
1. Only call another agent if you cannot fulfill the user's request with your own knowledge or tools.
2. If the request is a simple follow-up you can answer yourself, do NOT call another agent.
3. When you call an agent, give it a specific, self-contained prompt.
4. **Action Mandate**: If the user asks you to perform an action (like sending a notification or reading a file), you MUST use the corresponding tool. Do NOT just describe the action in text.
5. **Notification Sequencing**: Do NOT call `send_notification` until you have gathered ALL the requested information. Read files and call other agents FIRST; send the notification only as the FINAL step, once the content is ready.
6. **Tool Precision**: Provide every required argument when calling a tool. Put the actual message text into the `body` argument.
    - Example: `send_notification(title: \"Task Done\", body: \"I finished reading the project file and summarized it.\")`
7. **Output Format**: Always answer the user in plain, conversational text. Do NOT format your final response as JSON.
8. You are aware of the following available agents:";

/// Build the system prompt sent ahead of every model call for `agent`.
///
/// `known` is the full registry; the acting agent itself is left out of the
/// listing so the model only sees delegation targets.
pub fn compose_system_prompt(agent: &Agent, known: &[Agent]) -> String {
    let others: Vec<String> = known
        .iter()
        .filter(|other| other.id != agent.id)
        .map(|other| format!("- {} (id: {})", other.name, other.id))
        .collect();

    let listing = if others.is_empty() {
        "- (none)".to_string()
    } else {
        others.join("\n")
    };

    format!("{}\n\n{ORCHESTRATION_RULES}\n{listing}", agent.system_prompt)
}
