//! Ollama backend.

use crate::model::{Backend, Message, ModelError, ModelRequest, Role, ToolCall, ToolSpec};
use async_trait::async_trait;
use reqwest::Response;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use storage::DEFAULT_MODEL;
use tracing::debug;

// ─────────────────────────────────────────────────────────────────────────────
// API Wire Types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct ApiChatRequest<'a> {
    model: &'a str,
    messages: Vec<ApiMessage<'a>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tools: Vec<ApiTool<'a>>,
    stream: bool,
}

#[derive(Debug, Serialize)]
struct ApiMessage<'a> {
    role: &'static str,
    content: &'a str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    tool_calls: Vec<ApiToolCall<'a>>,
}

#[derive(Debug, Serialize)]
struct ApiToolCall<'a> {
    function: ApiFunctionCall<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunctionCall<'a> {
    name: &'a str,
    arguments: &'a Value,
}

#[derive(Debug, Serialize)]
struct ApiTool<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    function: ApiFunction<'a>,
}

#[derive(Debug, Serialize)]
struct ApiFunction<'a> {
    name: &'a str,
    description: &'a str,
    parameters: &'a Value,
}

#[derive(Debug, Deserialize)]
struct ApiChatResponse {
    message: ApiResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ApiResponseMessage {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tool_calls: Vec<ApiResponseToolCall>,
}

#[derive(Debug, Deserialize)]
struct ApiResponseToolCall {
    function: ApiResponseFunction,
}

#[derive(Debug, Deserialize)]
struct ApiResponseFunction {
    name: String,
    #[serde(default)]
    arguments: Value,
}

#[derive(Debug, Deserialize)]
struct ApiTagsResponse {
    #[serde(default)]
    models: Vec<ModelSummary>,
}

#[derive(Debug, Serialize)]
struct ApiShowRequest<'a> {
    name: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiShowResponse {
    #[serde(default)]
    template: String,
    #[serde(default)]
    details: ApiModelDetails,
    #[serde(default)]
    capabilities: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiModelDetails {
    #[serde(default)]
    family: Option<String>,
    #[serde(default)]
    families: Option<Vec<String>>,
}

/// A locally installed model.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelSummary {
    pub name: String,
    #[serde(default)]
    pub size: u64,
    #[serde(default)]
    pub modified_at: Option<String>,
}

/// Metadata reported for a single model.
#[derive(Debug, Clone)]
pub struct ModelInfo {
    pub name: String,
    pub families: Vec<String>,
    pub template: String,
    pub capabilities: Vec<String>,
}

impl ModelInfo {
    /// Whether the model advertises tool calling, either explicitly or
    /// through a prompt template that renders tools.
    pub fn supports_tools(&self) -> bool {
        self.capabilities.iter().any(|c| c == "tools") || self.template.contains(".Tools")
    }
}

/// Whether `model` is a placeholder to be swapped for an installed model.
pub fn needs_model_fallback(model: &str) -> bool {
    let model = model.trim();
    model.is_empty() || model == "llama3"
}

/// Pick a stand-in model: the first installed `llama3.2` variant, else the
/// first installed model, else [`DEFAULT_MODEL`].
pub fn fallback_model(installed: &[ModelSummary]) -> String {
    installed
        .iter()
        .find(|m| m.name.contains("llama3.2"))
        .or_else(|| installed.first())
        .map(|m| m.name.clone())
        .unwrap_or_else(|| DEFAULT_MODEL.to_string())
}

// ─────────────────────────────────────────────────────────────────────────────
// Backend Implementation
// ─────────────────────────────────────────────────────────────────────────────

/// Builder for creating an Ollama backend.
#[derive(Debug, Clone)]
pub struct OllamaBackendBuilder {
    base_url: String,
    timeout: Option<Duration>,
}

impl OllamaBackendBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout: None,
        }
    }

    /// Bound each HTTP request. Unset means no client-side timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn build(self) -> Result<OllamaBackend, ModelError> {
        let mut client = reqwest::Client::builder();
        if let Some(timeout) = self.timeout {
            client = client.timeout(timeout);
        }
        let client = client
            .build()
            .map_err(|e| ModelError::Config(e.to_string()))?;

        Ok(OllamaBackend {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
        })
    }
}

/// Ollama HTTP backend.
pub struct OllamaBackend {
    client: reqwest::Client,
    base_url: String,
}

impl OllamaBackend {
    pub fn builder(base_url: impl Into<String>) -> OllamaBackendBuilder {
        OllamaBackendBuilder::new(base_url)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// List installed models.
    pub async fn list_models(&self) -> Result<Vec<ModelSummary>, ModelError> {
        let response = self
            .client
            .get(format!("{}/api/tags", self.base_url))
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let tags: ApiTagsResponse = Self::decode(response).await?;
        Ok(tags.models)
    }

    /// Fetch metadata for one model.
    pub async fn show_model(&self, name: &str) -> Result<ModelInfo, ModelError> {
        let response = self
            .client
            .post(format!("{}/api/show", self.base_url))
            .json(&ApiShowRequest { name })
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let show: ApiShowResponse = Self::decode(response).await?;
        let families = match (show.details.families, show.details.family) {
            (Some(families), _) => families,
            (None, Some(family)) => vec![family],
            (None, None) => Vec::new(),
        };

        Ok(ModelInfo {
            name: name.to_string(),
            families,
            template: show.template,
            capabilities: show.capabilities,
        })
    }

    /// Resolve a placeholder model against what the server has installed.
    ///
    /// Returns `None` when `model` names a real model and needs no lookup.
    pub async fn resolve_model(&self, model: &str) -> Result<Option<String>, ModelError> {
        if !needs_model_fallback(model) {
            return Ok(None);
        }
        let installed = self.list_models().await?;
        Ok(Some(fallback_model(&installed)))
    }

    async fn decode<T: serde::de::DeserializeOwned>(response: Response) -> Result<T, ModelError> {
        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ModelError::Api(format!("{status}: {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| ModelError::InvalidResponse(e.to_string()))
    }

    fn message_to_api(msg: &Message) -> ApiMessage<'_> {
        ApiMessage {
            role: msg.role.as_str(),
            content: &msg.content,
            tool_calls: msg
                .tool_calls
                .iter()
                .map(|call| ApiToolCall {
                    function: ApiFunctionCall {
                        name: &call.name,
                        arguments: &call.arguments,
                    },
                })
                .collect(),
        }
    }

    fn tool_to_api(spec: &ToolSpec) -> ApiTool<'_> {
        ApiTool {
            kind: "function",
            function: ApiFunction {
                name: &spec.name,
                description: &spec.description,
                parameters: &spec.schema,
            },
        }
    }

    fn chat_request<'a>(request: &ModelRequest<'a>) -> ApiChatRequest<'a> {
        ApiChatRequest {
            model: request.model,
            messages: request.messages.iter().map(Self::message_to_api).collect(),
            tools: request.tools.iter().map(Self::tool_to_api).collect(),
            stream: false,
        }
    }

    fn response_to_message(message: ApiResponseMessage) -> Message {
        let calls = message
            .tool_calls
            .into_iter()
            .map(|call| ToolCall {
                name: call.function.name,
                arguments: Self::arguments_object(call.function.arguments),
            })
            .collect();

        Message::new(Role::Assistant, message.content).with_tool_calls(calls)
    }

    /// Some models emit arguments as a JSON-encoded string instead of an
    /// object. Decode those; anything else is passed through.
    fn arguments_object(arguments: Value) -> Value {
        match arguments {
            Value::String(raw) => serde_json::from_str(&raw).unwrap_or(Value::String(raw)),
            Value::Null => Value::Object(Default::default()),
            other => other,
        }
    }
}

impl std::fmt::Display for OllamaBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ollama({})", self.base_url)
    }
}

#[async_trait]
impl Backend for OllamaBackend {
    async fn chat(&self, request: ModelRequest<'_>) -> Result<Message, ModelError> {
        let api_request = Self::chat_request(&request);
        debug!(
            model = request.model,
            messages = request.messages.len(),
            tools = request.tools.len(),
            "ollama chat request"
        );

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .header("content-type", "application/json")
            .json(&api_request)
            .send()
            .await
            .map_err(|e| ModelError::Network(e.to_string()))?;

        let api_response: ApiChatResponse = Self::decode(response).await?;
        Ok(Self::response_to_message(api_response.message))
    }
}
