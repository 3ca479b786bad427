use crate::types::Tier;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Message role. Roles the router has no use for (`developer`, `function`,
/// ...) are kept verbatim in `Other`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
    Other(String),
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
            Role::Other(name) => name,
        }
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        match name.as_str() {
            "system" => Role::System,
            "user" => Role::User,
            "assistant" => Role::Assistant,
            "tool" => Role::Tool,
            _ => Role::Other(name),
        }
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        match role {
            Role::Other(name) => name,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One part of a multi-part message body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentPart {
    #[serde(rename = "type")]
    pub part_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContentPart {
    pub fn text(content: impl Into<String>) -> Self {
        Self { part_type: "text".into(), text: Some(content.into()), extra: Map::new() }
    }
}

/// Message body: plain text, a list of typed parts, or `null` (assistant
/// turns that only carry tool calls).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    Text(String),
    Parts(Vec<ContentPart>),
    Null,
}

impl Default for MessageContent {
    fn default() -> Self {
        MessageContent::Text(String::new())
    }
}

impl MessageContent {
    /// Plain text of the body; text parts are joined with a single space.
    pub fn text(&self) -> String {
        match self {
            MessageContent::Text(s) => s.clone(),
            MessageContent::Parts(parts) => parts
                .iter()
                .filter(|p| p.part_type == "text")
                .map(|p| p.text.as_deref().unwrap_or(""))
                .collect::<Vec<_>>()
                .join(" "),
            MessageContent::Null => String::new(),
        }
    }
}

/// A chat message. `tool_calls`, `tool_call_id`, `name` and anything else
/// travel untouched in `extra`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    #[serde(default)]
    pub content: MessageContent,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: MessageContent::Text(content.into()), extra: Map::new() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }
}

/// Chat-completion request. Fields the router does not read travel in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatRequest {
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<Value>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatRequest {
    pub fn new(model: impl Into<String>, messages: Vec<ChatMessage>) -> Self {
        Self { model: model.into(), messages, ..Default::default() }
    }

    pub fn with_tools(mut self, tools: Vec<Value>) -> Self {
        self.tools = tools;
        self
    }

    pub fn has_tools(&self) -> bool {
        !self.tools.is_empty()
    }

    /// Text of the most recent user message, or an empty string.
    pub fn last_user_prompt(&self) -> String {
        self.messages
            .iter()
            .rev()
            .find(|m| m.role == Role::User)
            .map(|m| m.content.text())
            .unwrap_or_default()
    }

    /// Text of the first system message, if any.
    pub fn system_prompt(&self) -> Option<String> {
        self.messages
            .iter()
            .find(|m| m.role == Role::System)
            .map(|m| m.content.text())
    }
}

/// Routing annotation attached to a routed response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingMetadata {
    pub tier: Tier,
    pub confidence: f64,
    pub score: f64,
    pub provider: String,
    pub model: String,
    pub agentic: bool,
    pub signals: Vec<String>,
    pub pinned: bool,
    /// 1-based index of the attempt that succeeded.
    pub attempts: usize,
    pub reasoning: String,
}

/// Chat-completion response body as returned by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatResponse {
    #[serde(flatten)]
    pub body: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routing: Option<RoutingMetadata>,
}

impl ChatResponse {
    pub fn new(body: Map<String, Value>) -> Self {
        Self { body, routing: None }
    }

    /// Content of the first choice's message, if the body has the usual shape.
    pub fn content(&self) -> Option<&str> {
        self.body
            .get("choices")?
            .get(0)?
            .get("message")?
            .get("content")?
            .as_str()
    }
}
