use crate::types::{ModelInfo, Tier};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Reserved context key holding the [`SelectionPin`].
pub const PIN_KEY: &str = "_smart_routing_selection";
/// Informational key: id of the provider serving the current attempt.
pub const PROVIDER_KEY: &str = "provider";
/// Informational key: descriptor of the model serving the current attempt.
pub const MODEL_INFO_KEY: &str = "modelInfo";
/// Informational key: cost block of the model serving the current attempt.
pub const MODEL_COST_KEY: &str = "modelCost";

/// Sticky routing choice for the rest of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectionPin {
    pub provider: String,
    pub model: String,
    pub tier: Tier,
    pub confidence: f64,
    pub agentic: bool,
}

/// Opaque key/value carrier threaded through a multi-turn conversation.
///
/// The router only touches [`PIN_KEY`] and the informational keys; everything
/// else belongs to the host.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConversationContext {
    entries: Map<String, Value>,
}

impl ConversationContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) -> Option<Value> {
        self.entries.insert(key.into(), value)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.entries.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The recorded pin; a malformed entry reads as no pin.
    pub fn pin(&self) -> Option<SelectionPin> {
        self.entries
            .get(PIN_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }

    pub fn set_pin(&mut self, pin: &SelectionPin) {
        match serde_json::to_value(pin) {
            Ok(v) => {
                self.entries.insert(PIN_KEY.into(), v);
            }
            Err(e) => tracing::warn!(error = %e, "failed to encode selection pin"),
        }
    }

    pub fn clear_pin(&mut self) -> Option<SelectionPin> {
        self.entries
            .remove(PIN_KEY)
            .and_then(|v| serde_json::from_value(v).ok())
    }

    pub fn provider(&self) -> Option<&str> {
        self.entries.get(PROVIDER_KEY).and_then(Value::as_str)
    }

    /// Record which provider and model are about to serve the conversation.
    pub fn set_current_target(&mut self, provider: &str, info: Option<&ModelInfo>) {
        self.entries.insert(PROVIDER_KEY.into(), Value::String(provider.to_string()));
        let Some(info) = info else { return };
        match serde_json::to_value(info) {
            Ok(v) => {
                self.entries.insert(MODEL_INFO_KEY.into(), v);
            }
            Err(e) => tracing::warn!(error = %e, model = %info.id, "failed to encode model info"),
        }
        let cost = info.cost.clone().unwrap_or_default();
        let cost = serde_json::json!({
            "input": cost.input.unwrap_or(0.0),
            "output": cost.output.unwrap_or(0.0),
        });
        self.entries.insert(MODEL_COST_KEY.into(), cost);
    }

    pub fn model_info(&self) -> Option<ModelInfo> {
        self.entries
            .get(MODEL_INFO_KEY)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}
