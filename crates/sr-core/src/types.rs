use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Complexity tier, ordered from cheapest to most capable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Tier {
    Simple = 0,
    Medium = 1,
    Complex = 2,
    Reasoning = 3,
}

impl Tier {
    pub const ALL: [Tier; 4] = [Tier::Simple, Tier::Medium, Tier::Complex, Tier::Reasoning];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Simple => "SIMPLE",
            Tier::Medium => "MEDIUM",
            Tier::Complex => "COMPLEX",
            Tier::Reasoning => "REASONING",
        }
    }

    pub fn rank(&self) -> u8 {
        *self as u8
    }

    /// Parse a tier label, ignoring case and surrounding whitespace.
    pub fn parse(label: &str) -> Option<Tier> {
        match label.trim().to_uppercase().as_str() {
            "SIMPLE" => Some(Tier::Simple),
            "MEDIUM" => Some(Tier::Medium),
            "COMPLEX" => Some(Tier::Complex),
            "REASONING" => Some(Tier::Reasoning),
            _ => None,
        }
    }

    /// Highest input cost (per million tokens) accepted by the cost fallback pass.
    pub fn cost_ceiling(&self) -> f64 {
        match self {
            Tier::Simple => 1.0,
            Tier::Medium => 5.0,
            Tier::Complex => 20.0,
            Tier::Reasoning => 50.0,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classifier outcome: a tier, or no tier when confidence is too low.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierVerdict {
    Tier(Tier),
    Ambiguous,
}

impl TierVerdict {
    pub fn tier(&self) -> Option<Tier> {
        match self {
            TierVerdict::Tier(t) => Some(*t),
            TierVerdict::Ambiguous => None,
        }
    }

    pub fn is_ambiguous(&self) -> bool {
        matches!(self, TierVerdict::Ambiguous)
    }
}

impl fmt::Display for TierVerdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TierVerdict::Tier(t) => t.fmt(f),
            TierVerdict::Ambiguous => f.write_str("none"),
        }
    }
}

/// Token pricing, per million tokens.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelCost {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output: Option<f64>,
}

/// Capability and cost descriptor of a model served by a provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelInfo {
    #[serde(default)]
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default)]
    pub tool_call: bool,
    #[serde(default)]
    pub reasoning: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<ModelCost>,
    /// Every other descriptor field (`attachment`, `temperature`, `limit`, ...),
    /// kept at the top level as catalogs publish them.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl ModelInfo {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into(), ..Default::default() }
    }

    pub fn with_input_cost(mut self, input: f64) -> Self {
        self.cost.get_or_insert_with(ModelCost::default).input = Some(input);
        self
    }

    pub fn with_output_cost(mut self, output: f64) -> Self {
        self.cost.get_or_insert_with(ModelCost::default).output = Some(output);
        self
    }

    pub fn with_tool_call(mut self, enabled: bool) -> Self {
        self.tool_call = enabled;
        self
    }

    pub fn with_reasoning(mut self, enabled: bool) -> Self {
        self.reasoning = enabled;
        self
    }

    pub fn with_capability(mut self, name: impl Into<String>, enabled: bool) -> Self {
        self.extra.insert(name.into(), Value::Bool(enabled));
        self
    }

    /// Input cost per million tokens; `None` when unknown or not a finite number.
    pub fn input_cost(&self) -> Option<f64> {
        self.cost.as_ref().and_then(|c| c.input).filter(|c| c.is_finite())
    }

    /// Input cost used for ordering: unknown costs sort after every known one.
    pub fn sort_cost(&self) -> f64 {
        self.input_cost().unwrap_or(f64::INFINITY)
    }

    pub fn supports(&self, capability: &str) -> bool {
        match capability {
            "tool_call" => self.tool_call,
            "reasoning" => self.reasoning,
            other => self.extra.get(other).is_some_and(truthy),
        }
    }

    /// True when every capability marked `true` in `required` is present.
    pub fn meets(&self, required: &BTreeMap<String, bool>) -> bool {
        required.iter().all(|(cap, needed)| !*needed || self.supports(cap))
    }
}

fn truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}
