use serde::{Deserialize, Serialize};
use sr_core::{ModelInfo, Tier, TierVerdict};
use std::collections::BTreeMap;
use std::fmt;

/// Scoring dimension, in evaluation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dimension {
    TokenCount,
    CodePresence,
    ReasoningMarkers,
    TechnicalTerms,
    CreativeMarkers,
    SimpleIndicators,
    MultiStepPatterns,
    QuestionComplexity,
    ImperativeVerbs,
    ConstraintCount,
    OutputFormat,
    ReferenceComplexity,
    NegationComplexity,
    DomainSpecificity,
    AgenticTask,
}

impl Dimension {
    pub const ALL: [Dimension; 15] = [
        Dimension::TokenCount,
        Dimension::CodePresence,
        Dimension::ReasoningMarkers,
        Dimension::TechnicalTerms,
        Dimension::CreativeMarkers,
        Dimension::SimpleIndicators,
        Dimension::MultiStepPatterns,
        Dimension::QuestionComplexity,
        Dimension::ImperativeVerbs,
        Dimension::ConstraintCount,
        Dimension::OutputFormat,
        Dimension::ReferenceComplexity,
        Dimension::NegationComplexity,
        Dimension::DomainSpecificity,
        Dimension::AgenticTask,
    ];

    /// Key used in `dimensionWeights`.
    pub fn as_str(&self) -> &'static str {
        match self {
            Dimension::TokenCount => "tokenCount",
            Dimension::CodePresence => "codePresence",
            Dimension::ReasoningMarkers => "reasoningMarkers",
            Dimension::TechnicalTerms => "technicalTerms",
            Dimension::CreativeMarkers => "creativeMarkers",
            Dimension::SimpleIndicators => "simpleIndicators",
            Dimension::MultiStepPatterns => "multiStepPatterns",
            Dimension::QuestionComplexity => "questionComplexity",
            Dimension::ImperativeVerbs => "imperativeVerbs",
            Dimension::ConstraintCount => "constraintCount",
            Dimension::OutputFormat => "outputFormat",
            Dimension::ReferenceComplexity => "referenceComplexity",
            Dimension::NegationComplexity => "negationComplexity",
            Dimension::DomainSpecificity => "domainSpecificity",
            Dimension::AgenticTask => "agenticTask",
        }
    }

    pub fn parse(name: &str) -> Option<Dimension> {
        Dimension::ALL.iter().copied().find(|d| d.as_str() == name)
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Token-count boundaries for the `tokenCount` dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenThresholds {
    pub simple: usize,
    pub complex: usize,
}

/// Ascending boundaries on the weighted-score axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TierBoundaries {
    pub simple_medium: f64,
    pub medium_complex: f64,
    pub complex_reasoning: f64,
}

/// Scoring config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringConfig {
    pub token_count_thresholds: TokenThresholds,
    pub code_keywords: Vec<String>,
    pub reasoning_keywords: Vec<String>,
    pub simple_keywords: Vec<String>,
    pub technical_keywords: Vec<String>,
    pub creative_keywords: Vec<String>,
    pub imperative_verbs: Vec<String>,
    pub constraint_indicators: Vec<String>,
    pub output_format_keywords: Vec<String>,
    pub reference_keywords: Vec<String>,
    pub negation_keywords: Vec<String>,
    pub domain_specific_keywords: Vec<String>,
    pub agentic_task_keywords: Vec<String>,
    pub dimension_weights: BTreeMap<String, f64>,
    pub tier_boundaries: TierBoundaries,
    pub confidence_steepness: f64,
    pub confidence_threshold: f64,
}

impl ScoringConfig {
    pub fn weight(&self, dimension: Dimension) -> f64 {
        self.dimension_weights.get(dimension.as_str()).copied().unwrap_or(0.0)
    }
}

/// Preferred models and capability requirements for one tier.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TierPreference {
    pub preferred_models: Vec<String>,
    #[serde(default)]
    pub capabilities: BTreeMap<String, bool>,
}

/// Tier → preference table.
pub type TierPreferences = BTreeMap<Tier, TierPreference>;

/// Overrides config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverridesConfig {
    pub max_tokens_force_complex: usize,
    pub structured_output_min_tier: Tier,
    pub ambiguous_default_tier: Tier,
    pub agentic_mode: bool,
}

/// Full routing config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouterConfig {
    pub scoring: ScoringConfig,
    pub overrides: OverridesConfig,
    pub tier_preferences: TierPreferences,
    pub agentic_preferences: TierPreferences,
}

/// Scoring result from classifier.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoringResult {
    pub score: f64,
    pub verdict: TierVerdict,
    pub confidence: f64,
    pub signals: Vec<String>,
    pub agentic_score: f64,
}

impl ScoringResult {
    pub fn tier(&self) -> Option<Tier> {
        self.verdict.tier()
    }
}

/// A concrete (provider, model) pair able to serve a request.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub provider: String,
    pub model: String,
    pub info: ModelInfo,
}

impl Candidate {
    pub fn new(provider: impl Into<String>, model: impl Into<String>, info: ModelInfo) -> Self {
        Self { provider: provider.into(), model: model.into(), info }
    }

    /// De-duplication key.
    pub fn key(&self) -> (&str, &str) {
        (&self.provider, &self.model)
    }
}
