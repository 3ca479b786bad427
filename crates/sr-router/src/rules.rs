//! 14-dimension weighted classifier (plus the agentic-task dimension).

use crate::types::{Dimension, ScoringConfig, ScoringResult};
use regex::Regex;
use sr_core::{Tier, TierVerdict};
use std::collections::HashSet;
use std::sync::LazyLock;

static MULTI_STEP: LazyLock<Option<Regex>> = LazyLock::new(|| {
    Regex::new(r"(?i)first.*then|step \d|\d\.\s")
        .map_err(|e| tracing::error!(error = %e, "multi-step pattern failed to compile"))
        .ok()
});

/// Minimum confidence reported when the reasoning override fires.
pub const REASONING_OVERRIDE_CONFIDENCE: f64 = 0.85;

struct DimensionScore {
    dimension: Dimension,
    score: f64,
    signal: Option<String>,
}

impl DimensionScore {
    fn silent(dimension: Dimension, score: f64) -> Self {
        Self { dimension, score, signal: None }
    }

    fn signaled(dimension: Dimension, score: f64, signal: String) -> Self {
        Self { dimension, score, signal: Some(signal) }
    }
}

/// Match-count thresholds and the (none, low, high) scores of a keyword dimension.
struct KeywordRule {
    dimension: Dimension,
    label: &'static str,
    low: usize,
    high: usize,
    scores: (f64, f64, f64),
}

fn rule(dimension: Dimension, label: &'static str, low: usize, high: usize, scores: (f64, f64, f64)) -> KeywordRule {
    KeywordRule { dimension, label, low, high, scores }
}

/// Distinct keywords (case-insensitive) found in `text`, in list order.
fn matched_keywords<'a>(text: &str, keywords: &'a [String]) -> Vec<&'a str> {
    let mut seen = HashSet::new();
    keywords
        .iter()
        .filter(|kw| {
            let lower = kw.to_lowercase();
            !lower.is_empty() && text.contains(lower.as_str()) && seen.insert(lower)
        })
        .map(String::as_str)
        .collect()
}

fn top3(matches: &[&str]) -> String {
    matches.iter().take(3).copied().collect::<Vec<_>>().join(", ")
}

fn score_token_count(tokens: usize, config: &ScoringConfig) -> DimensionScore {
    let thresholds = config.token_count_thresholds;
    if tokens < thresholds.simple {
        DimensionScore::signaled(Dimension::TokenCount, -1.0, format!("short ({} tokens)", tokens))
    } else if tokens > thresholds.complex {
        DimensionScore::signaled(Dimension::TokenCount, 1.0, format!("long ({} tokens)", tokens))
    } else {
        DimensionScore::silent(Dimension::TokenCount, 0.0)
    }
}

fn score_keywords(text: &str, keywords: &[String], rule: &KeywordRule) -> DimensionScore {
    let matches = matched_keywords(text, keywords);
    let (none, low, high) = rule.scores;
    let score = if matches.len() >= rule.high {
        high
    } else if matches.len() >= rule.low {
        low
    } else {
        return DimensionScore::silent(rule.dimension, none);
    };
    DimensionScore::signaled(rule.dimension, score, format!("{} ({})", rule.label, top3(&matches)))
}

fn score_multi_step(text: &str) -> DimensionScore {
    let hit = MULTI_STEP.as_ref().is_some_and(|re| re.is_match(text));
    if hit {
        DimensionScore::signaled(Dimension::MultiStepPatterns, 0.5, "multi-step".into())
    } else {
        DimensionScore::silent(Dimension::MultiStepPatterns, 0.0)
    }
}

fn score_question_complexity(prompt: &str) -> DimensionScore {
    let count = prompt.matches('?').count();
    if count > 3 {
        DimensionScore::signaled(Dimension::QuestionComplexity, 0.5, format!("{} questions", count))
    } else {
        DimensionScore::silent(Dimension::QuestionComplexity, 0.0)
    }
}

fn score_agentic(text: &str, keywords: &[String]) -> DimensionScore {
    let matches = matched_keywords(text, keywords);
    let label = top3(&matches);
    match matches.len() {
        0 => DimensionScore::silent(Dimension::AgenticTask, 0.0),
        1 | 2 => DimensionScore::signaled(Dimension::AgenticTask, 0.2, format!("agentic-light ({})", label)),
        3 => DimensionScore::signaled(Dimension::AgenticTask, 0.6, format!("agentic ({})", label)),
        _ => DimensionScore::signaled(Dimension::AgenticTask, 1.0, format!("agentic ({})", label)),
    }
}

/// Logistic calibration: `1 / (1 + e^(-steepness * x))`.
pub fn sigmoid(x: f64, steepness: f64) -> f64 {
    1.0 / (1.0 + (-steepness * x).exp())
}

/// Map a weighted score onto a tier and its distance to the nearest edge of
/// that tier's interval.
pub fn tier_for_score(score: f64, config: &ScoringConfig) -> (Tier, f64) {
    let b = config.tier_boundaries;
    if score < b.simple_medium {
        (Tier::Simple, b.simple_medium - score)
    } else if score < b.medium_complex {
        (Tier::Medium, (score - b.simple_medium).min(b.medium_complex - score))
    } else if score < b.complex_reasoning {
        (Tier::Complex, (score - b.medium_complex).min(b.complex_reasoning - score))
    } else {
        (Tier::Reasoning, score - b.complex_reasoning)
    }
}

/// Classify by rules: weighted sum over every dimension, reasoning override,
/// boundary mapping and sigmoid-calibrated confidence.
pub fn classify_by_rules(
    prompt: &str,
    system_prompt: Option<&str>,
    estimated_tokens: usize,
    config: &ScoringConfig,
) -> ScoringResult {
    let text = format!("{} {}", system_prompt.unwrap_or(""), prompt).to_lowercase();
    let user_text = prompt.to_lowercase();

    let dimensions = [
        score_token_count(estimated_tokens, config),
        score_keywords(&text, &config.code_keywords, &rule(Dimension::CodePresence, "code", 1, 2, (0.0, 0.5, 1.0))),
        score_keywords(&user_text, &config.reasoning_keywords, &rule(Dimension::ReasoningMarkers, "reasoning", 1, 2, (0.0, 0.7, 1.0))),
        score_keywords(&text, &config.technical_keywords, &rule(Dimension::TechnicalTerms, "technical", 2, 4, (0.0, 0.5, 1.0))),
        score_keywords(&text, &config.creative_keywords, &rule(Dimension::CreativeMarkers, "creative", 1, 2, (0.0, 0.5, 0.7))),
        // Low and high both -1.0: any simple keyword drives this fully negative.
        score_keywords(&text, &config.simple_keywords, &rule(Dimension::SimpleIndicators, "simple", 1, 2, (0.0, -1.0, -1.0))),
        score_multi_step(&text),
        score_question_complexity(prompt),
        score_keywords(&text, &config.imperative_verbs, &rule(Dimension::ImperativeVerbs, "imperative", 1, 2, (0.0, 0.3, 0.5))),
        score_keywords(&text, &config.constraint_indicators, &rule(Dimension::ConstraintCount, "constraints", 1, 3, (0.0, 0.3, 0.7))),
        score_keywords(&text, &config.output_format_keywords, &rule(Dimension::OutputFormat, "format", 1, 2, (0.0, 0.4, 0.7))),
        score_keywords(&text, &config.reference_keywords, &rule(Dimension::ReferenceComplexity, "references", 1, 2, (0.0, 0.3, 0.5))),
        score_keywords(&text, &config.negation_keywords, &rule(Dimension::NegationComplexity, "negation", 2, 3, (0.0, 0.3, 0.5))),
        score_keywords(&text, &config.domain_specific_keywords, &rule(Dimension::DomainSpecificity, "domain-specific", 1, 2, (0.0, 0.5, 0.8))),
        score_agentic(&text, &config.agentic_task_keywords),
    ];

    let agentic_score = dimensions
        .iter()
        .find(|d| d.dimension == Dimension::AgenticTask)
        .map(|d| d.score)
        .unwrap_or(0.0);

    let signals: Vec<String> = dimensions.iter().filter_map(|d| d.signal.clone()).collect();

    let mut weighted_score = 0.0;
    for d in &dimensions {
        weighted_score += d.score * config.weight(d.dimension);
    }

    // Reasoning override
    if matched_keywords(&user_text, &config.reasoning_keywords).len() >= 2 {
        let confidence = sigmoid(weighted_score.max(0.3), config.confidence_steepness)
            .max(REASONING_OVERRIDE_CONFIDENCE);
        return ScoringResult {
            score: weighted_score,
            verdict: TierVerdict::Tier(Tier::Reasoning),
            confidence,
            signals,
            agentic_score,
        };
    }

    let (tier, distance) = tier_for_score(weighted_score, config);
    let confidence = sigmoid(distance, config.confidence_steepness);
    let verdict = if confidence < config.confidence_threshold {
        TierVerdict::Ambiguous
    } else {
        TierVerdict::Tier(tier)
    };

    ScoringResult { score: weighted_score, verdict, confidence, signals, agentic_score }
}
