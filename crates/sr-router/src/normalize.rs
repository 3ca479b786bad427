//! Config normalization: deep-merge an arbitrary JSON override onto the
//! defaults, then coerce every field back into its legal range.
//!
//! Normalization never fails. A field that is missing, mistyped or out of
//! range takes the fallback value instead.

use crate::types::*;
use serde_json::{Map, Value};
use sr_core::{RouteError, Tier};
use std::collections::BTreeMap;

/// Recursively merge `overlay` into `base`. Maps merge key by key; any other
/// value (lists included) replaces the base value wholesale.
pub fn deep_merge(base: Value, overlay: &Value) -> Value {
    let Value::Object(overlay) = overlay else {
        return base;
    };
    let mut merged = match base {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    for (key, value) in overlay {
        let next = match (merged.remove(key), value) {
            (Some(existing @ Value::Object(_)), Value::Object(_)) => deep_merge(existing, value),
            _ => value.clone(),
        };
        merged.insert(key.clone(), next);
    }
    Value::Object(merged)
}

/// Normalize a raw override structure into a fully valid config.
pub fn normalize_config(overrides: &Value) -> RouterConfig {
    let defaults = RouterConfig::default();
    match serde_json::to_value(&defaults) {
        Ok(base) => from_merged(&deep_merge(base, &canonical_tier_keys(overrides)), &defaults),
        Err(e) => {
            tracing::warn!(error = %e, "failed to encode default config; using defaults");
            defaults
        }
    }
}

impl RouterConfig {
    /// Parse JSON text and normalize it. Only malformed JSON is an error.
    pub fn from_json_str(raw: &str) -> Result<RouterConfig, RouteError> {
        let value: Value = serde_json::from_str(raw)?;
        Ok(normalize_config(&value))
    }

    /// Fully normalized form, suitable for re-emitting or persisting.
    pub fn to_json(&self) -> Result<Value, RouteError> {
        Ok(serde_json::to_value(self)?)
    }

    /// Apply `updates` on top of this config. Invalid update fields keep
    /// their current value.
    pub fn merged(&self, updates: &Value) -> RouterConfig {
        match serde_json::to_value(self) {
            Ok(base) => from_merged(&deep_merge(base, &canonical_tier_keys(updates)), self),
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode current config; update ignored");
                self.clone()
            }
        }
    }
}

/// Rewrite tier labels in the preference tables to their canonical form, so
/// `" simple"` merges onto the default `"SIMPLE"` entry.
fn canonical_tier_keys(overrides: &Value) -> Value {
    let Value::Object(root) = overrides else {
        return overrides.clone();
    };
    let mut out = root.clone();
    for field in ["tierPreferences", "agenticPreferences"] {
        let Some(Value::Object(table)) = root.get(field) else { continue };
        let mut canonical = Map::new();
        for (label, entry) in table {
            let key = Tier::parse(label).map_or_else(|| label.clone(), |t| t.as_str().to_string());
            let next = match canonical.remove(&key) {
                Some(existing) => deep_merge(existing, entry),
                None => entry.clone(),
            };
            canonical.insert(key, next);
        }
        out.insert(field.to_string(), Value::Object(canonical));
    }
    Value::Object(out)
}

fn from_merged(merged: &Value, fallback: &RouterConfig) -> RouterConfig {
    RouterConfig {
        scoring: scoring(merged.get("scoring"), &fallback.scoring),
        overrides: overrides(merged.get("overrides"), &fallback.overrides),
        tier_preferences: preferences(
            merged.get("tierPreferences"),
            &fallback.tier_preferences,
            "tierPreferences",
        ),
        agentic_preferences: preferences(
            merged.get("agenticPreferences"),
            &fallback.agentic_preferences,
            "agenticPreferences",
        ),
    }
}

fn scoring(value: Option<&Value>, def: &ScoringConfig) -> ScoringConfig {
    let empty = Map::new();
    let obj = value.and_then(Value::as_object).unwrap_or(&empty);
    let list = |key: &str, default: &[String]| sanitize_list(obj.get(key), default, key);

    let thresholds = obj.get("tokenCountThresholds").and_then(Value::as_object);
    let simple = coerce_usize(
        thresholds.and_then(|t| t.get("simple")),
        def.token_count_thresholds.simple,
        0,
        "tokenCountThresholds.simple",
    );
    let complex = coerce_usize(
        thresholds.and_then(|t| t.get("complex")),
        def.token_count_thresholds.complex,
        0,
        "tokenCountThresholds.complex",
    );

    let bounds = obj.get("tierBoundaries").and_then(Value::as_object);
    let bound = |key: &str, default: f64| {
        coerce_f64(bounds.and_then(|b| b.get(key)), default, |_| true, key)
    };
    let simple_medium = bound("simpleMedium", def.tier_boundaries.simple_medium);
    let medium_complex = bound("mediumComplex", def.tier_boundaries.medium_complex).max(simple_medium);
    let complex_reasoning = bound("complexReasoning", def.tier_boundaries.complex_reasoning).max(medium_complex);

    ScoringConfig {
        token_count_thresholds: TokenThresholds { simple, complex: complex.max(simple) },
        code_keywords: list("codeKeywords", &def.code_keywords),
        reasoning_keywords: list("reasoningKeywords", &def.reasoning_keywords),
        simple_keywords: list("simpleKeywords", &def.simple_keywords),
        technical_keywords: list("technicalKeywords", &def.technical_keywords),
        creative_keywords: list("creativeKeywords", &def.creative_keywords),
        imperative_verbs: list("imperativeVerbs", &def.imperative_verbs),
        constraint_indicators: list("constraintIndicators", &def.constraint_indicators),
        output_format_keywords: list("outputFormatKeywords", &def.output_format_keywords),
        reference_keywords: list("referenceKeywords", &def.reference_keywords),
        negation_keywords: list("negationKeywords", &def.negation_keywords),
        domain_specific_keywords: list("domainSpecificKeywords", &def.domain_specific_keywords),
        agentic_task_keywords: list("agenticTaskKeywords", &def.agentic_task_keywords),
        dimension_weights: weights(obj.get("dimensionWeights"), &def.dimension_weights),
        tier_boundaries: TierBoundaries { simple_medium, medium_complex, complex_reasoning },
        confidence_steepness: coerce_f64(
            obj.get("confidenceSteepness"),
            def.confidence_steepness,
            |x| x > 0.1 && x <= 100.0,
            "confidenceSteepness",
        ),
        confidence_threshold: coerce_f64(
            obj.get("confidenceThreshold"),
            def.confidence_threshold,
            |x| (0.0..=1.0).contains(&x),
            "confidenceThreshold",
        ),
    }
}

fn weights(value: Option<&Value>, def: &BTreeMap<String, f64>) -> BTreeMap<String, f64> {
    let Some(obj) = value.and_then(Value::as_object) else {
        if value.is_some() {
            tracing::debug!(field = "dimensionWeights", "not a map; using defaults");
        }
        return def.clone();
    };
    let mut out = BTreeMap::new();
    for (name, raw) in obj {
        if Dimension::parse(name).is_none() {
            tracing::debug!(dimension = %name, "unknown dimension weight dropped");
            continue;
        }
        let weight = match def.get(name) {
            Some(default) => coerce_f64(Some(raw), *default, in_weight_range, name),
            None => match as_f64(raw).filter(|w| in_weight_range(*w)) {
                Some(w) => w,
                None => continue,
            },
        };
        out.insert(name.clone(), weight);
    }
    out
}

fn in_weight_range(w: f64) -> bool {
    (-2.0..=2.0).contains(&w)
}

fn overrides(value: Option<&Value>, def: &OverridesConfig) -> OverridesConfig {
    let empty = Map::new();
    let obj = value.and_then(Value::as_object).unwrap_or(&empty);
    OverridesConfig {
        max_tokens_force_complex: coerce_usize(
            obj.get("maxTokensForceComplex"),
            def.max_tokens_force_complex,
            1,
            "maxTokensForceComplex",
        ),
        structured_output_min_tier: coerce_tier(
            obj.get("structuredOutputMinTier"),
            def.structured_output_min_tier,
            "structuredOutputMinTier",
        ),
        ambiguous_default_tier: coerce_tier(
            obj.get("ambiguousDefaultTier"),
            def.ambiguous_default_tier,
            "ambiguousDefaultTier",
        ),
        agentic_mode: coerce_bool(obj.get("agenticMode"), def.agentic_mode, "agenticMode"),
    }
}

fn preferences(value: Option<&Value>, def: &TierPreferences, field: &str) -> TierPreferences {
    let Some(obj) = value.and_then(Value::as_object) else {
        if value.is_some() {
            tracing::debug!(field, "not a map; using default preferences");
        }
        return def.clone();
    };
    let mut out = TierPreferences::new();
    for (label, entry) in obj {
        let Some(tier) = Tier::parse(label) else {
            tracing::debug!(field, tier = %label, "unknown tier dropped");
            continue;
        };
        let fallback = def.get(&tier).cloned().unwrap_or_default();
        out.insert(tier, preference(entry, &fallback, field));
    }
    out
}

fn preference(entry: &Value, def: &TierPreference, field: &str) -> TierPreference {
    let Some(obj) = entry.as_object() else {
        tracing::debug!(field, "preference entry is not a map; using default");
        return def.clone();
    };
    let capabilities = match obj.get("capabilities") {
        Some(Value::Object(caps)) => caps
            .iter()
            .filter_map(|(name, v)| strict_bool(v).map(|b| (name.clone(), b)))
            .collect(),
        _ => def.capabilities.clone(),
    };
    TierPreference {
        preferred_models: sanitize_list(obj.get("preferred_models"), &def.preferred_models, "preferred_models"),
        capabilities,
    }
}

/// Keep non-empty trimmed strings; anything unusable yields the default list.
fn sanitize_list(value: Option<&Value>, default: &[String], field: &str) -> Vec<String> {
    let Some(Value::Array(items)) = value else {
        if value.is_some() {
            tracing::debug!(field, "not a list; using defaults");
        }
        return default.to_vec();
    };
    let cleaned: Vec<String> = items
        .iter()
        .filter_map(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect();
    if cleaned.is_empty() {
        tracing::debug!(field, "empty list; using defaults");
        default.to_vec()
    } else {
        cleaned
    }
}

fn as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    }
    .filter(|x| x.is_finite())
}

fn coerce_f64(value: Option<&Value>, default: f64, accept: impl Fn(f64) -> bool, field: &str) -> f64 {
    let Some(raw) = value else { return default };
    match as_f64(raw).filter(|x| accept(*x)) {
        Some(x) => x,
        None => {
            tracing::debug!(field, value = %raw, "invalid number; using default");
            default
        }
    }
}

fn coerce_usize(value: Option<&Value>, default: usize, min: usize, field: &str) -> usize {
    let Some(raw) = value else { return default };
    let parsed = match raw {
        Value::Number(n) => n.as_u64().map(|x| x as usize).or_else(|| {
            n.as_f64().filter(|x| x.is_finite() && *x >= 0.0).map(|x| x as usize)
        }),
        Value::String(s) => s.trim().parse::<usize>().ok(),
        _ => None,
    };
    match parsed.filter(|x| *x >= min) {
        Some(x) => x,
        None => {
            tracing::debug!(field, value = %raw, min, "invalid integer; using default");
            default
        }
    }
}

fn coerce_tier(value: Option<&Value>, default: Tier, field: &str) -> Tier {
    let Some(raw) = value else { return default };
    match raw.as_str().and_then(Tier::parse) {
        Some(t) => t,
        None => {
            tracing::debug!(field, value = %raw, "unknown tier; using default");
            default
        }
    }
}

fn strict_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::String(s) if s.eq_ignore_ascii_case("true") => Some(true),
        Value::String(s) if s.eq_ignore_ascii_case("false") => Some(false),
        _ => None,
    }
}

fn coerce_bool(value: Option<&Value>, default: bool, field: &str) -> bool {
    let Some(raw) = value else { return default };
    strict_bool(raw).unwrap_or_else(|| {
        tracing::debug!(field, value = %raw, "invalid flag; using default");
        default
    })
}
