//! Smart-routing decision engine: 14-dimension weighted classifier with
//! multilingual keywords, config normalization, and candidate ranking.

pub mod types;
pub mod rules;
pub mod config;
pub mod normalize;
pub mod selector;

pub use types::*;
pub use rules::{classify_by_rules, classify_by_rules as classify};
pub use config::{default_routing_config, ROUTER_CONFIG};
pub use normalize::{deep_merge, normalize_config};
pub use selector::*;

use sr_core::Tier;

/// Agentic score at or above which routing switches to the agentic table.
pub const AUTO_AGENTIC_THRESHOLD: f64 = 0.75;

/// Rough token estimate: one token per four characters of system + prompt.
pub fn estimate_tokens(system_prompt: Option<&str>, prompt: &str) -> usize {
    let chars = system_prompt.unwrap_or("").chars().count() + 1 + prompt.chars().count();
    chars.div_ceil(4)
}

/// Tier, confidence and agentic mode chosen for a request, before ranking.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub tier: Tier,
    pub confidence: f64,
    pub agentic: bool,
    /// The classifier could not commit to a tier and the default was used.
    pub ambiguous: bool,
    pub estimated_tokens: usize,
    pub scoring: ScoringResult,
    pub reasoning: Vec<String>,
}

impl RoutePlan {
    /// Human-readable trail of how the tier was reached.
    pub fn reasoning_trail(&self) -> String {
        self.reasoning.join(" | ")
    }
}

/// Classify a request and apply the tier overrides: large-context escalation,
/// ambiguous default, structured-output minimum, and agentic selection.
pub fn plan_route(
    prompt: &str,
    system_prompt: Option<&str>,
    estimated_tokens: usize,
    has_tools: bool,
    config: &RouterConfig,
) -> RoutePlan {
    let scoring = classify_by_rules(prompt, system_prompt, estimated_tokens, &config.scoring);
    let overrides = &config.overrides;

    let mut reasoning = vec![format!("score={:.2}", scoring.score)];
    if !scoring.signals.is_empty() {
        reasoning.push(scoring.signals.join(", "));
    }

    let mut tier = scoring.tier();
    let mut confidence = scoring.confidence;

    if estimated_tokens > overrides.max_tokens_force_complex {
        tier = Some(Tier::Complex);
        confidence = 0.95;
        reasoning.push(format!("large context ({} tokens)", estimated_tokens));
    }

    let ambiguous = tier.is_none();
    let mut tier = match tier {
        Some(t) => t,
        None => {
            let t = overrides.ambiguous_default_tier;
            confidence = 0.5;
            reasoning.push(format!("ambiguous -> {}", t));
            t
        }
    };

    let has_structured = system_prompt
        .map(|s| s.to_lowercase())
        .map(|s| s.contains("json") || s.contains("structured") || s.contains("schema"))
        .unwrap_or(false);
    if has_structured {
        let min_tier = overrides.structured_output_min_tier;
        if tier.rank() < min_tier.rank() {
            reasoning.push(format!("upgraded to {} (structured output)", min_tier));
            tier = min_tier;
        }
    }

    let auto_agentic = scoring.agentic_score >= AUTO_AGENTIC_THRESHOLD;
    let agentic = has_tools || auto_agentic || overrides.agentic_mode;
    if has_tools {
        reasoning.push("agentic".into());
    } else if auto_agentic {
        reasoning.push("auto-agentic".into());
    } else if overrides.agentic_mode {
        reasoning.push("forced-agentic".into());
    }

    RoutePlan { tier, confidence, agentic, ambiguous, estimated_tokens, scoring, reasoning }
}
