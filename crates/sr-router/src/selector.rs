//! Candidate ranking: preferred models first, then cheapest models under the
//! tier's cost ceiling, then anything at all.

use crate::types::{Candidate, RouterConfig, TierPreference, TierPreferences};
use sr_core::{ProviderCatalog, Tier};
use std::collections::{BTreeMap, HashSet};

/// Ordered, de-duplicated candidates able to serve `tier`.
pub fn rank_candidates(
    tier: Tier,
    agentic: bool,
    catalog: &ProviderCatalog,
    tier_preferences: &TierPreferences,
    agentic_preferences: &TierPreferences,
) -> Vec<Candidate> {
    let table = if agentic { agentic_preferences } else { tier_preferences };
    let empty = TierPreference::default();
    let pref = table.get(&tier).unwrap_or(&empty);

    let mut ranked = Vec::new();
    for name in &pref.preferred_models {
        ranked.extend(find_preferred(name, catalog, &pref.capabilities));
    }
    ranked.extend(fallback_by_cost(tier, catalog, &pref.capabilities));
    if ranked.is_empty() {
        ranked.extend(any_available(catalog));
    }

    let ranked = dedup(ranked);
    tracing::debug!(
        tier = %tier,
        agentic,
        candidates = ranked.len(),
        "ranked routing candidates"
    );
    ranked
}

/// [`rank_candidates`] with both preference tables taken from `config`.
pub fn rank_with_config(tier: Tier, agentic: bool, catalog: &ProviderCatalog, config: &RouterConfig) -> Vec<Candidate> {
    rank_candidates(tier, agentic, catalog, &config.tier_preferences, &config.agentic_preferences)
}

/// Preferred model names for a tier, in order.
pub fn get_preference_chain(tier: Tier, agentic: bool, config: &RouterConfig) -> Vec<String> {
    let table = if agentic { &config.agentic_preferences } else { &config.tier_preferences };
    table.get(&tier).map(|p| p.preferred_models.clone()).unwrap_or_default()
}

/// Every provider resolving `model_name` with a capable model, cheapest first.
fn find_preferred(model_name: &str, catalog: &ProviderCatalog, required: &BTreeMap<String, bool>) -> Vec<Candidate> {
    let mut found: Vec<Candidate> = catalog
        .routable()
        .filter_map(|provider| {
            let resolved = provider.resolve_model(model_name)?;
            let info = provider.model_info(model_name)?;
            info.meets(required).then(|| Candidate::new(provider.id(), resolved, info))
        })
        .collect();
    found.sort_by(|a, b| a.info.sort_cost().total_cmp(&b.info.sort_cost()));
    found
}

fn fallback_by_cost(tier: Tier, catalog: &ProviderCatalog, required: &BTreeMap<String, bool>) -> Vec<Candidate> {
    let max_cost = tier.cost_ceiling();
    let mut found: Vec<Candidate> = catalog
        .routable()
        .flat_map(|provider| {
            let id = provider.id().to_string();
            provider
                .models()
                .into_iter()
                .filter(|(_, info)| info.input_cost().is_some_and(|c| c <= max_cost) && info.meets(required))
                .map(move |(model, info)| Candidate::new(id.clone(), model, info))
        })
        .collect();
    found.sort_by(|a, b| a.info.sort_cost().total_cmp(&b.info.sort_cost()));
    found
}

/// Last resort: every model of every provider, unranked.
fn any_available(catalog: &ProviderCatalog) -> Vec<Candidate> {
    catalog
        .routable()
        .flat_map(|provider| {
            let id = provider.id().to_string();
            provider
                .models()
                .into_iter()
                .map(move |(model, info)| Candidate::new(id.clone(), model, info))
        })
        .collect()
}

fn dedup(candidates: Vec<Candidate>) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    candidates
        .into_iter()
        .filter(|c| seen.insert((c.provider.clone(), c.model.clone())))
        .collect()
}
