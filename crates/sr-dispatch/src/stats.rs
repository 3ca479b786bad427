use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sr_core::Tier;
use std::collections::BTreeMap;

/// What one completed request contributes to the aggregate counters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteRecord<'a> {
    pub tier: Tier,
    /// Provider that served the request; `None` when routing failed.
    pub provider: Option<&'a str>,
    pub ambiguous: bool,
    /// Candidates invoked, including the successful one.
    pub attempts: usize,
    pub failures: usize,
}

/// Point-in-time copy of the routing counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub total_routed: u64,
    pub tiers: BTreeMap<Tier, u64>,
    pub providers: BTreeMap<String, u64>,
    pub ambiguous: u64,
    pub fallback_attempts: u64,
    pub candidate_failures: u64,
}

impl Default for StatsSnapshot {
    fn default() -> Self {
        Self {
            total_routed: 0,
            tiers: Tier::ALL.iter().map(|t| (*t, 0)).collect(),
            providers: BTreeMap::new(),
            ambiguous: 0,
            fallback_attempts: 0,
            candidate_failures: 0,
        }
    }
}

/// Aggregate routing counters shared by every request a router handles.
///
/// One [`RoutingStats::record`] call per completed request; all fields of a
/// record land under a single lock.
#[derive(Debug, Default)]
pub struct RoutingStats {
    inner: Mutex<StatsSnapshot>,
}

impl RoutingStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&self, record: &RouteRecord<'_>) {
        let mut s = self.inner.lock();
        if let Some(provider) = record.provider {
            s.total_routed += 1;
            *s.tiers.entry(record.tier).or_insert(0) += 1;
            *s.providers.entry(provider.to_string()).or_insert(0) += 1;
        }
        if record.ambiguous {
            s.ambiguous += 1;
        }
        s.fallback_attempts += record.attempts.saturating_sub(1) as u64;
        s.candidate_failures += record.failures as u64;
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        self.inner.lock().clone()
    }

    pub fn reset(&self) {
        *self.inner.lock() = StatsSnapshot::default();
    }

    pub fn total_routed(&self) -> u64 {
        self.inner.lock().total_routed
    }
}
