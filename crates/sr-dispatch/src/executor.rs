//! Fallback executor: classify, rank, then walk the candidates one at a time
//! until a provider answers.

use crate::stats::{RouteRecord, RoutingStats};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::Value;
use sr_core::{
    ChatRequest, ChatResponse, ConversationContext, ModelInfo, Provider, ProviderCatalog, Result, RouteError,
    RoutingMetadata, SelectionPin, Tier, ROUTER_PROVIDER_ID,
};
use sr_router::{estimate_tokens, plan_route, rank_with_config, Candidate, RouterConfig};
use std::sync::Arc;

/// Model name the router answers to when registered as a provider.
pub const AUTO_MODEL: &str = "auto";

/// How a request will be served: the candidates to try and the routing
/// facts reported with the response.
struct Decision {
    tier: Tier,
    confidence: f64,
    agentic: bool,
    pinned: bool,
    reasoning: String,
    candidates: Vec<Candidate>,
}

/// Routes chat requests across a provider catalog.
pub struct SmartRouter {
    config: RwLock<Arc<RouterConfig>>,
    catalog: ProviderCatalog,
    stats: Arc<RoutingStats>,
}

impl SmartRouter {
    pub fn new(catalog: ProviderCatalog, config: RouterConfig) -> Self {
        Self {
            config: RwLock::new(Arc::new(config)),
            catalog,
            stats: Arc::new(RoutingStats::new()),
        }
    }

    /// Share a counters object with other routers or the host.
    pub fn with_stats(mut self, stats: Arc<RoutingStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Current configuration. Requests already in flight keep the one they started with.
    pub fn config(&self) -> Arc<RouterConfig> {
        Arc::clone(&self.config.read())
    }

    pub fn set_config(&self, config: RouterConfig) {
        *self.config.write() = Arc::new(config);
    }

    /// Merge `updates` onto the live configuration and swap it in.
    pub fn update_config(&self, updates: &Value) -> Arc<RouterConfig> {
        let mut guard = self.config.write();
        let next = Arc::new(guard.merged(updates));
        *guard = Arc::clone(&next);
        tracing::info!("routing configuration updated");
        next
    }

    pub fn stats(&self) -> &Arc<RoutingStats> {
        &self.stats
    }

    pub fn catalog(&self) -> &ProviderCatalog {
        &self.catalog
    }

    pub fn catalog_mut(&mut self) -> &mut ProviderCatalog {
        &mut self.catalog
    }

    /// Route one request. On success the response carries routing metadata
    /// and the context (when given) holds the pin for later turns.
    pub async fn route(
        &self,
        request: ChatRequest,
        mut context: Option<&mut ConversationContext>,
    ) -> Result<ChatResponse> {
        let config = self.config();
        let prompt = request.last_user_prompt();
        let system_prompt = request.system_prompt();
        let estimated_tokens = estimate_tokens(system_prompt.as_deref(), &prompt);
        let plan = plan_route(&prompt, system_prompt.as_deref(), estimated_tokens, request.has_tools(), &config);

        let decision = match self.pinned_candidate(context.as_deref()) {
            Some((pin, candidate)) => {
                tracing::debug!(provider = %pin.provider, model = %pin.model, "reusing pinned selection");
                Decision {
                    tier: pin.tier,
                    confidence: pin.confidence,
                    agentic: pin.agentic,
                    pinned: true,
                    reasoning: format!("pinned -> {}/{}", pin.provider, pin.model),
                    candidates: vec![candidate],
                }
            }
            None => Decision {
                tier: plan.tier,
                confidence: plan.confidence,
                agentic: plan.agentic,
                pinned: false,
                reasoning: plan.reasoning_trail(),
                candidates: rank_with_config(plan.tier, plan.agentic, &self.catalog, &config),
            },
        };
        let ambiguous = plan.ambiguous && !decision.pinned;

        if decision.candidates.is_empty() {
            self.stats.record(&RouteRecord { tier: decision.tier, provider: None, ambiguous, attempts: 0, failures: 0 });
            tracing::warn!(tier = %decision.tier, "no routing candidates available");
            return Err(RouteError::NoCandidates { tier: decision.tier });
        }

        let mut first_error: Option<anyhow::Error> = None;
        for (index, candidate) in decision.candidates.iter().enumerate() {
            let attempt = index + 1;
            let mut outbound = request.clone();
            outbound.model = candidate.model.clone();
            if let Some(ctx) = context.as_deref_mut() {
                ctx.set_current_target(&candidate.provider, Some(&candidate.info));
            }

            let result = match self.catalog.get(&candidate.provider) {
                Some(provider) => provider.chat(outbound, context.as_deref_mut()).await,
                None => Err(anyhow::anyhow!("provider {} is not registered", candidate.provider)),
            };

            match result {
                Ok(mut response) => {
                    if let Some(ctx) = context.as_deref_mut() {
                        ctx.set_pin(&SelectionPin {
                            provider: candidate.provider.clone(),
                            model: candidate.model.clone(),
                            tier: decision.tier,
                            confidence: decision.confidence,
                            agentic: decision.agentic,
                        });
                    }
                    self.stats.record(&RouteRecord {
                        tier: decision.tier,
                        provider: Some(candidate.provider.as_str()),
                        ambiguous,
                        attempts: attempt,
                        failures: index,
                    });
                    tracing::info!(
                        tier = %decision.tier,
                        confidence = decision.confidence,
                        provider = %candidate.provider,
                        model = %candidate.model,
                        attempts = attempt,
                        pinned = decision.pinned,
                        reasoning = %decision.reasoning,
                        "routed request"
                    );
                    response.routing = Some(RoutingMetadata {
                        tier: decision.tier,
                        confidence: round_to(decision.confidence, 3),
                        score: round_to(plan.scoring.score, 4),
                        provider: candidate.provider.clone(),
                        model: candidate.model.clone(),
                        agentic: decision.agentic,
                        signals: plan.scoring.signals.clone(),
                        pinned: decision.pinned,
                        attempts: attempt,
                        reasoning: decision.reasoning.clone(),
                    });
                    return Ok(response);
                }
                Err(err) => {
                    tracing::warn!(
                        provider = %candidate.provider,
                        model = %candidate.model,
                        attempt,
                        remaining = decision.candidates.len() - attempt,
                        error = %err,
                        "routing candidate failed"
                    );
                    first_error.get_or_insert(err);
                }
            }
        }

        let attempts = decision.candidates.len();
        self.stats.record(&RouteRecord { tier: decision.tier, provider: None, ambiguous, attempts, failures: attempts });
        match first_error {
            Some(first_error) => Err(RouteError::Exhausted { attempts, first_error }),
            None => Err(RouteError::NoCandidates { tier: decision.tier }),
        }
    }

    /// The context's pin, if its provider is still registered and still
    /// serves the pinned model.
    fn pinned_candidate(&self, context: Option<&ConversationContext>) -> Option<(SelectionPin, Candidate)> {
        let pin = context?.pin()?;
        if pin.provider == ROUTER_PROVIDER_ID {
            return None;
        }
        let provider = self.catalog.get(&pin.provider)?;
        let Some(info) = provider.model_info(&pin.model) else {
            tracing::debug!(provider = %pin.provider, model = %pin.model, "pinned model no longer served");
            return None;
        };
        let candidate = Candidate::new(pin.provider.clone(), pin.model.clone(), info);
        Some((pin, candidate))
    }
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn auto_model_info() -> ModelInfo {
    let mut info = ModelInfo::new(AUTO_MODEL)
        .with_tool_call(true)
        .with_reasoning(true)
        .with_input_cost(0.0)
        .with_output_cost(0.0);
    info.name = Some("Auto (Smart Routing)".into());
    info
}

#[async_trait]
impl Provider for SmartRouter {
    fn id(&self) -> &str {
        ROUTER_PROVIDER_ID
    }

    fn resolve_model(&self, name: &str) -> Option<String> {
        name.eq_ignore_ascii_case(AUTO_MODEL).then(|| AUTO_MODEL.to_string())
    }

    fn model_info(&self, model: &str) -> Option<ModelInfo> {
        self.resolve_model(model).map(|_| auto_model_info())
    }

    fn models(&self) -> Vec<(String, ModelInfo)> {
        vec![(AUTO_MODEL.to_string(), auto_model_info())]
    }

    async fn chat(
        &self,
        request: ChatRequest,
        context: Option<&mut ConversationContext>,
    ) -> anyhow::Result<ChatResponse> {
        Ok(self.route(request, context).await?)
    }
}
