use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::json;
use sr_core::{
    ChatMessage, ChatRequest, ChatResponse, ConversationContext, ModelInfo, Provider, ProviderCatalog, RouteError,
    SelectionPin, Tier, PIN_KEY,
};
use sr_dispatch::SmartRouter;
use sr_router::{normalize_config, RouterConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Provider double: fails a fixed number of times, then answers with
/// "<provider>:<model>".
struct ScriptedProvider {
    id: String,
    models: Vec<(String, ModelInfo)>,
    failures_left: AtomicUsize,
    delay: Option<Duration>,
    calls: AtomicUsize,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    seen: Mutex<Vec<(ChatRequest, Option<String>)>>,
}

impl ScriptedProvider {
    fn new(id: &str) -> Self {
        Self {
            id: id.to_string(),
            models: Vec::new(),
            failures_left: AtomicUsize::new(0),
            delay: None,
            calls: AtomicUsize::new(0),
            in_flight: Arc::new(AtomicUsize::new(0)),
            max_in_flight: Arc::new(AtomicUsize::new(0)),
            seen: Mutex::new(Vec::new()),
        }
    }

    fn model(mut self, id: &str, info: ModelInfo) -> Self {
        self.models.push((id.to_string(), info));
        self
    }

    fn failing(self, times: usize) -> Self {
        self.failures_left.store(times, Ordering::SeqCst);
        self
    }

    fn slow(mut self, delay: Duration, in_flight: &Arc<AtomicUsize>, max_in_flight: &Arc<AtomicUsize>) -> Self {
        self.delay = Some(delay);
        self.in_flight = in_flight.clone();
        self.max_in_flight = max_in_flight.clone();
        self
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolve_model(&self, name: &str) -> Option<String> {
        self.models
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(name))
            .map(|(id, _)| id.clone())
    }

    fn model_info(&self, model: &str) -> Option<ModelInfo> {
        self.models
            .iter()
            .find(|(id, _)| id.eq_ignore_ascii_case(model))
            .map(|(_, info)| info.clone())
    }

    fn models(&self) -> Vec<(String, ModelInfo)> {
        self.models.clone()
    }

    async fn chat(
        &self,
        request: ChatRequest,
        context: Option<&mut ConversationContext>,
    ) -> anyhow::Result<ChatResponse> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = context.as_ref().and_then(|c| c.provider().map(String::from));
        let model = request.model.clone();
        self.seen.lock().push((request, current));

        if let Some(delay) = self.delay {
            let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            self.max_in_flight.fetch_max(now, Ordering::SeqCst);
            tokio::time::sleep(delay).await;
            self.in_flight.fetch_sub(1, Ordering::SeqCst);
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            anyhow::bail!("{} unavailable", self.id);
        }

        let body = json!({"choices": [{"message": {"role": "assistant", "content": format!("{}:{}", self.id, model)}}]});
        match body {
            serde_json::Value::Object(map) => Ok(ChatResponse::new(map)),
            _ => anyhow::bail!("unexpected body"),
        }
    }
}

fn priced(id: &str, input: f64) -> ModelInfo {
    ModelInfo::new(id).with_input_cost(input)
}

fn ask(prompt: &str) -> ChatRequest {
    ChatRequest::new("auto", vec![ChatMessage::user(prompt)])
}

fn router(providers: &[Arc<ScriptedProvider>], config: RouterConfig) -> SmartRouter {
    let mut catalog = ProviderCatalog::new();
    for p in providers {
        catalog.register(p.clone());
    }
    SmartRouter::new(catalog, config)
}

// ========== Fallback ==========

#[tokio::test]
async fn test_fallback_to_second_provider() {
    let a = Arc::new(ScriptedProvider::new("provider_a").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1)).failing(1));
    let b = Arc::new(ScriptedProvider::new("provider_b").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.2)));
    let r = router(&[a.clone(), b.clone()], RouterConfig::default());
    let mut ctx = ConversationContext::new();

    let resp = r.route(ask("What is Python?"), Some(&mut ctx)).await.unwrap();
    let routing = resp.routing.as_ref().unwrap();
    assert_eq!(routing.provider, "provider_b");
    assert_eq!(routing.model, "gemini-2.5-flash");
    assert_eq!(routing.attempts, 2);
    assert!(!routing.pinned);
    assert_eq!(resp.content(), Some("provider_b:gemini-2.5-flash"));
    assert_eq!(ctx.pin().unwrap().provider, "provider_b");
    assert_eq!((a.calls(), b.calls()), (1, 1));

    let s = r.stats().snapshot();
    assert_eq!(s.total_routed, 1);
    assert_eq!(s.providers["provider_b"], 1);
    assert_eq!(s.tiers[&Tier::Simple], 1);
    assert_eq!(s.fallback_attempts, 1);
    assert_eq!(s.candidate_failures, 1);
}

#[tokio::test]
async fn test_all_candidates_fail() {
    let a = Arc::new(ScriptedProvider::new("provider_a").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1)).failing(9));
    let b = Arc::new(ScriptedProvider::new("provider_b").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.2)).failing(9));
    let r = router(&[a, b], RouterConfig::default());
    let mut ctx = ConversationContext::new();

    let err = r.route(ask("What is Python?"), Some(&mut ctx)).await.unwrap_err();
    match &err {
        RouteError::Exhausted { attempts, first_error } => {
            assert_eq!(*attempts, 2);
            assert_eq!(first_error.to_string(), "provider_a unavailable");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.to_string().contains("first error: provider_a unavailable"));
    assert!(ctx.pin().is_none());

    let s = r.stats().snapshot();
    assert_eq!(s.total_routed, 0);
    assert_eq!(s.candidate_failures, 2);
    assert_eq!(s.fallback_attempts, 1);
}

#[tokio::test]
async fn test_no_candidates() {
    let r = router(&[], RouterConfig::default());
    let mut ctx = ConversationContext::new();
    let err = r.route(ask("Prove the theorem step by step"), Some(&mut ctx)).await.unwrap_err();
    assert!(matches!(err, RouteError::NoCandidates { tier: Tier::Reasoning }));
    assert!(err.first_error().is_none());
    assert!(ctx.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_attempts_never_overlap() {
    let in_flight = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));
    let delay = Duration::from_millis(250);
    let providers: Vec<Arc<ScriptedProvider>> = (0..4)
        .map(|i| {
            let p = ScriptedProvider::new(&format!("p{i}"))
                .model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1 * (i + 1) as f64))
                .slow(delay, &in_flight, &max_in_flight);
            Arc::new(if i < 3 { p.failing(1) } else { p })
        })
        .collect();
    let r = router(&providers, RouterConfig::default());

    let resp = r.route(ask("What is Python?"), None).await.unwrap();
    let routing = resp.routing.unwrap();
    assert_eq!(routing.provider, "p3");
    assert_eq!(routing.attempts, 4);
    assert_eq!(max_in_flight.load(Ordering::SeqCst), 1);
}

// ========== Pinning ==========

fn pin_config() -> RouterConfig {
    normalize_config(&json!({"tierPreferences": {
        "SIMPLE": {"preferred_models": ["flash"]},
        "REASONING": {"preferred_models": ["pro"]}
    }}))
}

fn pin_providers() -> (Arc<ScriptedProvider>, Arc<ScriptedProvider>) {
    let a = Arc::new(ScriptedProvider::new("provider_a").model("flash", priced("flash", 0.1)));
    let b = Arc::new(ScriptedProvider::new("provider_b").model("pro", priced("pro", 5.0).with_reasoning(true)));
    (a, b)
}

#[tokio::test]
async fn test_pin_survives_reasoning_prompt() {
    let (a, b) = pin_providers();
    let r = router(&[a.clone(), b.clone()], pin_config());
    let mut ctx = ConversationContext::new();

    let first = r.route(ask("What is Python?"), Some(&mut ctx)).await.unwrap();
    assert_eq!(first.routing.as_ref().unwrap().provider, "provider_a");
    let pin = ctx.pin().unwrap();
    assert_eq!(pin.model, "flash");
    assert_eq!(pin.tier, Tier::Simple);

    let follow_up = ChatRequest::new("auto", vec![
        ChatMessage::user("What is Python?"),
        ChatMessage::assistant("A programming language."),
        ChatMessage::user("Prove the theorem step by step"),
    ]);
    let second = r.route(follow_up, Some(&mut ctx)).await.unwrap();
    let routing = second.routing.unwrap();
    assert_eq!(routing.provider, "provider_a");
    assert_eq!(routing.model, "flash");
    assert!(routing.pinned);
    assert_eq!(routing.attempts, 1);
    assert_eq!(routing.tier, Tier::Simple);
    assert_eq!(routing.reasoning, "pinned -> provider_a/flash");
    assert!(routing.signals.iter().any(|s| s.starts_with("reasoning")));
    assert_eq!(b.calls(), 0);
}

#[tokio::test]
async fn test_without_context_reasoning_goes_elsewhere() {
    let (a, b) = pin_providers();
    let r = router(&[a.clone(), b.clone()], pin_config());
    let resp = r.route(ask("Prove the theorem step by step"), None).await.unwrap();
    let routing = resp.routing.unwrap();
    assert_eq!(routing.provider, "provider_b");
    assert_eq!(routing.tier, Tier::Reasoning);
    assert!(routing.confidence >= 0.85);
    assert_eq!(a.calls(), 0);
}

#[tokio::test]
async fn test_stale_pin_is_ignored() {
    let (a, b) = pin_providers();
    let r = router(&[a, b], pin_config());
    for stale in [
        SelectionPin { provider: "gone".into(), model: "flash".into(), tier: Tier::Simple, confidence: 0.9, agentic: false },
        SelectionPin { provider: "provider_b".into(), model: "retired".into(), tier: Tier::Simple, confidence: 0.9, agentic: false },
    ] {
        let mut ctx = ConversationContext::new();
        ctx.set_pin(&stale);
        let resp = r.route(ask("What is Python?"), Some(&mut ctx)).await.unwrap();
        let routing = resp.routing.unwrap();
        assert!(!routing.pinned);
        assert_eq!(routing.provider, "provider_a");
        assert_eq!(ctx.pin().unwrap().provider, "provider_a");
    }
}

#[tokio::test]
async fn test_malformed_pin_is_ignored() {
    let (a, b) = pin_providers();
    let r = router(&[a, b], pin_config());
    let mut ctx = ConversationContext::new();
    ctx.insert(PIN_KEY, json!("provider_b/pro"));
    let resp = r.route(ask("What is Python?"), Some(&mut ctx)).await.unwrap();
    assert!(!resp.routing.unwrap().pinned);
    assert_eq!(ctx.pin().unwrap().provider, "provider_a");
}

#[tokio::test]
async fn test_failed_pinned_candidate_is_exhausted() {
    let a = Arc::new(ScriptedProvider::new("provider_a").model("flash", priced("flash", 0.1)).failing(1));
    let r = router(&[a], pin_config());
    let mut ctx = ConversationContext::new();
    ctx.set_pin(&SelectionPin { provider: "provider_a".into(), model: "flash".into(), tier: Tier::Medium, confidence: 0.8, agentic: false });
    let err = r.route(ask("What is Python?"), Some(&mut ctx)).await.unwrap_err();
    assert!(matches!(err, RouteError::Exhausted { attempts: 1, .. }));
    assert_eq!(ctx.pin().unwrap().tier, Tier::Medium);
}

// ========== Context & Request ==========

#[tokio::test]
async fn test_context_tracks_current_target() {
    let a = Arc::new(ScriptedProvider::new("provider_a").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1)).failing(1));
    let b = Arc::new(
        ScriptedProvider::new("provider_b")
            .model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.2).with_output_cost(0.6)),
    );
    let r = router(&[a.clone(), b.clone()], RouterConfig::default());
    let mut ctx = ConversationContext::new();
    ctx.insert("session", json!("abc"));

    r.route(ask("What is Python?"), Some(&mut ctx)).await.unwrap();
    assert_eq!(a.seen.lock()[0].1.as_deref(), Some("provider_a"));
    assert_eq!(b.seen.lock()[0].1.as_deref(), Some("provider_b"));
    assert_eq!(ctx.provider(), Some("provider_b"));
    assert_eq!(ctx.model_info().unwrap().id, "gemini-2.5-flash");
    assert_eq!(ctx.get("modelCost"), Some(&json!({"input": 0.2, "output": 0.6})));
    assert_eq!(ctx.get("session"), Some(&json!("abc")));
}

#[tokio::test]
async fn test_request_rewritten_per_candidate() {
    let a = Arc::new(ScriptedProvider::new("openrouter").model("google/gemini-2.5-flash", priced("google/gemini-2.5-flash", 0.1)));
    let r = router(&[a.clone()], RouterConfig::default());
    let mut req = ask("What is Python?");
    req.extra.insert("temperature".into(), json!(0.2));

    let resp = r.route(req, None).await.unwrap();
    assert_eq!(resp.routing.unwrap().model, "google/gemini-2.5-flash");
    let seen = a.seen.lock();
    assert_eq!(seen[0].0.model, "google/gemini-2.5-flash");
    assert_eq!(seen[0].0.extra.get("temperature"), Some(&json!(0.2)));
    assert_eq!(seen[0].0.messages.len(), 1);
}

#[tokio::test]
async fn test_tool_history_forwarded_intact() {
    let p = Arc::new(
        ScriptedProvider::new("provider_a")
            .model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1).with_tool_call(true)),
    );
    let r = router(&[p.clone()], RouterConfig::default());
    let messages = json!([
        {"role": "developer", "content": "be brief"},
        {"role": "user", "content": "read file a.txt"},
        {"role": "assistant", "content": null, "tool_calls": [
            {"id": "call_1", "type": "function", "function": {"name": "read_file", "arguments": "{\"path\":\"a.txt\"}"}}
        ]},
        {"role": "tool", "tool_call_id": "call_1", "name": "read_file", "content": "hello"}
    ]);
    let req: ChatRequest = serde_json::from_value(json!({
        "model": "auto",
        "messages": messages.clone(),
        "tools": [{"type": "function", "function": {"name": "read_file"}}]
    }))
    .unwrap();

    let resp = r.route(req, None).await.unwrap();
    assert_eq!(resp.routing.unwrap().model, "gemini-2.5-flash");
    let seen = p.seen.lock();
    let forwarded = serde_json::to_value(&seen[0].0).unwrap();
    assert_eq!(forwarded["model"], json!("gemini-2.5-flash"));
    assert_eq!(forwarded["messages"], messages);
}

#[tokio::test]
async fn test_routing_metadata() {
    let a = Arc::new(ScriptedProvider::new("provider_a").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1)));
    let r = router(&[a], RouterConfig::default());
    let resp = r.route(ask("What is Python?"), None).await.unwrap();
    let routing = resp.routing.unwrap();
    assert_eq!(routing.tier, Tier::Simple);
    assert_eq!(routing.confidence, 0.769);
    assert_eq!(routing.score, -0.1);
    assert!(!routing.agentic);
    assert_eq!(routing.signals, vec!["short (4 tokens)".to_string(), "simple (what is)".to_string()]);
    assert_eq!(routing.reasoning, "score=-0.10 | short (4 tokens), simple (what is)");
}

#[tokio::test]
async fn test_tools_use_agentic_table() {
    let p = Arc::new(
        ScriptedProvider::new("anthropic")
            .model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1))
            .model("claude-haiku-4.5", priced("claude-haiku-4.5", 0.8).with_tool_call(true)),
    );
    let r = router(&[p], RouterConfig::default());
    let req = ask("What is Python?").with_tools(vec![json!({"type": "function", "function": {"name": "search"}})]);
    let resp = r.route(req, None).await.unwrap();
    let routing = resp.routing.unwrap();
    assert_eq!(routing.model, "claude-haiku-4.5");
    assert!(routing.agentic);
    assert!(routing.reasoning.ends_with("| agentic"));
}

#[tokio::test]
async fn test_structured_system_prompt_upgrades_tier() {
    let p = Arc::new(ScriptedProvider::new("google").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1)));
    let r = router(&[p], RouterConfig::default());
    let req = ChatRequest::new("auto", vec![ChatMessage::system("Respond in JSON"), ChatMessage::user("What is Python?")]);
    let resp = r.route(req, None).await.unwrap();
    let routing = resp.routing.unwrap();
    assert_eq!(routing.tier, Tier::Medium);
    assert!(routing.reasoning.contains("upgraded to MEDIUM (structured output)"));
}

// ========== Catalog & Config ==========

#[tokio::test]
async fn test_nested_router_is_never_a_candidate() {
    let inner = SmartRouter::new(ProviderCatalog::new(), RouterConfig::default());
    let real = Arc::new(ScriptedProvider::new("real").model("gpt-4o-mini", priced("gpt-4o-mini", 0.15)));
    let catalog = ProviderCatalog::new().with(Arc::new(inner)).with(real.clone());
    let r = SmartRouter::new(catalog, RouterConfig::default());
    let resp = r.route(ask("What is Python?"), None).await.unwrap();
    assert_eq!(resp.routing.unwrap().provider, "real");
}

#[tokio::test]
async fn test_update_config_changes_routing() {
    let p = Arc::new(
        ScriptedProvider::new("openai")
            .model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.1))
            .model("gpt-4o-mini", priced("gpt-4o-mini", 0.15)),
    );
    let r = router(&[p], RouterConfig::default());
    let before = r.route(ask("What is Python?"), None).await.unwrap();
    assert_eq!(before.routing.unwrap().model, "gemini-2.5-flash");

    r.update_config(&json!({"tierPreferences": {"SIMPLE": {"preferred_models": ["gpt-4o-mini"]}}}));
    let after = r.route(ask("What is Python?"), None).await.unwrap();
    assert_eq!(after.routing.unwrap().model, "gpt-4o-mini");
}

#[tokio::test]
async fn test_concurrent_requests_counted_once_each() {
    let p = Arc::new(ScriptedProvider::new("provider_b").model("gemini-2.5-flash", priced("gemini-2.5-flash", 0.2)));
    let r = Arc::new(router(&[p.clone()], RouterConfig::default()));
    let mut handles = Vec::new();
    for i in 0..32 {
        let r = r.clone();
        handles.push(tokio::spawn(async move {
            let mut ctx = ConversationContext::new();
            let routed = r.route(ask(&format!("What is Python? #{i}")), Some(&mut ctx)).await;
            routed.map(|_| ctx)
        }));
    }
    for h in handles {
        let ctx = h.await.unwrap().unwrap();
        assert_eq!(ctx.pin().unwrap().provider, "provider_b");
    }
    let s = r.stats().snapshot();
    assert_eq!(s.total_routed, 32);
    assert_eq!(s.providers["provider_b"], 32);
    assert_eq!(p.calls(), 32);
}
