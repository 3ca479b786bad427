use async_trait::async_trait;
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::Map;
use sr_core::{ChatMessage, ChatRequest, ChatResponse, ConversationContext, ModelInfo, Provider, ProviderCatalog};
use sr_dispatch::SmartRouter;
use sr_router::RouterConfig;
use std::sync::Arc;

/// Answers instantly, optionally refusing every call.
struct EchoProvider {
    id: String,
    models: Vec<(String, ModelInfo)>,
    refuse: bool,
}

#[async_trait]
impl Provider for EchoProvider {
    fn id(&self) -> &str {
        &self.id
    }

    fn resolve_model(&self, name: &str) -> Option<String> {
        self.models.iter().find(|(id, _)| id == name).map(|(id, _)| id.clone())
    }

    fn model_info(&self, model: &str) -> Option<ModelInfo> {
        self.models.iter().find(|(id, _)| id == model).map(|(_, i)| i.clone())
    }

    fn models(&self) -> Vec<(String, ModelInfo)> {
        self.models.clone()
    }

    async fn chat(&self, _: ChatRequest, _: Option<&mut ConversationContext>) -> anyhow::Result<ChatResponse> {
        if self.refuse {
            anyhow::bail!("{} refused", self.id);
        }
        Ok(ChatResponse::new(Map::new()))
    }
}

fn router() -> SmartRouter {
    let mut catalog = ProviderCatalog::new();
    for (i, refuse) in [true, true, false].into_iter().enumerate() {
        let models = ["gemini-2.5-flash", "deepseek-chat", "gpt-4o", "deepseek-reasoner"]
            .iter()
            .map(|m| (m.to_string(), ModelInfo::new(*m).with_input_cost(0.1 * (i + 1) as f64).with_reasoning(true)))
            .collect();
        catalog.register(Arc::new(EchoProvider { id: format!("provider-{i}"), models, refuse }));
    }
    SmartRouter::new(catalog, RouterConfig::default())
}

fn bench_route(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let router = router();

    c.bench_function("route_100_with_fallback", |b| {
        b.iter(|| {
            rt.block_on(async {
                for _ in 0..100 {
                    let req = ChatRequest::new("auto", vec![ChatMessage::user("Prove the theorem step by step")]);
                    black_box(router.route(req, None).await.ok());
                }
            })
        })
    });

    c.bench_function("route_100_pinned", |b| {
        b.iter(|| {
            rt.block_on(async {
                let mut ctx = ConversationContext::new();
                for _ in 0..100 {
                    let req = ChatRequest::new("auto", vec![ChatMessage::user("What is Python?")]);
                    black_box(router.route(req, Some(&mut ctx)).await.ok());
                }
            })
        })
    });
}

criterion_group!(benches, bench_route);
criterion_main!(benches);
