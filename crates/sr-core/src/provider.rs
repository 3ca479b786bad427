use crate::chat::{ChatRequest, ChatResponse};
use crate::context::ConversationContext;
use crate::types::ModelInfo;
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Catalog id of the router's own virtual provider; never a routing target.
pub const ROUTER_PROVIDER_ID: &str = "smart_routing";

/// A backend that serves chat completions for a set of models.
#[async_trait]
pub trait Provider: Send + Sync {
    fn id(&self) -> &str;

    /// Resolve an alias or direct identifier to this provider's canonical model id.
    fn resolve_model(&self, name: &str) -> Option<String>;

    /// Descriptor for a model id or any name `resolve_model` accepts.
    fn model_info(&self, model: &str) -> Option<ModelInfo>;

    /// Every (model id, descriptor) pair this provider serves.
    fn models(&self) -> Vec<(String, ModelInfo)>;

    async fn chat(
        &self,
        request: ChatRequest,
        context: Option<&mut ConversationContext>,
    ) -> anyhow::Result<ChatResponse>;
}

/// Providers in registration order.
#[derive(Clone, Default)]
pub struct ProviderCatalog {
    providers: Vec<Arc<dyn Provider>>,
}

impl ProviderCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a provider; a provider with the same id is replaced in place.
    pub fn register(&mut self, provider: Arc<dyn Provider>) {
        match self.providers.iter_mut().find(|p| p.id() == provider.id()) {
            Some(slot) => *slot = provider,
            None => self.providers.push(provider),
        }
    }

    pub fn with(mut self, provider: Arc<dyn Provider>) -> Self {
        self.register(provider);
        self
    }

    pub fn get(&self, id: &str) -> Option<&Arc<dyn Provider>> {
        self.providers.iter().find(|p| p.id() == id)
    }

    pub fn remove(&mut self, id: &str) -> Option<Arc<dyn Provider>> {
        let idx = self.providers.iter().position(|p| p.id() == id)?;
        Some(self.providers.remove(idx))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter()
    }

    /// Providers eligible as routing targets (everything but the router itself).
    pub fn routable(&self) -> impl Iterator<Item = &Arc<dyn Provider>> {
        self.providers.iter().filter(|p| p.id() != ROUTER_PROVIDER_ID)
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl fmt::Debug for ProviderCatalog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.providers.iter().map(|p| p.id())).finish()
    }
}
