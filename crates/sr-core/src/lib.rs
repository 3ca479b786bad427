//! Shared types for the smart-routing decision engine.

pub mod chat;
pub mod context;
pub mod error;
pub mod provider;
pub mod types;

pub use chat::{ChatMessage, ChatRequest, ChatResponse, ContentPart, MessageContent, Role, RoutingMetadata};
pub use context::{ConversationContext, SelectionPin, PIN_KEY};
pub use error::{Result, RouteError};
pub use provider::{Provider, ProviderCatalog, ROUTER_PROVIDER_ID};
pub use types::{ModelCost, ModelInfo, Tier, TierVerdict};
