//! `Adapter` and `AdapterRegistry` ports: one adapter instance per vendor,
//! looked up by provider type, never by provider id.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use llmgate_catalog::{CapabilityTag, Model, Provider, ProviderType};
use llmgate_errors::{GatewayError, GatewayResult};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use crate::types::{AdapterChatOutcome, AdapterEmbedOutcome, ChatChunk, ChatRequest, EmbedRequest};

/// Threaded through routing, the adapter call, and the resulting stream,
/// carrying whatever per-request identifiers downstream logging needs.
#[derive(Clone)]
pub struct DispatchContext {
    pub trace_id: String,
    pub cancellation: CancellationToken,
}

impl DispatchContext {
    pub fn new(trace_id: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            cancellation: CancellationToken::new(),
        }
    }

    /// Generates a fresh trace id for a caller that doesn't already have one,
    /// the same way the HTTP entry point mints one per incoming request.
    pub fn generate() -> Self {
        Self::new(uuid::Uuid::new_v4().to_string())
    }
}

pub type ChunkStream = mpsc::Receiver<GatewayResult<ChatChunk>>;

#[async_trait]
pub trait Adapter: Send + Sync {
    fn provider_type(&self) -> ProviderType;

    fn supports_capability(&self, capability: CapabilityTag) -> bool;

    async fn health_check(&self, provider: &Provider, api_key: &str) -> GatewayResult<()>;

    async fn chat(
        &self,
        ctx: &DispatchContext,
        request: &ChatRequest,
        model: &Model,
        provider: &Provider,
        api_key: &str,
    ) -> GatewayResult<AdapterChatOutcome>;

    /// Sender side is the adapter's; the engine only reads. The channel is
    /// bounded at 1 so a slow consumer applies back-pressure to the
    /// upstream call.
    async fn chat_stream(
        &self,
        ctx: &DispatchContext,
        request: &ChatRequest,
        model: &Model,
        provider: &Provider,
        api_key: &str,
    ) -> GatewayResult<ChunkStream>;

    async fn embed(
        &self,
        ctx: &DispatchContext,
        request: &EmbedRequest,
        model: &Model,
        provider: &Provider,
        api_key: &str,
    ) -> GatewayResult<AdapterEmbedOutcome>;
}

#[derive(Default)]
pub struct AdapterRegistry {
    adapters: HashMap<ProviderType, Arc<dyn Adapter>>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: Arc<dyn Adapter>) {
        self.adapters.insert(adapter.provider_type(), adapter);
    }

    pub fn get_for_provider(&self, provider: &Provider) -> GatewayResult<Arc<dyn Adapter>> {
        self.adapters
            .get(&provider.provider_type)
            .cloned()
            .ok_or_else(|| GatewayError::AdapterNotFound(format!("{:?}", provider.provider_type)))
    }
}
