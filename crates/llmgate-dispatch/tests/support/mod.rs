use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use llmgate_catalog::{CapabilityTag, Model, Provider, ProviderType};
use llmgate_dispatch::{
    Adapter, AdapterChatOutcome, AdapterEmbedOutcome, ChatChunk, ChatMessage, ChatRequest,
    ChunkStream, DispatchContext, EmbedRequest,
};
use llmgate_errors::{GatewayError, GatewayResult};
use tokio::sync::mpsc;

/// A scripted adapter: each call to `chat` pops the next outcome off a
/// queue, so tests can script exact failure/success sequences.
pub struct ScriptedAdapter {
    chat_outcomes: Mutex<Vec<GatewayResult<AdapterChatOutcome>>>,
    calls: AtomicUsize,
}

impl ScriptedAdapter {
    pub fn new(chat_outcomes: Vec<GatewayResult<AdapterChatOutcome>>) -> Self {
        Self {
            chat_outcomes: Mutex::new(chat_outcomes),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Adapter for ScriptedAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Openai
    }

    fn supports_capability(&self, _capability: CapabilityTag) -> bool {
        true
    }

    async fn health_check(&self, _provider: &Provider, _api_key: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn chat(
        &self,
        _ctx: &DispatchContext,
        _request: &ChatRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<AdapterChatOutcome> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut outcomes = self.chat_outcomes.lock().unwrap();
        if outcomes.is_empty() {
            return Err(GatewayError::UpstreamError("script exhausted".into()));
        }
        outcomes.remove(0)
    }

    async fn chat_stream(
        &self,
        _ctx: &DispatchContext,
        _request: &ChatRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<ChunkStream> {
        unimplemented!("use StreamingAdapter for streaming tests")
    }

    async fn embed(
        &self,
        _ctx: &DispatchContext,
        _request: &EmbedRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<AdapterEmbedOutcome> {
        unimplemented!("not used by these tests")
    }
}

/// Emits 3 chunks then blocks forever, for exercising cancel-after-2.
pub struct StreamingAdapter;

#[async_trait]
impl Adapter for StreamingAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Openai
    }

    fn supports_capability(&self, _capability: CapabilityTag) -> bool {
        true
    }

    async fn health_check(&self, _provider: &Provider, _api_key: &str) -> GatewayResult<()> {
        Ok(())
    }

    async fn chat(
        &self,
        _ctx: &DispatchContext,
        _request: &ChatRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<AdapterChatOutcome> {
        unimplemented!("not used by streaming tests")
    }

    async fn chat_stream(
        &self,
        _ctx: &DispatchContext,
        _request: &ChatRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<ChunkStream> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            for i in 0..3 {
                if tx
                    .send(Ok(ChatChunk {
                        delta: format!("chunk-{i}"),
                        finish_reason: None,
                        usage: None,
                    }))
                    .await
                    .is_err()
                {
                    return;
                }
            }
            // Block "forever" (until the receiver drops) to simulate an
            // upstream that stalls after the scripted chunks.
            std::future::pending::<()>().await;
        });
        Ok(rx)
    }

    async fn embed(
        &self,
        _ctx: &DispatchContext,
        _request: &EmbedRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<AdapterEmbedOutcome> {
        unimplemented!("not used by streaming tests")
    }
}

pub fn chat_message(content: &str) -> ChatMessage {
    ChatMessage {
        role: "user".to_string(),
        content: content.to_string(),
        has_image: false,
    }
}
