mod support;

use std::collections::BTreeSet;
use std::sync::Arc;

use time::OffsetDateTime;
use tokio::sync::RwLock;

use llmgate_catalog::{CapabilityTag, CatalogSnapshot, CatalogView, InMemoryCatalogStore, Model, Provider, ProviderType};
use llmgate_common::FailureThresholds;
use llmgate_credential::{CredentialPool, EventHub, PlaintextCrypto};
use llmgate_dispatch::{AdapterChatOutcome, AdapterRegistry, ChatMessage, ChatRequest, DispatchContext, DispatchEngine, NoopHealthCache};
use llmgate_routing::StrategyChain;

use support::{chat_message, ScriptedAdapter};

fn provider() -> Provider {
    Provider {
        id: 1,
        name: "openai-main".into(),
        provider_type: ProviderType::Openai,
        base_url: "https://api.openai.com".into(),
        api_key: Some("sk-fallback".into()),
        enabled: true,
        weight: 1,
        priority: 0,
        rate_limit: None,
        options: serde_json::json!({}),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

fn model() -> Model {
    Model {
        id: "gpt-4o".into(),
        provider_id: 1,
        display_name: "gpt-4o".into(),
        capabilities: [CapabilityTag::Chat, CapabilityTag::Stream]
            .into_iter()
            .collect::<BTreeSet<_>>(),
        context_window: 128_000,
        max_output_tokens: 4096,
        input_cost_per_1k: 0.005,
        output_cost_per_1k: 0.015,
        enabled: true,
        options: serde_json::json!({}),
        created_at: OffsetDateTime::UNIX_EPOCH,
        updated_at: OffsetDateTime::UNIX_EPOCH,
    }
}

struct NoopUsageRecorder;

#[async_trait::async_trait]
impl llmgate_dispatch::UsageRecorder for NoopUsageRecorder {
    async fn record_usage(&self, _user_id: Option<&str>, _model_id: &str, _p: u64, _c: u64, _cost: f64) {}
}

/// Chat happy path, no stored credentials, provider fallback key.
#[tokio::test]
async fn chat_happy_path_uses_fallback_key_and_computes_cost() {
    let catalog = CatalogView::new(CatalogSnapshot {
        providers: vec![provider()],
        models: vec![model()],
        credentials: vec![],
        groups: vec![],
    });

    let mut registry = AdapterRegistry::new();
    let adapter = Arc::new(ScriptedAdapter::new(vec![Ok(AdapterChatOutcome {
        id: "x".into(),
        message: ChatMessage {
            role: "assistant".into(),
            content: "hi".into(),
            has_image: false,
        },
        finish_reason: Some("stop".into()),
        usage: Some(llmgate_catalog::Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    })]));
    registry.register(adapter);

    let store = Arc::new(InMemoryCatalogStore::new());
    let engine = DispatchEngine::new(
        Arc::new(catalog),
        store,
        StrategyChain::default_chain(),
        Arc::new(CredentialPool::new(EventHub::new(16), FailureThresholds::default())),
        Arc::new(PlaintextCrypto),
        Arc::new(registry),
        Arc::new(NoopUsageRecorder),
        Arc::new(NoopHealthCache),
        Arc::new(RwLock::new(Default::default())),
    );

    let ctx = DispatchContext::new("trace-1");
    let request = ChatRequest {
        messages: vec![chat_message("hello")],
        model: Some("auto".to_string()),
        ..Default::default()
    };

    let response = engine.chat(&ctx, None, request).await.unwrap();
    assert_eq!(response.routing_info.model, "gpt-4o");
    assert_eq!(response.message.content, "hi");
    assert!((response.routing_info.cost_usd - 0.000125).abs() < 1e-9);
}
