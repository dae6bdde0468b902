//! A small standalone binary that wires the routing/dispatch core end to
//! end against an in-memory catalog and a canned adapter, so the core can
//! be exercised without a real vendor or a real HTTP front end (both out of
//! scope for this crate).

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use clap::Parser;
use time::OffsetDateTime;
use tokio::sync::{mpsc, RwLock};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use llmgate_catalog::{
    CapabilityTag, CatalogSnapshot, CatalogView, InMemoryCatalogStore, Model, Provider, ProviderType, Usage,
};
use llmgate_common::FailureThresholds;
use llmgate_credential::{CredentialPool, EventHub, PlaintextCrypto};
use llmgate_dispatch::{
    Adapter, AdapterChatOutcome, AdapterEmbedOutcome, AdapterRegistry, ChatChunk, ChatMessage, ChatRequest,
    ChunkStream, DispatchContext, DispatchEngine, EmbedRequest, NoopEmbeddingCache, NoopHealthCache, UsageRecorder,
};
use llmgate_errors::GatewayResult;
use llmgate_health::HealthMonitor;
use llmgate_routing::{ProviderHealthSnapshot, StrategyChain};

#[derive(Debug, Parser)]
#[command(name = "llmgate-demo", about = "Exercises the routing/dispatch core against a canned adapter")]
struct CliArgs {
    /// Message to send as a single-turn chat request.
    #[arg(long, default_value = "hello there")]
    message: String,

    /// Stream the reply instead of waiting for the full response.
    #[arg(long)]
    stream: bool,

    #[arg(long, env = "LLMGATE_LOG", default_value = "llmgate=info")]
    log_filter: String,
}

/// Logs usage to stdout instead of a real billing sink, standing in for the
/// `UsageRecorder` port a surrounding service would provide.
struct StdoutUsageRecorder;

#[async_trait]
impl UsageRecorder for StdoutUsageRecorder {
    async fn record_usage(
        &self,
        user_id: Option<&str>,
        model_id: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost_usd: f64,
    ) {
        tracing::info!(
            user_id,
            model_id,
            prompt_tokens,
            completion_tokens,
            cost_usd,
            "usage recorded"
        );
    }
}

/// Canned single-vendor adapter: echoes the last user message back with a
/// fixed prefix, in three chunks when streaming. Stands in for a real
/// vendor SDK wrapper (out of scope for this crate).
struct EchoAdapter;

#[async_trait]
impl Adapter for EchoAdapter {
    fn provider_type(&self) -> ProviderType {
        ProviderType::Generic
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
        request: &ChatRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<AdapterChatOutcome> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or_default();
        Ok(AdapterChatOutcome {
            id: "demo-0".into(),
            message: ChatMessage {
                role: "assistant".into(),
                content: format!("echo: {last_user}"),
                has_image: false,
            },
            finish_reason: Some("stop".into()),
            usage: Some(Usage {
                prompt_tokens: last_user.len() as u64 / 4,
                completion_tokens: 10,
                total_tokens: last_user.len() as u64 / 4 + 10,
            }),
        })
    }

    async fn chat_stream(
        &self,
        _ctx: &DispatchContext,
        request: &ChatRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<ChunkStream> {
        let last_user = request
            .messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.clone())
            .unwrap_or_default();
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(async move {
            let words = ["echo:", last_user.as_str(), "(streamed)"];
            for (i, word) in words.iter().enumerate() {
                let finish_reason = if i + 1 == words.len() { Some("stop".into()) } else { None };
                let usage = if i + 1 == words.len() {
                    Some(Usage {
                        prompt_tokens: 4,
                        completion_tokens: 3,
                        total_tokens: 7,
                    })
                } else {
                    None
                };
                if tx
                    .send(Ok(ChatChunk {
                        delta: format!("{word} "),
                        finish_reason,
                        usage,
                    }))
                    .await
                    .is_err()
                {
                    return;
                }
            }
        });
        Ok(rx)
    }

    async fn embed(
        &self,
        _ctx: &DispatchContext,
        request: &EmbedRequest,
        _model: &Model,
        _provider: &Provider,
        _api_key: &str,
    ) -> GatewayResult<AdapterEmbedOutcome> {
        let embeddings = request.input.iter().map(|_| vec![0.0_f32; 8]).collect();
        Ok(AdapterEmbedOutcome {
            embeddings,
            usage: Some(Usage {
                prompt_tokens: request.estimated_input_tokens() as u64,
                completion_tokens: 0,
                total_tokens: request.estimated_input_tokens() as u64,
            }),
        })
    }
}

fn seed_catalog() -> CatalogSnapshot {
    let now = OffsetDateTime::UNIX_EPOCH;
    CatalogSnapshot {
        providers: vec![Provider {
            id: 1,
            name: "demo-vendor".into(),
            provider_type: ProviderType::Generic,
            base_url: "https://example.invalid".into(),
            api_key: Some("sk-demo".into()),
            enabled: true,
            weight: 1,
            priority: 0,
            rate_limit: None,
            options: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }],
        models: vec![Model {
            id: "demo-chat".into(),
            provider_id: 1,
            display_name: "Demo Chat".into(),
            capabilities: [CapabilityTag::Chat, CapabilityTag::Stream]
                .into_iter()
                .collect::<BTreeSet<_>>(),
            context_window: 32_000,
            max_output_tokens: 2048,
            input_cost_per_1k: 0.001,
            output_cost_per_1k: 0.002,
            enabled: true,
            options: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }],
        credentials: vec![],
        groups: vec![],
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| args.log_filter.clone().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let catalog = Arc::new(CatalogView::new(seed_catalog()));
    let store: Arc<dyn llmgate_catalog::CatalogStore> = Arc::new(InMemoryCatalogStore::new());

    let mut registry = AdapterRegistry::new();
    registry.register(Arc::new(EchoAdapter));

    let provider_health: Arc<RwLock<ProviderHealthSnapshot>> = Arc::new(RwLock::new(ProviderHealthSnapshot::new()));
    let engine = Arc::new(DispatchEngine::new(
        catalog.clone(),
        store,
        StrategyChain::default_chain(),
        Arc::new(CredentialPool::new(EventHub::new(64), FailureThresholds::default())),
        Arc::new(PlaintextCrypto),
        Arc::new(registry),
        Arc::new(StdoutUsageRecorder),
        Arc::new(NoopHealthCache),
        provider_health,
    ));
    // EmbeddingCache is declared but unused by the engine today (see
    // llmgate_dispatch::ports); keeping a handle here documents the wiring
    // point a future embeddings-caching layer would take.
    let _embedding_cache: Arc<dyn llmgate_dispatch::EmbeddingCache> = Arc::new(NoopEmbeddingCache);

    let root_token = CancellationToken::new();
    let health_monitor = HealthMonitor::new(catalog, engine.clone()).with_interval(Duration::from_secs(30));
    let health_handle = health_monitor.start(&root_token);

    let ctx = DispatchContext::generate();
    let request = ChatRequest {
        messages: vec![ChatMessage {
            role: "user".into(),
            content: args.message.clone(),
            has_image: false,
        }],
        stream: args.stream,
        ..Default::default()
    };

    if args.stream {
        let (routing_info, mut rx) = engine.chat_stream(&ctx, Some("demo-user"), request).await?;
        println!("routed to {} / {}", routing_info.provider, routing_info.model);
        while let Some(chunk) = rx.recv().await {
            match chunk {
                Ok(chunk) => print!("{}", chunk.delta),
                Err(err) => {
                    eprintln!("\nstream error: {err}");
                    break;
                }
            }
        }
        println!();
    } else {
        let response = engine.chat(&ctx, Some("demo-user"), request).await?;
        println!(
            "routed to {} / {} (cost ${:.6})",
            response.routing_info.provider, response.routing_info.model, response.routing_info.cost_usd
        );
        println!("{}", response.message.content);
    }

    root_token.cancel();
    health_handle.stop().await;
    Ok(())
}
