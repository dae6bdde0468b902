//! The dispatch engine: the shared 5-step envelope behind the three entry
//! points (chat, chat_stream, embed). Route, obtain a credential, invoke
//! the adapter, then apply success/failure side effects. The envelope is
//! deliberately protocol-agnostic; wire-level transforms belong to the
//! HTTP adapter layer, not here.

use std::sync::Arc;
use std::time::{Duration, Instant};

use llmgate_catalog::{CatalogView, ProviderId, Usage};
use llmgate_credential::{select_for_provider, CredentialPool, Crypto};
use llmgate_errors::{GatewayError, GatewayResult};
use llmgate_routing::{NormalizedRequest, ProviderHealthSnapshot, RoutingResult, StrategyChain};
use tokio::sync::{mpsc, RwLock};

use crate::adapter::{AdapterRegistry, DispatchContext};
use crate::ports::{HealthCache, UsageRecorder};
use crate::types::{ChatChunk, ChatRequest, ChatResponse, EmbedRequest, EmbedResponse, RoutingInfo};

pub struct DispatchEngine {
    catalog: Arc<CatalogView>,
    store: Arc<dyn llmgate_catalog::CatalogStore>,
    chain: StrategyChain,
    credential_pool: Arc<CredentialPool>,
    crypto: Arc<dyn Crypto>,
    adapters: Arc<AdapterRegistry>,
    usage_recorder: Arc<dyn UsageRecorder>,
    health_cache: Arc<dyn HealthCache>,
    provider_health: Arc<RwLock<ProviderHealthSnapshot>>,
}

impl DispatchEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        catalog: Arc<CatalogView>,
        store: Arc<dyn llmgate_catalog::CatalogStore>,
        chain: StrategyChain,
        credential_pool: Arc<CredentialPool>,
        crypto: Arc<dyn Crypto>,
        adapters: Arc<AdapterRegistry>,
        usage_recorder: Arc<dyn UsageRecorder>,
        health_cache: Arc<dyn HealthCache>,
        provider_health: Arc<RwLock<ProviderHealthSnapshot>>,
    ) -> Self {
        Self {
            catalog,
            store,
            chain,
            credential_pool,
            crypto,
            adapters,
            usage_recorder,
            health_cache,
            provider_health,
        }
    }

    async fn route_and_select_credential(
        &self,
        request: &NormalizedRequest,
    ) -> GatewayResult<RoutingResult> {
        let snapshot = self.catalog.load();
        let health = self.provider_health.read().await.clone();
        let mut result = llmgate_routing::route(request, &snapshot, &health, &self.chain)?;

        let candidates = self
            .store
            .find_available_credentials_by_provider(result.provider.id)
            .await
            .unwrap_or_default();
        let selected =
            select_for_provider(&self.credential_pool, candidates, &result.provider, self.crypto.as_ref())
                .await?;
        result.credential_id = selected.credential_id;
        result.api_key = selected.api_key;
        Ok(result)
    }

    /// Step 5 on a transport-class failure: bumps the credential's
    /// consecutive-failure counter and transitions its health, mirrors the
    /// new status into the catalog store (best-effort). No-op for the
    /// provider fallback key (no credential id to track).
    async fn on_failure(&self, credential_id: Option<i64>, error: &GatewayError) {
        let Some(id) = credential_id else { return };
        if !error.is_transport() {
            return;
        }
        let new_health = self.credential_pool.record_failure(id).await;
        let failures = self
            .credential_pool
            .health_of(id)
            .await
            .map(|(_, f)| f)
            .unwrap_or(0);
        if let Err(err) = self
            .store
            .update_credential_health(id, new_health, failures)
            .await
        {
            tracing::warn!(credential_id = id, error = %err, "failed to persist credential health");
        }
    }

    /// Step 4 on success: resets the credential's health and records usage,
    /// both best-effort.
    async fn on_success(
        &self,
        user_id: Option<&str>,
        credential_id: Option<i64>,
        model_id: &str,
        usage: Option<Usage>,
        cost_usd: f64,
    ) {
        if let Some(id) = credential_id {
            self.credential_pool.record_success(id).await;
            let usage = usage.unwrap_or_default();
            if let Err(err) = self
                .store
                .increment_credential_usage(id, 1, usage.total_tokens, cost_usd)
                .await
            {
                tracing::warn!(credential_id = id, error = %err, "failed to persist credential usage");
            }
        }

        let usage = usage.unwrap_or_default();
        self.usage_recorder
            .record_usage(user_id, model_id, usage.prompt_tokens, usage.completion_tokens, cost_usd)
            .await;
    }

    pub async fn chat(
        &self,
        ctx: &DispatchContext,
        user_id: Option<&str>,
        request: ChatRequest,
    ) -> GatewayResult<ChatResponse> {
        let normalized = chat_to_normalized_request(&request);
        let routed = self.route_and_select_credential(&normalized).await?;

        let adapter = self.adapters.get_for_provider(&routed.provider)?;
        let started = Instant::now();
        let outcome = adapter
            .chat(ctx, &request, &routed.model, &routed.provider, &routed.api_key)
            .await;

        match outcome {
            Ok(outcome) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let cost_usd = llmgate_cost::calculate_cost(
                    outcome.usage,
                    routed.model.input_cost_per_1k,
                    routed.model.output_cost_per_1k,
                );
                self.on_success(user_id, routed.credential_id, &routed.model.id, outcome.usage, cost_usd)
                    .await;
                Ok(ChatResponse {
                    id: outcome.id,
                    model: routed.model.id.clone(),
                    message: outcome.message,
                    finish_reason: outcome.finish_reason,
                    usage: outcome.usage,
                    routing_info: RoutingInfo {
                        provider: routed.provider.name.clone(),
                        model: routed.model.id.clone(),
                        latency_ms,
                        cost_usd,
                        credential_id: routed.credential_id,
                    },
                })
            }
            Err(err) => {
                self.on_failure(routed.credential_id, &err).await;
                Err(err)
            }
        }
    }

    pub async fn chat_stream(
        &self,
        ctx: &DispatchContext,
        user_id: Option<&str>,
        request: ChatRequest,
    ) -> GatewayResult<(RoutingInfo, mpsc::Receiver<GatewayResult<ChatChunk>>)> {
        let normalized = chat_to_normalized_request(&request);
        let routed = self.route_and_select_credential(&normalized).await?;

        let adapter = self.adapters.get_for_provider(&routed.provider)?;
        let mut upstream = adapter
            .chat_stream(ctx, &request, &routed.model, &routed.provider, &routed.api_key)
            .await?;

        let routing_info = RoutingInfo {
            provider: routed.provider.name.clone(),
            model: routed.model.id.clone(),
            latency_ms: 0,
            cost_usd: 0.0,
            credential_id: routed.credential_id,
        };

        // Forwarding task: preserves adapter order, stops within one chunk
        // boundary on cancellation, closes the outbound channel when the
        // adapter's stream ends.
        let (tx, rx) = mpsc::channel(1);
        let cancellation = ctx.cancellation.clone();
        let credential_pool = self.credential_pool.clone();
        let store = self.store.clone();
        let usage_recorder = self.usage_recorder.clone();
        let credential_id = routed.credential_id;
        let user_id = user_id.map(str::to_string);
        let model_id = routed.model.id.clone();
        let input_cost_per_1k = routed.model.input_cost_per_1k;
        let output_cost_per_1k = routed.model.output_cost_per_1k;
        tokio::spawn(async move {
            let mut last_usage = None;
            loop {
                // Biased: a cancellation that raced a buffered chunk into
                // readiness at the same instant must still win, so the
                // caller never sees a chunk after cancelling.
                let next = tokio::select! {
                    biased;
                    _ = cancellation.cancelled() => {
                        let _ = tx.send(Err(GatewayError::Cancelled)).await;
                        return;
                    }
                    chunk = upstream.recv() => chunk,
                };

                match next {
                    Some(Ok(chunk)) => {
                        if chunk.usage.is_some() {
                            last_usage = chunk.usage;
                        }
                        if tx.send(Ok(chunk)).await.is_err() {
                            return;
                        }
                    }
                    Some(Err(err)) => {
                        if let Some(id) = credential_id {
                            if err.is_transport() {
                                let new_health = credential_pool.record_failure(id).await;
                                let failures = credential_pool
                                    .health_of(id)
                                    .await
                                    .map(|(_, f)| f)
                                    .unwrap_or(0);
                                let _ = store.update_credential_health(id, new_health, failures).await;
                            }
                        }
                        let _ = tx.send(Err(err)).await;
                        return;
                    }
                    None => break,
                }
            }

            // Clean close: attach usage/cost the same way the non-streaming
            // entry points do.
            let cost_usd =
                llmgate_cost::calculate_cost(last_usage, input_cost_per_1k, output_cost_per_1k);
            if let Some(id) = credential_id {
                credential_pool.record_success(id).await;
                let usage = last_usage.unwrap_or_default();
                let _ = store
                    .increment_credential_usage(id, 1, usage.total_tokens, cost_usd)
                    .await;
            }
            let usage = last_usage.unwrap_or_default();
            usage_recorder
                .record_usage(
                    user_id.as_deref(),
                    &model_id,
                    usage.prompt_tokens,
                    usage.completion_tokens,
                    cost_usd,
                )
                .await;
        });

        Ok((routing_info, rx))
    }

    pub async fn embed(
        &self,
        ctx: &DispatchContext,
        user_id: Option<&str>,
        request: EmbedRequest,
    ) -> GatewayResult<EmbedResponse> {
        let normalized = embed_to_normalized_request(&request);
        let routed = self.route_and_select_credential(&normalized).await?;

        let adapter = self.adapters.get_for_provider(&routed.provider)?;
        let started = Instant::now();
        let outcome = adapter
            .embed(ctx, &request, &routed.model, &routed.provider, &routed.api_key)
            .await;

        match outcome {
            Ok(outcome) => {
                let latency_ms = started.elapsed().as_millis() as u64;
                let cost_usd = llmgate_cost::calculate_cost(
                    outcome.usage,
                    routed.model.input_cost_per_1k,
                    routed.model.output_cost_per_1k,
                );
                self.on_success(user_id, routed.credential_id, &routed.model.id, outcome.usage, cost_usd)
                    .await;
                Ok(EmbedResponse {
                    embeddings: outcome.embeddings,
                    usage: outcome.usage,
                    routing_info: RoutingInfo {
                        provider: routed.provider.name.clone(),
                        model: routed.model.id.clone(),
                        latency_ms,
                        cost_usd,
                        credential_id: routed.credential_id,
                    },
                })
            }
            Err(err) => {
                self.on_failure(routed.credential_id, &err).await;
                Err(err)
            }
        }
    }

    pub async fn provider_health_check(&self, provider_id: ProviderId) -> GatewayResult<bool> {
        let snapshot = self.catalog.load();
        let provider = snapshot
            .provider(provider_id)
            .ok_or_else(|| GatewayError::ProviderNotFound(provider_id.to_string()))?;
        let adapter = self.adapters.get_for_provider(provider)?;
        let api_key = provider.api_key.clone().unwrap_or_default();
        let healthy = adapter.health_check(provider, &api_key).await.is_ok();
        self.provider_health.write().await.insert(provider_id, healthy);
        self.health_cache
            .set_provider_health(provider_id, healthy, Duration::from_secs(60))
            .await;
        Ok(healthy)
    }
}

fn chat_to_normalized_request(request: &ChatRequest) -> NormalizedRequest {
    NormalizedRequest {
        task_type: Some(llmgate_common::TaskType::Chat),
        model_hint: request.model.clone(),
        stream: request.stream,
        tools_non_empty: request.tools_non_empty(),
        has_vision_content: request.has_vision_content(),
        json_mode_requested: request.json_mode,
        group_id: request.group_id.clone(),
        estimated_input_tokens: request.estimated_input_tokens(),
        min_context_window: request.min_context_window,
        max_cost_per_1k: request.max_cost_per_1k,
        optimize: request.optimize,
        excluded_provider_ids: request.excluded_provider_ids.clone(),
    }
}

fn embed_to_normalized_request(request: &EmbedRequest) -> NormalizedRequest {
    NormalizedRequest {
        task_type: Some(llmgate_common::TaskType::Embedding),
        model_hint: request.model.clone(),
        estimated_input_tokens: request.estimated_input_tokens(),
        excluded_provider_ids: request.excluded_provider_ids.clone(),
        optimize: llmgate_common::Optimize::None,
        ..Default::default()
    }
}

