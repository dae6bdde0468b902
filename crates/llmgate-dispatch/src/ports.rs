//! `UsageRecorder` and `HealthCache` ports. Both are best-effort:
//! failures are logged, never propagated to the caller.

use std::time::Duration;

use async_trait::async_trait;
use llmgate_catalog::ProviderId;

#[async_trait]
pub trait UsageRecorder: Send + Sync {
    async fn record_usage(
        &self,
        user_id: Option<&str>,
        model_id: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost_usd: f64,
    );
}

#[async_trait]
pub trait HealthCache: Send + Sync {
    async fn set_provider_health(&self, provider_id: ProviderId, healthy: bool, ttl: Duration);
}

/// Default no-op, used when the surrounding service doesn't wire an
/// external health cache.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopHealthCache;

#[async_trait]
impl HealthCache for NoopHealthCache {
    async fn set_provider_health(&self, _provider_id: ProviderId, _healthy: bool, _ttl: Duration) {}
}

/// Declared for future use (Non-goals: "no response caching except an
/// embeddings cache port described but not implemented"). The engine never
/// calls this today; it exists so a surrounding service can wire one in
/// without a trait-shape change later.
#[async_trait]
pub trait EmbeddingCache: Send + Sync {
    async fn get(&self, cache_key: &str) -> Option<Vec<Vec<f32>>>;
    async fn put(&self, cache_key: &str, embeddings: Vec<Vec<f32>>, ttl: Duration);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NoopEmbeddingCache;

#[async_trait]
impl EmbeddingCache for NoopEmbeddingCache {
    async fn get(&self, _cache_key: &str) -> Option<Vec<Vec<f32>>> {
        None
    }

    async fn put(&self, _cache_key: &str, _embeddings: Vec<Vec<f32>>, _ttl: Duration) {}
}
