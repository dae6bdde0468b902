//! Credential pool selector and health state machine. Resolves an encrypted API key at call time; the decrypted key
//! never outlives one routing result and is never logged.

pub mod crypto;
pub mod events;
pub mod health;
pub mod pool;
pub mod recovery;
pub mod select;

pub use crypto::{Crypto, DecryptError, PlaintextCrypto};
pub use events::{CredentialEvent, EventHub, EventSink};
pub use pool::CredentialPool;
pub use select::{select_credential, SelectedCredential};

use llmgate_catalog::{Credential, Provider};
use llmgate_errors::GatewayResult;

/// Composes the pool's live health filter with the selection algorithm:
/// drops candidates the pool currently considers unhealthy, then runs the
/// 3-step selection over what's left. `candidates` is still expected to be
/// the store's "available" set; this only adds the in-process view the
/// store may not have caught up to yet.
pub async fn select_for_provider(
    pool: &CredentialPool,
    candidates: Vec<Credential>,
    provider: &Provider,
    crypto: &dyn Crypto,
) -> GatewayResult<SelectedCredential> {
    let mut selectable = Vec::with_capacity(candidates.len());
    for candidate in candidates {
        if pool.is_selectable(candidate.id).await {
            selectable.push(candidate);
        }
    }
    select_credential(selectable, provider, crypto)
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use llmgate_catalog::{CredentialHealth, ProviderType, RateLimitConfig};
    use llmgate_common::FailureThresholds;

    use super::*;

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
            rate_limit: None::<RateLimitConfig>,
            options: serde_json::json!({}),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn credential(id: i64) -> Credential {
        Credential {
            id,
            provider_id: 1,
            display_name: format!("cred-{id}"),
            encrypted_key: b"sk-real".to_vec(),
            key_prefix: "sk-r".into(),
            weight: 1,
            priority: 0,
            is_active: true,
            health: CredentialHealth::Healthy,
            consecutive_failures: 0,
            rate_limit: None,
            total_requests: 0,
            total_tokens: 0,
            total_cost_usd: 0.0,
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[tokio::test]
    async fn unhealthy_credential_is_excluded_and_fallback_key_is_used() {
        let pool = CredentialPool::new(EventHub::new(16), FailureThresholds::default());
        for _ in 0..10 {
            pool.record_failure(1).await;
        }
        let result = select_for_provider(&pool, vec![credential(1)], &provider(), &PlaintextCrypto)
            .await
            .unwrap();
        assert_eq!(result.credential_id, None);
        assert_eq!(result.api_key, "sk-fallback");
    }

    #[tokio::test]
    async fn healthy_credential_is_selected_over_fallback() {
        let pool = CredentialPool::new(EventHub::new(16), FailureThresholds::default());
        let result = select_for_provider(&pool, vec![credential(1)], &provider(), &PlaintextCrypto)
            .await
            .unwrap();
        assert_eq!(result.credential_id, Some(1));
        assert_eq!(result.api_key, "sk-real");
    }
}
