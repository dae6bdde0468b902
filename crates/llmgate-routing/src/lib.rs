//! Routing core: turns a normalised request into a winning `{provider,
//! model}` pair. Credential selection and dispatch live in
//! downstream crates; this crate never touches an API key.

pub mod candidate;
pub mod chain;
pub mod context;
pub mod default_strategies;
pub mod strategy;

pub use candidate::{build_candidates, ProviderHealthSnapshot, ScoredCandidate};
pub use chain::StrategyChain;
pub use context::{build_routing_context, NormalizedRequest, RoutingContext};
pub use default_strategies::default_strategies;
pub use strategy::Strategy;

use llmgate_catalog::{CatalogSnapshot, CredentialId, Model, Provider};
use llmgate_errors::GatewayResult;

/// The outcome of routing, before a credential has been attached.
#[derive(Debug, Clone)]
pub struct RoutingResult {
    pub provider: Provider,
    pub model: Model,
    pub score: f64,
    pub reasons: Vec<String>,
    pub credential_id: Option<CredentialId>,
    pub api_key: String,
}

impl From<ScoredCandidate> for RoutingResult {
    fn from(candidate: ScoredCandidate) -> Self {
        Self {
            provider: candidate.provider,
            model: candidate.model,
            score: candidate.score,
            reasons: candidate.reasons,
            credential_id: None,
            api_key: String::new(),
        }
    }
}

/// Runs the full routing pipeline: build the context, build
/// the candidate set, run it through the strategy chain, and hand back the
/// winner as a `RoutingResult` with no credential attached yet.
pub fn route(
    request: &NormalizedRequest,
    catalog: &CatalogSnapshot,
    health: &ProviderHealthSnapshot,
    chain: &StrategyChain,
) -> GatewayResult<RoutingResult> {
    let mut ctx = build_routing_context(request);
    let candidates = build_candidates(&mut ctx, catalog, health)?;
    let winner = chain.run(&ctx, candidates)?;
    Ok(winner.into())
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use llmgate_catalog::{CapabilityTag, Model, Provider, ProviderType};
    use time::OffsetDateTime;

    use super::*;

    fn provider(id: i64) -> Provider {
        Provider {
            id,
            name: format!("p{id}"),
            provider_type: ProviderType::Openai,
            base_url: "https://api.example.com".into(),
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

    fn model(id: &str, provider_id: i64) -> Model {
        Model {
            id: id.to_string(),
            provider_id,
            display_name: id.to_string(),
            capabilities: [CapabilityTag::Chat].into_iter().collect::<BTreeSet<_>>(),
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

    #[test]
    fn end_to_end_happy_path_picks_the_only_model() {
        let catalog = CatalogSnapshot {
            providers: vec![provider(1)],
            models: vec![model("gpt-4o", 1)],
            credentials: vec![],
            groups: vec![],
        };
        let chain = StrategyChain::default_chain();
        let result = route(
            &NormalizedRequest::chat(None),
            &catalog,
            &ProviderHealthSnapshot::new(),
            &chain,
        )
        .unwrap();
        assert_eq!(result.model.id, "gpt-4o");
        assert!(result.credential_id.is_none());
        assert!(result.api_key.is_empty());
    }

    #[test]
    fn vision_request_with_no_matching_model_is_no_available_models() {
        let catalog = CatalogSnapshot {
            providers: vec![provider(1)],
            models: vec![model("text-only", 1)],
            credentials: vec![],
            groups: vec![],
        };
        let chain = StrategyChain::default_chain();
        let request = NormalizedRequest {
            has_vision_content: true,
            ..NormalizedRequest::chat(None)
        };
        let err = route(&request, &catalog, &ProviderHealthSnapshot::new(), &chain).unwrap_err();
        assert!(matches!(err, llmgate_errors::GatewayError::NoAvailableModels));
    }
}
