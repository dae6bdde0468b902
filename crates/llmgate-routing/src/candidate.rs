//! Candidate builder: turns a routing context + catalog
//! snapshot into the `{provider, model}` pairs the strategy chain scores.

use std::collections::HashMap;

use llmgate_catalog::{CatalogSnapshot, Model, Provider, ProviderId};
use llmgate_errors::{GatewayError, GatewayResult};

use crate::context::RoutingContext;

/// A `{provider, model}` pair plus a running score, mutated in place through
/// the strategy chain.
#[derive(Debug, Clone)]
pub struct ScoredCandidate {
    pub provider: Provider,
    pub model: Model,
    pub score: f64,
    pub breakdown: Vec<(&'static str, f64)>,
    pub reasons: Vec<String>,
}

impl ScoredCandidate {
    fn new(provider: Provider, model: Model) -> Self {
        Self {
            provider,
            model,
            score: 0.0,
            breakdown: Vec::new(),
            reasons: Vec::new(),
        }
    }

    pub fn add_score(&mut self, strategy: &'static str, delta: f64, reason: impl Into<String>) {
        self.score += delta;
        self.breakdown.push((strategy, delta));
        self.reasons.push(reason.into());
    }
}

/// Provider-health snapshot keyed by provider id; unknown providers are
/// optimistically treated as healthy.
pub type ProviderHealthSnapshot = HashMap<ProviderId, bool>;

/// Builds the initial candidate set and injects the health snapshot into
/// `ctx`. Mutates `ctx.provider_health` as a side effect of step 4.
pub fn build_candidates(
    ctx: &mut RoutingContext,
    catalog: &CatalogSnapshot,
    health: &ProviderHealthSnapshot,
) -> GatewayResult<Vec<ScoredCandidate>> {
    let models: Vec<Model> = if let Some(group_id) = ctx.group_id.clone() {
        let group = catalog
            .group(&group_id)
            .ok_or_else(|| GatewayError::GroupNotFound(group_id.clone()))?;
        if !group.is_routable() {
            return Err(GatewayError::GroupDisabled(group_id));
        }

        let mut models = Vec::new();
        for model_id in &group.member_model_ids {
            match catalog.model(model_id) {
                Some(model) if model.is_routable() => models.push(model.clone()),
                Some(_) => {
                    tracing::warn!(model_id, group_id = %group_id, "group member model is disabled, skipping");
                }
                None => {
                    tracing::warn!(model_id, group_id = %group_id, "group member model not found, skipping");
                }
            }
        }
        models
    } else {
        let required = ctx.effective_required_capabilities();
        catalog
            .enabled_models()
            .filter(|model| required.is_empty() || model.covers(&required))
            .cloned()
            .collect()
    };

    let mut candidates = Vec::new();
    for model in models {
        let Some(provider) = catalog.provider(model.provider_id) else {
            continue;
        };
        if !provider.is_routable() {
            continue;
        }
        if ctx.excluded_provider_ids.contains(&provider.id) {
            continue;
        }
        candidates.push(ScoredCandidate::new(provider.clone(), model));
    }

    // Step 4: inject the live health snapshot into the context so downstream
    // strategies (health_filter) can read it without a second catalog pass.
    ctx.provider_health = health.clone();

    if candidates.is_empty() {
        return Err(GatewayError::NoAvailableModels);
    }

    Ok(candidates)
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;

    use llmgate_catalog::{CapabilityTag, ProviderType};
    use llmgate_common::TaskType;
    use time::OffsetDateTime;

    use super::*;
    use crate::context::build_routing_context;
    use crate::context::NormalizedRequest;

    fn provider(id: ProviderId, enabled: bool) -> Provider {
        Provider {
            id,
            name: format!("p{id}"),
            provider_type: ProviderType::Openai,
            base_url: "https://api.example.com".into(),
            api_key: Some("sk-fallback".into()),
            enabled,
            weight: 1,
            priority: 0,
            rate_limit: None,
            options: serde_json::json!({}),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    fn model(id: &str, provider_id: ProviderId, caps: &[CapabilityTag], enabled: bool) -> Model {
        Model {
            id: id.to_string(),
            provider_id,
            display_name: id.to_string(),
            capabilities: caps.iter().copied().collect::<BTreeSet<_>>(),
            context_window: 8192,
            max_output_tokens: 4096,
            input_cost_per_1k: 0.005,
            output_cost_per_1k: 0.015,
            enabled,
            options: serde_json::json!({}),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn disabled_model_is_dropped() {
        let catalog = CatalogSnapshot {
            providers: vec![provider(1, true)],
            models: vec![model("m1", 1, &[CapabilityTag::Chat], false)],
            credentials: vec![],
            groups: vec![],
        };
        let mut ctx = build_routing_context(&NormalizedRequest::chat(None));
        let result = build_candidates(&mut ctx, &catalog, &ProviderHealthSnapshot::new());
        assert!(matches!(result, Err(GatewayError::NoAvailableModels)));
    }

    #[test]
    fn disabled_provider_drops_its_models() {
        let catalog = CatalogSnapshot {
            providers: vec![provider(1, false)],
            models: vec![model("m1", 1, &[CapabilityTag::Chat], true)],
            credentials: vec![],
            groups: vec![],
        };
        let mut ctx = build_routing_context(&NormalizedRequest::chat(None));
        let result = build_candidates(&mut ctx, &catalog, &ProviderHealthSnapshot::new());
        assert!(matches!(result, Err(GatewayError::NoAvailableModels)));
    }

    #[test]
    fn missing_group_member_is_a_warning_not_an_error() {
        let catalog = CatalogSnapshot {
            providers: vec![provider(1, true)],
            models: vec![model("gpt-3.5", 1, &[CapabilityTag::Chat], true)],
            credentials: vec![],
            groups: vec![llmgate_catalog::ModelGroup {
                id: "chat-default".into(),
                display_name: "Chat default".into(),
                task_type: TaskType::Chat,
                member_model_ids: vec!["gpt-4".into(), "gpt-3.5".into()],
                strategy: llmgate_catalog::entities::GroupStrategyConfig {
                    kind: llmgate_catalog::entities::StrategyKind::Balanced,
                    weights: serde_json::json!({}),
                    max_cost_per_1k: None,
                },
                fallback: llmgate_catalog::entities::GroupFallbackConfig {
                    enabled: false,
                    max_attempts: 0,
                },
                required_capabilities: BTreeSet::new(),
                enabled: true,
            }],
        };
        let mut ctx = build_routing_context(&NormalizedRequest {
            group_id: Some("chat-default".into()),
            ..NormalizedRequest::chat(None)
        });
        let candidates = build_candidates(&mut ctx, &catalog, &ProviderHealthSnapshot::new()).unwrap();
        assert_eq!(candidates.len(), 1);
        assert_eq!(candidates[0].model.id, "gpt-3.5");
    }

    #[test]
    fn health_snapshot_is_injected_into_context() {
        let catalog = CatalogSnapshot {
            providers: vec![provider(1, true)],
            models: vec![model("m1", 1, &[CapabilityTag::Chat], true)],
            credentials: vec![],
            groups: vec![],
        };
        let mut ctx = build_routing_context(&NormalizedRequest::chat(None));
        let mut health = ProviderHealthSnapshot::new();
        health.insert(1, false);
        build_candidates(&mut ctx, &catalog, &health).unwrap();
        assert_eq!(ctx.provider_health.get(&1), Some(&false));
    }
}
