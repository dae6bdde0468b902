//! The 6 default strategies and their priorities.

use rand::Rng;

use crate::candidate::ScoredCandidate;
use crate::context::RoutingContext;
use crate::strategy::Strategy;

/// Priority 100. Soft preference: drops non-preferred candidates unless that
/// would empty the set.
pub struct UserPreference;

impl Strategy for UserPreference {
    fn name(&self) -> &'static str {
        "user_preference"
    }

    fn priority(&self) -> i32 {
        100
    }

    fn filter(&self, ctx: &RoutingContext, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        if ctx.preferred_model_ids.is_empty() {
            return candidates;
        }
        let filtered: Vec<_> = candidates
            .iter()
            .filter(|c| ctx.preferred_model_ids.iter().any(|m| m == &c.model.id))
            .cloned()
            .collect();
        if filtered.is_empty() {
            candidates
        } else {
            filtered
        }
    }

    fn score(&self, ctx: &RoutingContext, candidates: &mut [ScoredCandidate]) {
        if ctx.preferred_model_ids.is_empty() {
            return;
        }
        let n = ctx.preferred_model_ids.len() as f64;
        for candidate in candidates.iter_mut() {
            if let Some(index) = ctx.preferred_model_ids.iter().position(|m| m == &candidate.model.id) {
                let delta = 10.0 * (n - index as f64);
                candidate.add_score(self.name(), delta, format!("preferred at position {index}"));
            }
        }
    }
}

/// Priority 90. Drops candidates whose provider is unhealthy, unless that
/// would empty the set (availability beats health signal).
pub struct HealthFilter;

impl Strategy for HealthFilter {
    fn name(&self) -> &'static str {
        "health_filter"
    }

    fn priority(&self) -> i32 {
        90
    }

    fn filter(&self, ctx: &RoutingContext, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        let filtered: Vec<_> = candidates
            .iter()
            .filter(|c| ctx.provider_health.get(&c.provider.id).copied().unwrap_or(true))
            .cloned()
            .collect();
        if filtered.is_empty() {
            candidates
        } else {
            filtered
        }
    }
}

/// Priority 80. Drops models that don't cover every required capability,
/// including the ones implied by the request's `require_*` flags.
pub struct CapabilityFilter;

impl Strategy for CapabilityFilter {
    fn name(&self) -> &'static str {
        "capability_filter"
    }

    fn priority(&self) -> i32 {
        80
    }

    fn filter(&self, ctx: &RoutingContext, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        let required = ctx.effective_required_capabilities();
        candidates
            .into_iter()
            .filter(|c| c.model.covers(&required))
            .collect()
    }
}

/// Priority 70. Drops models whose context window is too small for the
/// request; if that would empty the set, keeps the largest-window
/// candidates instead. Scores by relative context window size.
pub struct ContextWindow;

impl Strategy for ContextWindow {
    fn name(&self) -> &'static str {
        "context_window"
    }

    fn priority(&self) -> i32 {
        70
    }

    fn filter(&self, ctx: &RoutingContext, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        let required = ctx
            .min_context_window
            .max(ctx.estimated_input_tokens.saturating_add(4096));
        let filtered: Vec<_> = candidates
            .iter()
            .filter(|c| c.model.context_window >= required)
            .cloned()
            .collect();
        if !filtered.is_empty() {
            return filtered;
        }

        let max_cw = candidates.iter().map(|c| c.model.context_window).max().unwrap_or(0);
        candidates
            .into_iter()
            .filter(|c| c.model.context_window == max_cw)
            .collect()
    }

    fn score(&self, _ctx: &RoutingContext, candidates: &mut [ScoredCandidate]) {
        let max_cw = candidates.iter().map(|c| c.model.context_window).max().unwrap_or(0);
        if max_cw == 0 {
            return;
        }
        for candidate in candidates.iter_mut() {
            let delta = 5.0 * (candidate.model.context_window as f64 / max_cw as f64);
            candidate.add_score(self.name(), delta, "context window ratio");
        }
    }
}

/// Priority 50. Only scores (never filters) when `optimize = cost`: rewards
/// candidates near the cheapest per-1k cost in the current candidate set.
pub struct CostOptimization;

impl Strategy for CostOptimization {
    fn name(&self) -> &'static str {
        "cost_optimization"
    }

    fn priority(&self) -> i32 {
        50
    }

    fn score(&self, ctx: &RoutingContext, candidates: &mut [ScoredCandidate]) {
        if ctx.optimize != llmgate_common::Optimize::Cost {
            return;
        }
        let min_cost = candidates
            .iter()
            .map(|c| c.model.cost_per_1k())
            .fold(f64::INFINITY, f64::min);
        if !min_cost.is_finite() || min_cost <= 0.0 {
            return;
        }
        for candidate in candidates.iter_mut() {
            let this_cost = candidate.model.cost_per_1k();
            if this_cost <= 0.0 {
                continue;
            }
            let delta = 20.0 * (min_cost / this_cost);
            candidate.add_score(self.name(), delta, "cost optimization");
        }
    }
}

/// Priority 10. Additive jitter, not a separate picker, so higher-weight
/// signals still dominate for small populations.
pub struct LoadBalancing;

impl Strategy for LoadBalancing {
    fn name(&self) -> &'static str {
        "load_balancing"
    }

    fn priority(&self) -> i32 {
        10
    }

    fn score(&self, _ctx: &RoutingContext, candidates: &mut [ScoredCandidate]) {
        let mut rng = rand::rng();
        for candidate in candidates.iter_mut() {
            let jitter = rng.random_range(0.0..0.1);
            candidate.add_score(self.name(), jitter, "load balancing jitter");
        }
    }
}

/// The 6 default strategies, in priority order.
pub fn default_strategies() -> Vec<Box<dyn Strategy>> {
    vec![
        Box::new(UserPreference),
        Box::new(HealthFilter),
        Box::new(CapabilityFilter),
        Box::new(ContextWindow),
        Box::new(CostOptimization),
        Box::new(LoadBalancing),
    ]
}

#[cfg(test)]
mod tests {
    use std::collections::{BTreeSet, HashMap};

    use llmgate_catalog::{CapabilityTag, Model, Provider, ProviderType};
    use time::OffsetDateTime;

    use super::*;
    use crate::context::{build_routing_context, NormalizedRequest};

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

    fn candidate(provider: Provider, model: Model) -> ScoredCandidate {
        ScoredCandidate {
            provider,
            model,
            score: 0.0,
            breakdown: Vec::new(),
            reasons: Vec::new(),
        }
    }

    /// Testable property 3: preference softness. A preference that matches
    /// nothing in the candidate set must not empty it.
    #[test]
    fn user_preference_keeps_all_candidates_when_preference_is_unmet() {
        let ctx = build_routing_context(&NormalizedRequest::chat(Some("gpt-4".to_string())));
        let candidates = vec![candidate(provider(1), model("claude-3", 1))];
        let kept = UserPreference.filter(&ctx, candidates);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].model.id, "claude-3");
    }

    /// Testable property 5: health softness. If every candidate's provider
    /// is unhealthy, the filter must not empty the set.
    #[test]
    fn health_filter_keeps_all_candidates_when_everything_is_unhealthy() {
        let mut ctx = build_routing_context(&NormalizedRequest::chat(None));
        ctx.provider_health = HashMap::from([(1, false), (2, false)]);
        let candidates = vec![
            candidate(provider(1), model("m1", 1)),
            candidate(provider(2), model("m2", 2)),
        ];
        let kept = HealthFilter.filter(&ctx, candidates);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn health_filter_drops_only_the_unhealthy_ones_when_some_are_healthy() {
        let mut ctx = build_routing_context(&NormalizedRequest::chat(None));
        ctx.provider_health = HashMap::from([(1, false), (2, true)]);
        let candidates = vec![
            candidate(provider(1), model("m1", 1)),
            candidate(provider(2), model("m2", 2)),
        ];
        let kept = HealthFilter.filter(&ctx, candidates);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].provider.id, 2);
    }
}
