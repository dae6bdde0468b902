//! The strategy chain driver: sorts strategies by descending
//! priority, runs filter then score for each, and picks the final winner.

use std::cmp::Ordering;

use llmgate_errors::{GatewayError, GatewayResult};

use crate::candidate::ScoredCandidate;
use crate::context::RoutingContext;
use crate::default_strategies::default_strategies;
use crate::strategy::Strategy;

pub struct StrategyChain {
    strategies: Vec<Box<dyn Strategy>>,
}

impl StrategyChain {
    pub fn new(mut strategies: Vec<Box<dyn Strategy>>) -> Self {
        strategies.sort_by(|a, b| b.priority().cmp(&a.priority()));
        Self { strategies }
    }

    pub fn default_chain() -> Self {
        Self::new(default_strategies())
    }

    /// Runs every strategy in priority order and returns the winning
    /// candidate. Empty after any filter step surfaces `routing-failed` with
    /// that strategy's name.
    pub fn run(
        &self,
        ctx: &RoutingContext,
        mut candidates: Vec<ScoredCandidate>,
    ) -> GatewayResult<ScoredCandidate> {
        for strategy in &self.strategies {
            candidates = strategy.filter(ctx, candidates);
            if candidates.is_empty() {
                return Err(GatewayError::RoutingFailed(strategy.name().to_string()));
            }
            strategy.score(ctx, &mut candidates);
        }

        // Stable sort: candidates tied on score keep their catalog order, so
        // the earlier one (by insertion order) wins ties.
        candidates.sort_by(|a, b| {
            b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal)
        });

        candidates
            .into_iter()
            .next()
            .ok_or_else(|| GatewayError::RoutingFailed("strategy_chain".to_string()))
    }
}
