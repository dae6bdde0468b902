//! The `Strategy` trait: a named, priority-ordered filter+score step.
//! Adding a strategy means adding a name and a priority; the chain driver
//! in `chain.rs` never needs to know about individual variants, the same
//! way a registry keyed by name lets callers add entries without the
//! dispatch path switching on them.

use crate::candidate::ScoredCandidate;
use crate::context::RoutingContext;

pub trait Strategy: Send + Sync {
    fn name(&self) -> &'static str;

    /// Strategies execute in descending priority order.
    fn priority(&self) -> i32;

    /// May drop candidates. Implementations that have a "graceful
    /// degradation" rule apply it here: compute the
    /// filtered set, and if it would be empty, return the original set
    /// instead of an empty one.
    fn filter(&self, _ctx: &RoutingContext, candidates: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        candidates
    }

    /// May add to each candidate's running score. Never drops candidates.
    fn score(&self, _ctx: &RoutingContext, _candidates: &mut [ScoredCandidate]) {}
}
