//! Cost calculator. Pure, no IO, no locking: safe to call from anywhere,
//! including under a lock held by the caller.

use llmgate_catalog::Usage;

/// `cost = (prompt_tokens / 1000) * input_cost_per_1k + (completion_tokens / 1000) * output_cost_per_1k`.
///
/// Embedding calls report `completion_tokens = 0`, which zeroes the output
/// term automatically; no special-casing needed.
pub fn calculate_cost(usage: Option<Usage>, input_cost_per_1k: f64, output_cost_per_1k: f64) -> f64 {
    let Some(usage) = usage else {
        return 0.0;
    };
    (usage.prompt_tokens as f64 / 1000.0) * input_cost_per_1k
        + (usage.completion_tokens as f64 / 1000.0) * output_cost_per_1k
}
