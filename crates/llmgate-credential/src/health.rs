//! The 3-state credential health machine: `healthy` → `degraded`
//! → `unhealthy`, driven by a consecutive-failure counter. Generalizes a
//! binary active/unavailable credential state into a graded 3-state machine
//! so callers can distinguish "still usable but flaky" from "excluded".

use llmgate_catalog::CredentialHealth;
use llmgate_common::FailureThresholds;

/// Applies one failure: bumps the counter, then re-derives the health state
/// from the thresholds. Non-transport errors never call this.
pub fn record_failure(
    health: CredentialHealth,
    consecutive_failures: u32,
    thresholds: &FailureThresholds,
) -> (CredentialHealth, u32) {
    let failures = consecutive_failures.saturating_add(1);
    let health = if failures >= thresholds.unhealthy {
        CredentialHealth::Unhealthy
    } else if failures >= thresholds.degrade {
        CredentialHealth::Degraded
    } else {
        health
    };
    (health, failures)
}

/// Any success resets the counter and restores `healthy`.
pub fn record_success() -> (CredentialHealth, u32) {
    (CredentialHealth::Healthy, 0)
}

/// A manual or passive-probe reset, identical in effect to a success but
/// kept as a distinct entry point so callers (admin reset vs. recovery
/// queue) can be told apart in logs.
pub fn reset() -> (CredentialHealth, u32) {
    record_success()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> FailureThresholds {
        FailureThresholds::default()
    }

    #[test]
    fn degrades_at_threshold() {
        let t = thresholds();
        let mut health = CredentialHealth::Healthy;
        let mut failures = 0;
        for _ in 0..t.degrade {
            let (h, f) = record_failure(health, failures, &t);
            health = h;
            failures = f;
        }
        assert_eq!(health, CredentialHealth::Degraded);
    }

    #[test]
    fn becomes_unhealthy_at_threshold() {
        let t = thresholds();
        let mut health = CredentialHealth::Healthy;
        let mut failures = 0;
        for _ in 0..t.unhealthy {
            let (h, f) = record_failure(health, failures, &t);
            health = h;
            failures = f;
        }
        assert_eq!(health, CredentialHealth::Unhealthy);
    }

    #[test]
    fn success_resets_from_any_state() {
        assert_eq!(record_success(), (CredentialHealth::Healthy, 0));
    }

    #[test]
    fn failures_below_degrade_threshold_stay_healthy() {
        let t = thresholds();
        let (health, failures) = record_failure(CredentialHealth::Healthy, 0, &t);
        assert_eq!(health, CredentialHealth::Healthy);
        assert_eq!(failures, 1);
    }
}
