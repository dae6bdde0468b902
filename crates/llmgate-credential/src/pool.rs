//! `CredentialPool`: the in-process mirror of credential health, fed by
//! dispatch outcomes and read by the `health_filter` strategy and the
//! selector. Generalizes a binary active/unavailable cache into the
//! 3-state health machine, and wires it to the passive `RecoveryQueue`
//! instead of a fixed-duration unavailability window.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use llmgate_catalog::{CredentialHealth, CredentialId};
use llmgate_common::FailureThresholds;
use tokio::sync::RwLock;
use tokio::time::Instant;

use crate::events::{CredentialEvent, EventHub};
use crate::health;
use crate::recovery::RecoveryQueue;

/// Delay before an `unhealthy` credential gets one passive retry chance.
/// Not part of `FailureThresholds` because it governs timing, not counts.
pub const DEFAULT_RECOVERY_PROBE_DELAY: Duration = Duration::from_secs(60);

pub struct CredentialPool {
    states: Arc<RwLock<HashMap<CredentialId, (CredentialHealth, u32)>>>,
    thresholds: FailureThresholds,
    events: EventHub,
    queue: Arc<RecoveryQueue>,
    recovery_probe_delay: Duration,
}

impl CredentialPool {
    pub fn new(events: EventHub, thresholds: FailureThresholds) -> Self {
        Self::with_recovery_delay(events, thresholds, DEFAULT_RECOVERY_PROBE_DELAY)
    }

    pub fn with_recovery_delay(
        events: EventHub,
        thresholds: FailureThresholds,
        recovery_probe_delay: Duration,
    ) -> Self {
        let states = Arc::new(RwLock::new(HashMap::new()));
        let queue = RecoveryQueue::new();
        queue.clone().spawn_recover_task(states.clone(), events.clone());
        Self {
            states,
            thresholds,
            events,
            queue,
            recovery_probe_delay,
        }
    }

    pub fn events(&self) -> &EventHub {
        &self.events
    }

    /// Seeds (or re-syncs) this credential's in-memory state from the
    /// catalog store, e.g. on load or after an admin reset elsewhere.
    pub async fn track(&self, id: CredentialId, health: CredentialHealth, consecutive_failures: u32) {
        self.states.write().await.insert(id, (health, consecutive_failures));
    }

    pub async fn health_of(&self, id: CredentialId) -> Option<(CredentialHealth, u32)> {
        self.states.read().await.get(&id).copied()
    }

    /// Optimistic default: an untracked credential is treated as healthy
    /// rather than excluding it from selection.
    pub async fn is_selectable(&self, id: CredentialId) -> bool {
        !matches!(self.health_of(id).await, Some((CredentialHealth::Unhealthy, _)))
    }

    /// Applies a transport-class failure and schedules a
    /// passive recovery probe if the credential just became unhealthy.
    pub async fn record_failure(&self, id: CredentialId) -> CredentialHealth {
        let (prev_health, prev_failures) = self.health_of(id).await.unwrap_or((CredentialHealth::Healthy, 0));
        let (new_health, new_failures) = health::record_failure(prev_health, prev_failures, &self.thresholds);
        self.states.write().await.insert(id, (new_health, new_failures));

        if new_health != prev_health {
            self.events
                .emit(CredentialEvent::HealthChanged {
                    at: SystemTime::now(),
                    credential_id: id,
                    from: prev_health,
                    to: new_health,
                    consecutive_failures: new_failures,
                })
                .await;
        }

        if new_health == CredentialHealth::Unhealthy && prev_health != CredentialHealth::Unhealthy {
            self.queue
                .schedule(id, Instant::now() + self.recovery_probe_delay)
                .await;
        }

        new_health
    }

    /// Any success resets the counter and restores `healthy`.
    pub async fn record_success(&self, id: CredentialId) -> CredentialHealth {
        let prev = self.health_of(id).await.map(|(h, _)| h);
        let (new_health, new_failures) = health::record_success();
        self.states.write().await.insert(id, (new_health, new_failures));

        if prev != Some(new_health) {
            self.events
                .emit(CredentialEvent::HealthChanged {
                    at: SystemTime::now(),
                    credential_id: id,
                    from: prev.unwrap_or(CredentialHealth::Healthy),
                    to: new_health,
                    consecutive_failures: new_failures,
                })
                .await;
        }

        new_health
    }

    /// Manual reset, e.g. an admin operation.
    pub async fn reset(&self, id: CredentialId) {
        self.record_success(id).await;
    }
}
