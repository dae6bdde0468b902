//! Shared, dependency-light types used across the routing/dispatch crates.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Credential health-state thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureThresholds {
    /// Consecutive failures at which a credential moves `healthy -> degraded`.
    pub degrade: u32,
    /// Consecutive failures at which a credential moves `degraded -> unhealthy`.
    pub unhealthy: u32,
    /// Consecutive successes required to move a recovering credential back
    /// to `healthy`. Defaults to 1 (any single success resets it), kept as
    /// a field so a stricter recovery policy doesn't require a schema
    /// change.
    pub success: u32,
}

impl Default for FailureThresholds {
    fn default() -> Self {
        Self {
            degrade: 3,
            unhealthy: 10,
            success: 1,
        }
    }
}

/// The small set of process-wide knobs this core actually reads: the health
/// monitor's sweep interval and the credential health thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GatewayConfig {
    pub health_check_interval: Duration,
    pub failure_thresholds: FailureThresholds,
    pub account_pool_encryption_key: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            health_check_interval: Duration::from_secs(30),
            failure_thresholds: FailureThresholds::default(),
            account_pool_encryption_key: String::new(),
        }
    }
}

/// Optional overlay used while merging CLI > ENV > persisted config, the way
/// `GlobalConfigPatch` merges into `GlobalConfig` upstream.
#[derive(Debug, Clone, Default)]
pub struct GatewayConfigPatch {
    pub health_check_interval: Option<Duration>,
    pub degrade_threshold: Option<u32>,
    pub unhealthy_threshold: Option<u32>,
    pub success_threshold: Option<u32>,
    pub account_pool_encryption_key: Option<String>,
}

impl GatewayConfigPatch {
    pub fn overlay(&mut self, other: GatewayConfigPatch) {
        if other.health_check_interval.is_some() {
            self.health_check_interval = other.health_check_interval;
        }
        if other.degrade_threshold.is_some() {
            self.degrade_threshold = other.degrade_threshold;
        }
        if other.unhealthy_threshold.is_some() {
            self.unhealthy_threshold = other.unhealthy_threshold;
        }
        if other.success_threshold.is_some() {
            self.success_threshold = other.success_threshold;
        }
        if other.account_pool_encryption_key.is_some() {
            self.account_pool_encryption_key = other.account_pool_encryption_key;
        }
    }

    pub fn into_config(self) -> GatewayConfig {
        let defaults = FailureThresholds::default();
        GatewayConfig {
            health_check_interval: self
                .health_check_interval
                .unwrap_or(Duration::from_secs(30)),
            failure_thresholds: FailureThresholds {
                degrade: self.degrade_threshold.unwrap_or(defaults.degrade),
                unhealthy: self.unhealthy_threshold.unwrap_or(defaults.unhealthy),
                success: self.success_threshold.unwrap_or(defaults.success),
            },
            account_pool_encryption_key: self.account_pool_encryption_key.unwrap_or_default(),
        }
    }
}

impl From<GatewayConfig> for GatewayConfigPatch {
    fn from(value: GatewayConfig) -> Self {
        Self {
            health_check_interval: Some(value.health_check_interval),
            degrade_threshold: Some(value.failure_thresholds.degrade),
            unhealthy_threshold: Some(value.failure_thresholds.unhealthy),
            success_threshold: Some(value.failure_thresholds.success),
            account_pool_encryption_key: Some(value.account_pool_encryption_key),
        }
    }
}

/// Capability tags a model can advertise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    Chat,
    Stream,
    Vision,
    Tools,
    JsonMode,
    Embedding,
    ImageGeneration,
    VideoGeneration,
    AudioGeneration,
}

/// Task type a model group or request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Chat,
    Embedding,
    Image,
    Video,
    Audio,
}

impl TaskType {
    /// The capability every candidate for this task type must carry.
    pub fn base_capability(self) -> Capability {
        match self {
            TaskType::Chat => Capability::Chat,
            TaskType::Embedding => Capability::Embedding,
            TaskType::Image => Capability::ImageGeneration,
            TaskType::Video => Capability::VideoGeneration,
            TaskType::Audio => Capability::AudioGeneration,
        }
    }
}

/// Routing optimisation preference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Optimize {
    Cost,
    Quality,
    Latency,
    None,
}
