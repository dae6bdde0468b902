//! Persisted catalog entities.
//!
//! Entities refer to one another strictly by id, never by back-pointer
//!: a `Model` carries a `provider_id`, a
//! `Credential` carries a `provider_id`, nothing carries a parent handle.

use std::collections::BTreeSet;

use llmgate_common::{Capability, TaskType};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use time::OffsetDateTime;

pub type ProviderId = i64;
pub type CredentialId = i64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderType {
    Openai,
    Anthropic,
    Google,
    Azure,
    Ollama,
    Generic,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub rpm: Option<u32>,
    pub tpm: Option<u32>,
    pub daily: Option<u32>,
}

/// A logical upstream vendor deployment.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: ProviderId,
    pub name: String,
    pub provider_type: ProviderType,
    pub base_url: String,
    /// Fallback API key used when the credential pool has nothing selectable.
    pub api_key: Option<String>,
    pub enabled: bool,
    pub weight: u32,
    pub priority: i32,
    pub rate_limit: Option<RateLimitConfig>,
    pub options: JsonValue,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Provider {
    /// Invariant: disabled provider is never a routing candidate.
    pub fn is_routable(&self) -> bool {
        self.enabled
    }
}

/// A callable identifier under one provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Model {
    pub id: String,
    pub provider_id: ProviderId,
    pub display_name: String,
    pub capabilities: BTreeSet<CapabilityTag>,
    pub context_window: u32,
    pub max_output_tokens: u32,
    pub input_cost_per_1k: f64,
    pub output_cost_per_1k: f64,
    pub enabled: bool,
    pub options: JsonValue,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

/// `Capability` ordered/hashable for storage in a `BTreeSet`. `llmgate_common::Capability`
/// is not itself `Ord`, so the catalog keeps its own thin, orderable wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityTag {
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

impl From<Capability> for CapabilityTag {
    fn from(value: Capability) -> Self {
        match value {
            Capability::Chat => CapabilityTag::Chat,
            Capability::Stream => CapabilityTag::Stream,
            Capability::Vision => CapabilityTag::Vision,
            Capability::Tools => CapabilityTag::Tools,
            Capability::JsonMode => CapabilityTag::JsonMode,
            Capability::Embedding => CapabilityTag::Embedding,
            Capability::ImageGeneration => CapabilityTag::ImageGeneration,
            Capability::VideoGeneration => CapabilityTag::VideoGeneration,
            Capability::AudioGeneration => CapabilityTag::AudioGeneration,
        }
    }
}

impl From<TaskType> for CapabilityTag {
    fn from(value: TaskType) -> Self {
        value.base_capability().into()
    }
}

impl Model {
    pub fn is_routable(&self) -> bool {
        self.enabled
    }

    pub fn covers(&self, required: &BTreeSet<CapabilityTag>) -> bool {
        required.is_subset(&self.capabilities)
    }

    pub fn cost_per_1k(&self) -> f64 {
        self.input_cost_per_1k + self.output_cost_per_1k
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialHealth {
    Healthy,
    Degraded,
    Unhealthy,
}

/// An individual API key available for a provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub provider_id: ProviderId,
    pub display_name: String,
    /// Encrypted key material; only the crypto port can turn this back into
    /// a usable key, and only for the lifetime of one routing result.
    pub encrypted_key: Vec<u8>,
    pub key_prefix: String,
    pub weight: u32,
    pub priority: i32,
    pub is_active: bool,
    pub health: CredentialHealth,
    pub consecutive_failures: u32,
    pub rate_limit: Option<RateLimitConfig>,
    pub total_requests: u64,
    pub total_tokens: u64,
    pub total_cost_usd: f64,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
}

impl Credential {
    /// Invariant: only active credentials with status in {healthy, degraded}
    /// are selectable.
    pub fn is_selectable(&self) -> bool {
        self.is_active && !matches!(self.health, CredentialHealth::Unhealthy)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StrategyKind {
    Balanced,
    Priority,
    RoundRobin,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupStrategyConfig {
    pub kind: StrategyKind,
    pub weights: JsonValue,
    pub max_cost_per_1k: Option<f64>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GroupFallbackConfig {
    pub enabled: bool,
    pub max_attempts: u32,
}

/// A named pool of candidate model ids for a task type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelGroup {
    pub id: String,
    pub display_name: String,
    pub task_type: TaskType,
    pub member_model_ids: Vec<String>,
    pub strategy: GroupStrategyConfig,
    pub fallback: GroupFallbackConfig,
    pub required_capabilities: BTreeSet<CapabilityTag>,
    pub enabled: bool,
}

impl ModelGroup {
    pub fn is_routable(&self) -> bool {
        self.enabled
    }
}

/// Usage returned by an adapter after a call.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}
