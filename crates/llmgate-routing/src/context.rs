//! Routing context builder. Constructed per request, never
//! persisted; dies with the request task that owns it.

use std::collections::{BTreeSet, HashMap};

use llmgate_catalog::{CapabilityTag, ProviderId};
use llmgate_common::{Optimize, TaskType};

/// The normalised request the HTTP/protocol adapter hands to the core. Its
/// shape mirrors the fields the context builder reads; the wire format
/// itself is that adapter's concern, not this crate's.
#[derive(Debug, Clone, Default)]
pub struct NormalizedRequest {
    pub task_type: Option<TaskType>,
    /// `request.model`; `Some("auto")` and `None` are both "no hint".
    pub model_hint: Option<String>,
    pub stream: bool,
    pub tools_non_empty: bool,
    pub has_vision_content: bool,
    pub json_mode_requested: bool,
    pub group_id: Option<String>,
    pub estimated_input_tokens: u32,
    pub min_context_window: u32,
    pub max_cost_per_1k: Option<f64>,
    pub optimize: Optimize,
    pub excluded_provider_ids: Vec<ProviderId>,
}

impl NormalizedRequest {
    pub fn chat(model_hint: impl Into<Option<String>>) -> Self {
        Self {
            task_type: Some(TaskType::Chat),
            model_hint: model_hint.into(),
            optimize: Optimize::None,
            ..Default::default()
        }
    }

    pub fn embedding(model_hint: impl Into<Option<String>>) -> Self {
        Self {
            task_type: Some(TaskType::Embedding),
            model_hint: model_hint.into(),
            optimize: Optimize::None,
            ..Default::default()
        }
    }
}

/// The derived constraint profile of a single request.
#[derive(Debug, Clone)]
pub struct RoutingContext {
    pub task_type: TaskType,
    pub required_capabilities: BTreeSet<CapabilityTag>,
    pub require_stream: bool,
    pub require_tools: bool,
    pub require_vision: bool,
    pub require_json: bool,
    pub estimated_input_tokens: u32,
    pub min_context_window: u32,
    pub max_cost_per_1k: Option<f64>,
    pub optimize: Optimize,
    /// Ordered; index 0 is the highest-priority preference.
    pub preferred_model_ids: Vec<String>,
    pub excluded_provider_ids: Vec<ProviderId>,
    pub group_id: Option<String>,
    /// Injected by the candidate builder; unknown
    /// providers are treated as healthy until this map says otherwise.
    pub provider_health: HashMap<ProviderId, bool>,
}

impl RoutingContext {
    /// `required_capabilities` plus the tags implied by the `require_*`
    /// flags. Kept as a derived method rather than folded into
    /// `required_capabilities` at build time so that field stays exactly
    /// the task's base capability set, with the request-level extras
    /// layered on only where a strategy actually needs them.
    pub fn effective_required_capabilities(&self) -> BTreeSet<CapabilityTag> {
        let mut caps = self.required_capabilities.clone();
        if self.require_stream {
            caps.insert(CapabilityTag::Stream);
        }
        if self.require_tools {
            caps.insert(CapabilityTag::Tools);
        }
        if self.require_vision {
            caps.insert(CapabilityTag::Vision);
        }
        if self.require_json {
            caps.insert(CapabilityTag::JsonMode);
        }
        caps
    }
}

/// Builds a fresh routing context from a normalised request.
pub fn build_routing_context(request: &NormalizedRequest) -> RoutingContext {
    let task_type = request.task_type.unwrap_or(TaskType::Chat);

    let mut required_capabilities = BTreeSet::new();
    required_capabilities.insert(task_type.into());

    let mut preferred_model_ids = Vec::new();
    if let Some(model) = &request.model_hint {
        if !model.is_empty() && model != "auto" {
            preferred_model_ids.push(model.clone());
        }
    }

    RoutingContext {
        task_type,
        required_capabilities,
        require_stream: request.stream,
        require_tools: request.tools_non_empty,
        require_vision: request.has_vision_content,
        require_json: request.json_mode_requested,
        estimated_input_tokens: request.estimated_input_tokens,
        min_context_window: request.min_context_window,
        max_cost_per_1k: request.max_cost_per_1k,
        optimize: request.optimize,
        preferred_model_ids,
        excluded_provider_ids: request.excluded_provider_ids.clone(),
        group_id: request.group_id.clone(),
        provider_health: HashMap::new(),
    }
}
