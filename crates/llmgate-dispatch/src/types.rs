//! Request/response contracts at the core boundary. Shapes mirror the
//! OpenAI-compatible chat/embeddings surface; exact wire JSON is the HTTP
//! adapter's concern, not this crate's.

use llmgate_catalog::{ProviderId, Usage};
use llmgate_common::Optimize;
use serde_json::Value as JsonValue;

#[derive(Debug, Clone)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
    pub has_image: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ChatRequest {
    pub messages: Vec<ChatMessage>,
    pub tools: Vec<JsonValue>,
    pub tool_choice: Option<JsonValue>,
    pub temperature: Option<f64>,
    pub top_p: Option<f64>,
    pub max_tokens: Option<u32>,
    pub stop: Vec<String>,
    pub stream: bool,
    pub json_mode: bool,
    pub metadata: JsonValue,

    /// `request.model`; `Some("auto")` and absent both mean "no hint".
    pub model: Option<String>,
    pub group_id: Option<String>,
    pub optimize: Optimize,
    pub excluded_provider_ids: Vec<ProviderId>,
    pub min_context_window: u32,
    pub max_cost_per_1k: Option<f64>,
}

impl ChatRequest {
    pub fn has_vision_content(&self) -> bool {
        self.messages.iter().any(|m| m.has_image)
    }

    pub fn tools_non_empty(&self) -> bool {
        !self.tools.is_empty()
    }

    /// Rough chars/4 heuristic; good enough for the context-window filter,
    /// which only needs an order-of-magnitude budget.
    pub fn estimated_input_tokens(&self) -> u32 {
        let chars: usize = self.messages.iter().map(|m| m.content.len()).sum();
        (chars / 4) as u32
    }
}

#[derive(Debug, Clone)]
pub struct RoutingInfo {
    pub provider: String,
    pub model: String,
    pub latency_ms: u64,
    pub cost_usd: f64,
    pub credential_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct ChatResponse {
    pub id: String,
    pub model: String,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
    pub routing_info: RoutingInfo,
}

/// One chunk of a streaming chat response.
/// `usage` is only ever populated on the final chunk, mirroring the
/// OpenAI-style convention of attaching usage to the terminal event.
#[derive(Debug, Clone)]
pub struct ChatChunk {
    pub delta: String,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Default)]
pub struct EmbedRequest {
    pub input: Vec<String>,
    pub model: Option<String>,
    pub excluded_provider_ids: Vec<ProviderId>,
}

impl EmbedRequest {
    pub fn estimated_input_tokens(&self) -> u32 {
        let chars: usize = self.input.iter().map(|s| s.len()).sum();
        (chars / 4) as u32
    }
}

#[derive(Debug, Clone)]
pub struct EmbedResponse {
    pub embeddings: Vec<Vec<f32>>,
    pub usage: Option<Usage>,
    pub routing_info: RoutingInfo,
}

/// What an adapter hands back from a non-streaming chat call, before the
/// engine attaches cost/routing info.
#[derive(Debug, Clone)]
pub struct AdapterChatOutcome {
    pub id: String,
    pub message: ChatMessage,
    pub finish_reason: Option<String>,
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone)]
pub struct AdapterEmbedOutcome {
    pub embeddings: Vec<Vec<f32>>,
    pub usage: Option<Usage>,
}
