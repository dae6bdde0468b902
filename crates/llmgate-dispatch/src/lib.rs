//! The dispatch engine: routes a request, resolves a credential,
//! invokes a vendor adapter, and applies the success/failure side effects.

pub mod adapter;
pub mod engine;
pub mod ports;
pub mod types;

pub use adapter::{Adapter, AdapterRegistry, ChunkStream, DispatchContext};
pub use engine::DispatchEngine;
pub use ports::{EmbeddingCache, HealthCache, NoopEmbeddingCache, NoopHealthCache, UsageRecorder};
pub use types::{
    AdapterChatOutcome, AdapterEmbedOutcome, ChatChunk, ChatMessage, ChatRequest, ChatResponse,
    EmbedRequest, EmbedResponse, RoutingInfo,
};
