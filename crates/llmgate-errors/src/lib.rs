//! Canonical error taxonomy shared by every routing/dispatch crate.
//!
//! One enum, one source of truth: `GatewayError::is_transport` drives the
//! credential-health decision in the dispatch engine directly off the
//! variant definition so the two can't drift apart.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type GatewayResult<T> = Result<T, GatewayError>;

#[derive(Debug, Clone, Error, Serialize, Deserialize)]
pub enum GatewayError {
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("provider not found: {0}")]
    ProviderNotFound(String),
    #[error("model not found: {0}")]
    ModelNotFound(String),
    #[error("group not found: {0}")]
    GroupNotFound(String),

    #[error("provider disabled: {0}")]
    ProviderDisabled(String),
    #[error("model disabled: {0}")]
    ModelDisabled(String),
    #[error("group disabled: {0}")]
    GroupDisabled(String),

    #[error("model does not support required capability: {0}")]
    ModelNotSupported(String),

    #[error("no available models for this request")]
    NoAvailableModels,

    #[error("no available account for provider: {0}")]
    NoAvailableAccount(String),

    #[error("adapter not found for provider type: {0}")]
    AdapterNotFound(String),
    #[error("adapter does not support operation: {0}")]
    AdapterNotSupported(String),

    #[error("rate limit exceeded")]
    RateLimitExceeded,
    #[error("quota exceeded")]
    QuotaExceeded,
    #[error("upstream error: {0}")]
    UpstreamError(String),
    #[error("timeout")]
    Timeout,

    #[error("provider unhealthy: {0}")]
    ProviderUnhealthy(String),
    #[error("account unhealthy: {0}")]
    AccountUnhealthy(String),

    #[error("routing failed at strategy: {0}")]
    RoutingFailed(String),
    #[error("all fallbacks failed")]
    AllFallbacksFailed,

    #[error("cancelled")]
    Cancelled,
}

impl GatewayError {
    /// Kind tag stable across serialization, for transport adapters / logging.
    pub fn kind(&self) -> &'static str {
        match self {
            GatewayError::InvalidRequest(_) => "invalid-request",
            GatewayError::ProviderNotFound(_) => "provider-not-found",
            GatewayError::ModelNotFound(_) => "model-not-found",
            GatewayError::GroupNotFound(_) => "group-not-found",
            GatewayError::ProviderDisabled(_) => "provider-disabled",
            GatewayError::ModelDisabled(_) => "model-disabled",
            GatewayError::GroupDisabled(_) => "group-disabled",
            GatewayError::ModelNotSupported(_) => "model-not-supported",
            GatewayError::NoAvailableModels => "no-available-models",
            GatewayError::NoAvailableAccount(_) => "no-available-account",
            GatewayError::AdapterNotFound(_) => "adapter-not-found",
            GatewayError::AdapterNotSupported(_) => "adapter-not-supported",
            GatewayError::RateLimitExceeded => "rate-limit-exceeded",
            GatewayError::QuotaExceeded => "quota-exceeded",
            GatewayError::UpstreamError(_) => "upstream-error",
            GatewayError::Timeout => "timeout",
            GatewayError::ProviderUnhealthy(_) => "provider-unhealthy",
            GatewayError::AccountUnhealthy(_) => "account-unhealthy",
            GatewayError::RoutingFailed(_) => "routing-failed",
            GatewayError::AllFallbacksFailed => "all-fallbacks-failed",
            GatewayError::Cancelled => "cancelled",
        }
    }

    /// Transport/upstream classes drive credential consecutive-failure
    /// counting; invalid-request/quota-exceeded never touch
    /// credential health.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            GatewayError::RateLimitExceeded
                | GatewayError::UpstreamError(_)
                | GatewayError::Timeout
        )
    }
}
