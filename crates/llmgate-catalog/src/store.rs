//! `CatalogStore` port: CRUD and lookup for providers, models,
//! credentials, and groups, backed by whatever persistence the surrounding
//! service chooses. The routing/dispatch core only ever talks to this trait.

use async_trait::async_trait;
use llmgate_errors::GatewayResult;

use crate::entities::{Credential, CredentialHealth, CredentialId, Model, ModelGroup, Provider, ProviderId};

#[async_trait]
pub trait CatalogStore: Send + Sync {
    async fn list_providers(&self) -> GatewayResult<Vec<Provider>>;
    async fn get_provider(&self, id: ProviderId) -> GatewayResult<Option<Provider>>;
    async fn upsert_provider(&self, provider: Provider) -> GatewayResult<()>;
    /// Cascades to the provider's models and credentials.
    async fn delete_provider(&self, id: ProviderId) -> GatewayResult<()>;

    async fn list_models(&self) -> GatewayResult<Vec<Model>>;
    async fn list_models_by_provider(&self, provider_id: ProviderId) -> GatewayResult<Vec<Model>>;
    async fn get_model(&self, id: &str) -> GatewayResult<Option<Model>>;
    async fn upsert_model(&self, model: Model) -> GatewayResult<()>;
    async fn delete_model(&self, id: &str) -> GatewayResult<()>;

    async fn list_credentials_by_provider(&self, provider_id: ProviderId) -> GatewayResult<Vec<Credential>>;
    async fn get_credential(&self, id: CredentialId) -> GatewayResult<Option<Credential>>;
    async fn upsert_credential(&self, credential: Credential) -> GatewayResult<()>;
    async fn delete_credential(&self, id: CredentialId) -> GatewayResult<()>;

    /// Active, non-unhealthy credentials with rate budget remaining for a
    /// provider. Rate-budget enforcement itself belongs to
    /// the credential-level counters this port exposes, not to the core.
    async fn find_available_credentials_by_provider(
        &self,
        provider_id: ProviderId,
    ) -> GatewayResult<Vec<Credential>>;

    async fn update_credential_health(
        &self,
        id: CredentialId,
        status: CredentialHealth,
        consecutive_failures: u32,
    ) -> GatewayResult<()>;

    async fn increment_credential_usage(
        &self,
        id: CredentialId,
        requests: u64,
        tokens: u64,
        cost_usd: f64,
    ) -> GatewayResult<()>;

    async fn list_groups(&self) -> GatewayResult<Vec<ModelGroup>>;
    async fn get_group(&self, id: &str) -> GatewayResult<Option<ModelGroup>>;
    async fn upsert_group(&self, group: ModelGroup) -> GatewayResult<()>;
    async fn delete_group(&self, id: &str) -> GatewayResult<()>;
}
