//! Reference `CatalogStore` implementation backed by in-process maps.
//!
//! Persistent storage is out of scope for this core; this impl exists so
//! the routing/dispatch pipeline can be driven and tested without a
//! database, standing in for whatever real storage backend a surrounding
//! service wires up.

use std::collections::HashMap;

use async_trait::async_trait;
use llmgate_errors::GatewayResult;
use tokio::sync::RwLock;

use crate::entities::{Credential, CredentialHealth, CredentialId, Model, ModelGroup, Provider, ProviderId};
use crate::store::CatalogStore;

#[derive(Default)]
struct Tables {
    providers: HashMap<ProviderId, Provider>,
    models: HashMap<String, Model>,
    credentials: HashMap<CredentialId, Credential>,
    groups: HashMap<String, ModelGroup>,
}

pub struct InMemoryCatalogStore {
    tables: RwLock<Tables>,
}

impl Default for InMemoryCatalogStore {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryCatalogStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables::default()),
        }
    }
}

#[async_trait]
impl CatalogStore for InMemoryCatalogStore {
    async fn list_providers(&self) -> GatewayResult<Vec<Provider>> {
        Ok(self.tables.read().await.providers.values().cloned().collect())
    }

    async fn get_provider(&self, id: ProviderId) -> GatewayResult<Option<Provider>> {
        Ok(self.tables.read().await.providers.get(&id).cloned())
    }

    async fn upsert_provider(&self, provider: Provider) -> GatewayResult<()> {
        self.tables.write().await.providers.insert(provider.id, provider);
        Ok(())
    }

    async fn delete_provider(&self, id: ProviderId) -> GatewayResult<()> {
        let mut tables = self.tables.write().await;
        tables.providers.remove(&id);
        tables.models.retain(|_, m| m.provider_id != id);
        tables.credentials.retain(|_, c| c.provider_id != id);
        Ok(())
    }

    async fn list_models(&self) -> GatewayResult<Vec<Model>> {
        Ok(self.tables.read().await.models.values().cloned().collect())
    }

    async fn list_models_by_provider(&self, provider_id: ProviderId) -> GatewayResult<Vec<Model>> {
        let tables = self.tables.read().await;
        Ok(tables
            .models
            .values()
            .filter(|m| m.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn get_model(&self, id: &str) -> GatewayResult<Option<Model>> {
        Ok(self.tables.read().await.models.get(id).cloned())
    }

    async fn upsert_model(&self, model: Model) -> GatewayResult<()> {
        self.tables.write().await.models.insert(model.id.clone(), model);
        Ok(())
    }

    async fn delete_model(&self, id: &str) -> GatewayResult<()> {
        self.tables.write().await.models.remove(id);
        Ok(())
    }

    async fn list_credentials_by_provider(&self, provider_id: ProviderId) -> GatewayResult<Vec<Credential>> {
        let tables = self.tables.read().await;
        Ok(tables
            .credentials
            .values()
            .filter(|c| c.provider_id == provider_id)
            .cloned()
            .collect())
    }

    async fn get_credential(&self, id: CredentialId) -> GatewayResult<Option<Credential>> {
        Ok(self.tables.read().await.credentials.get(&id).cloned())
    }

    async fn upsert_credential(&self, credential: Credential) -> GatewayResult<()> {
        self.tables.write().await.credentials.insert(credential.id, credential);
        Ok(())
    }

    async fn delete_credential(&self, id: CredentialId) -> GatewayResult<()> {
        self.tables.write().await.credentials.remove(&id);
        Ok(())
    }

    async fn find_available_credentials_by_provider(
        &self,
        provider_id: ProviderId,
    ) -> GatewayResult<Vec<Credential>> {
        let tables = self.tables.read().await;
        Ok(tables
            .credentials
            .values()
            .filter(|c| c.provider_id == provider_id && c.is_selectable())
            .cloned()
            .collect())
    }

    async fn update_credential_health(
        &self,
        id: CredentialId,
        status: CredentialHealth,
        consecutive_failures: u32,
    ) -> GatewayResult<()> {
        if let Some(cred) = self.tables.write().await.credentials.get_mut(&id) {
            cred.health = status;
            cred.consecutive_failures = consecutive_failures;
        }
        Ok(())
    }

    async fn increment_credential_usage(
        &self,
        id: CredentialId,
        requests: u64,
        tokens: u64,
        cost_usd: f64,
    ) -> GatewayResult<()> {
        if let Some(cred) = self.tables.write().await.credentials.get_mut(&id) {
            cred.total_requests += requests;
            cred.total_tokens += tokens;
            cred.total_cost_usd += cost_usd;
        }
        Ok(())
    }

    async fn list_groups(&self) -> GatewayResult<Vec<ModelGroup>> {
        Ok(self.tables.read().await.groups.values().cloned().collect())
    }

    async fn get_group(&self, id: &str) -> GatewayResult<Option<ModelGroup>> {
        Ok(self.tables.read().await.groups.get(id).cloned())
    }

    async fn upsert_group(&self, group: ModelGroup) -> GatewayResult<()> {
        self.tables.write().await.groups.insert(group.id.clone(), group);
        Ok(())
    }

    async fn delete_group(&self, id: &str) -> GatewayResult<()> {
        self.tables.write().await.groups.remove(id);
        Ok(())
    }
}
