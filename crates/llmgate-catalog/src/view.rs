//! The in-process live view of the catalog.
//!
//! Rebuilt, not mutated in place, on every change: readers `load()` an
//! `Arc<CatalogSnapshot>` once and hold it for the life of a request,
//! the same swap-the-whole-snapshot pattern as an `ArcSwap<T>`-backed
//! app state.

use std::sync::Arc;

use arc_swap::ArcSwap;
use llmgate_errors::GatewayResult;

use crate::entities::{Credential, CredentialId, Model, ModelGroup, Provider, ProviderId};
use crate::store::CatalogStore;

#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub providers: Vec<Provider>,
    pub models: Vec<Model>,
    pub credentials: Vec<Credential>,
    pub groups: Vec<ModelGroup>,
}

impl CatalogSnapshot {
    pub fn provider(&self, id: ProviderId) -> Option<&Provider> {
        self.providers.iter().find(|p| p.id == id)
    }

    pub fn model(&self, id: &str) -> Option<&Model> {
        self.models.iter().find(|m| m.id == id)
    }

    pub fn group(&self, id: &str) -> Option<&ModelGroup> {
        self.groups.iter().find(|g| g.id == id)
    }

    pub fn credentials_for_provider(&self, provider_id: ProviderId) -> impl Iterator<Item = &Credential> {
        self.credentials.iter().filter(move |c| c.provider_id == provider_id)
    }

    pub fn enabled_models(&self) -> impl Iterator<Item = &Model> {
        self.models.iter().filter(|m| m.is_routable())
    }
}

pub struct CatalogView {
    snapshot: ArcSwap<CatalogSnapshot>,
}

impl CatalogView {
    pub fn new(snapshot: CatalogSnapshot) -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(snapshot),
        }
    }

    pub async fn load_from_store(store: &dyn CatalogStore) -> GatewayResult<Self> {
        let providers = store.list_providers().await?;
        let models = store.list_models().await?;
        let groups = store.list_groups().await?;

        // Flat list keyed by provider_id rather than nested under each
        // provider, so lookups don't need to walk the provider tree.
        let mut credentials = Vec::new();
        for provider in &providers {
            credentials.extend(store.list_credentials_by_provider(provider.id).await?);
        }

        Ok(Self::new(CatalogSnapshot {
            providers,
            models,
            credentials,
            groups,
        }))
    }

    pub fn load(&self) -> Arc<CatalogSnapshot> {
        self.snapshot.load_full()
    }

    pub fn apply_provider_upsert(&self, provider: Provider) {
        let mut snap = self.snapshot.load().as_ref().clone();
        match snap.providers.iter_mut().find(|p| p.id == provider.id) {
            Some(slot) => *slot = provider,
            None => snap.providers.push(provider),
        }
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_provider_delete(&self, id: ProviderId) {
        let mut snap = self.snapshot.load().as_ref().clone();
        snap.providers.retain(|p| p.id != id);
        snap.models.retain(|m| m.provider_id != id);
        snap.credentials.retain(|c| c.provider_id != id);
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_model_upsert(&self, model: Model) {
        let mut snap = self.snapshot.load().as_ref().clone();
        match snap.models.iter_mut().find(|m| m.id == model.id) {
            Some(slot) => *slot = model,
            None => snap.models.push(model),
        }
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_model_delete(&self, id: &str) {
        let mut snap = self.snapshot.load().as_ref().clone();
        snap.models.retain(|m| m.id != id);
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_credential_upsert(&self, credential: Credential) {
        let mut snap = self.snapshot.load().as_ref().clone();
        match snap.credentials.iter_mut().find(|c| c.id == credential.id) {
            Some(slot) => *slot = credential,
            None => snap.credentials.push(credential),
        }
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_credential_delete(&self, id: CredentialId) {
        let mut snap = self.snapshot.load().as_ref().clone();
        snap.credentials.retain(|c| c.id != id);
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_credential_enabled(&self, id: CredentialId, enabled: bool) {
        let mut snap = self.snapshot.load().as_ref().clone();
        if let Some(cred) = snap.credentials.iter_mut().find(|c| c.id == id) {
            cred.is_active = enabled;
        }
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_group_upsert(&self, group: ModelGroup) {
        let mut snap = self.snapshot.load().as_ref().clone();
        match snap.groups.iter_mut().find(|g| g.id == group.id) {
            Some(slot) => *slot = group,
            None => snap.groups.push(group),
        }
        self.snapshot.store(Arc::new(snap));
    }

    pub fn apply_group_delete(&self, id: &str) {
        let mut snap = self.snapshot.load().as_ref().clone();
        snap.groups.retain(|g| g.id != id);
        self.snapshot.store(Arc::new(snap));
    }
}

#[cfg(test)]
mod tests {
    use time::OffsetDateTime;

    use super::*;
    use crate::entities::ProviderType;

    fn provider(id: ProviderId, enabled: bool) -> Provider {
        Provider {
            id,
            name: format!("p{id}"),
            provider_type: ProviderType::Openai,
            base_url: "https://api.example.com".into(),
            api_key: None,
            enabled,
            weight: 1,
            priority: 0,
            rate_limit: None,
            options: serde_json::json!({}),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn view_is_rebuilt_not_mutated_in_place() {
        let view = CatalogView::new(CatalogSnapshot::default());
        let before = view.load();
        view.apply_provider_upsert(provider(1, true));
        let after = view.load();

        assert_eq!(before.providers.len(), 0);
        assert_eq!(after.providers.len(), 1);
        assert!(!Arc::ptr_eq(&before, &after));
    }

    #[test]
    fn provider_delete_cascades_in_snapshot() {
        let view = CatalogView::new(CatalogSnapshot::default());
        view.apply_provider_upsert(provider(1, true));
        view.apply_provider_delete(1);
        assert!(view.load().provider(1).is_none());
    }
}
