//! The credential pool selector: picks a credential for a
//! provider, decrypts its key, and falls back to the provider's own
//! `api_key` when nothing is selectable. A pure function over whatever
//! candidate list the caller already fetched (`CatalogStore::find_available_credentials_by_provider`),
//! so it has no opinion on how that list was produced.

use llmgate_catalog::{Credential, CredentialId, Provider};
use llmgate_errors::{GatewayError, GatewayResult};

use crate::crypto::Crypto;

/// Output of the selector: `credential_id` is `None` when the provider's own
/// fallback key was used.
#[derive(Debug, Clone)]
pub struct SelectedCredential {
    pub credential_id: Option<CredentialId>,
    pub api_key: String,
}

/// Orders candidates by priority desc, then weight desc, then id asc
/// (stable tie-break).
fn ordered_candidates(mut candidates: Vec<Credential>) -> Vec<Credential> {
    candidates.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then_with(|| b.weight.cmp(&a.weight))
            .then_with(|| a.id.cmp(&b.id))
    });
    candidates
}

/// Runs the 3-step selection algorithm. `candidates` should already be the
/// store's "available" set (active, non-unhealthy, rate budget remaining);
/// an empty list or a store outage is the caller's cue to pass `vec![]`
/// here, which falls straight through to step 3.
pub fn select_credential(
    candidates: Vec<Credential>,
    provider: &Provider,
    crypto: &dyn Crypto,
) -> GatewayResult<SelectedCredential> {
    for candidate in ordered_candidates(candidates) {
        match crypto.decrypt(&candidate.encrypted_key) {
            Ok(api_key) => {
                return Ok(SelectedCredential {
                    credential_id: Some(candidate.id),
                    api_key,
                });
            }
            Err(err) => {
                tracing::warn!(
                    credential_id = candidate.id,
                    provider_id = provider.id,
                    error = %err,
                    "credential decryption failed, trying next candidate"
                );
            }
        }
    }

    match &provider.api_key {
        Some(key) if !key.is_empty() => Ok(SelectedCredential {
            credential_id: None,
            api_key: key.clone(),
        }),
        _ => Err(GatewayError::NoAvailableAccount(provider.name.clone())),
    }
}
