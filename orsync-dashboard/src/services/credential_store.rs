//! In-process credential store

use async_trait::async_trait;
use orsync_common::StoredCredential;
use tokio::sync::RwLock;

use super::CredentialStore;

/// Holds the signed-in credential for the lifetime of the process
#[derive(Default)]
pub struct InMemoryCredentialStore {
    credential: RwLock<Option<StoredCredential>>,
}

impl InMemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-populated with a credential
    pub fn with_credential(credential: StoredCredential) -> Self {
        Self {
            credential: RwLock::new(Some(credential)),
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryCredentialStore {
    async fn stored_credential(&self) -> Option<StoredCredential> {
        self.credential.read().await.clone()
    }

    async fn store(&self, credential: StoredCredential) {
        tracing::info!(orcid_id = %credential.orcid_id, "Stored ORCID credential");
        *self.credential.write().await = Some(credential);
    }

    async fn clear(&self) {
        if self.credential.write().await.take().is_some() {
            tracing::info!("Cleared stored ORCID credential");
        }
    }
}
