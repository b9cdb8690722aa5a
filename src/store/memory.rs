use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::ObjectStore;
use crate::{
    error::StoreError,
    policy::{HostPolicy, ObjectRef},
};

/// In-process object store keyed by policy reference
#[derive(Debug, Default)]
pub struct MemoryStore {
    objects: RwLock<BTreeMap<ObjectRef, HostPolicy>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a policy or replace the spec of an existing one
    ///
    /// The stored status is kept on replace. Returns the stored object with its new version.
    pub async fn apply(&self, mut policy: HostPolicy) -> HostPolicy {
        let mut objects = self.objects.write().await;
        let reference = policy.reference();
        match objects.get(&reference) {
            Some(existing) => {
                policy.status = existing.status.clone();
                policy.metadata.resource_version = existing.metadata.resource_version + 1;
            }
            None => {
                policy.status = Default::default();
                policy.metadata.resource_version = 1;
            }
        }
        objects.insert(reference, policy.clone());
        policy
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get(&self, reference: &ObjectRef) -> Result<HostPolicy, StoreError> {
        self.objects
            .read()
            .await
            .get(reference)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(reference.clone()))
    }

    async fn list(&self) -> Result<Vec<HostPolicy>, StoreError> {
        Ok(self.objects.read().await.values().cloned().collect())
    }

    async fn update_status(&self, policy: &HostPolicy) -> Result<(), StoreError> {
        let reference = policy.reference();
        let mut objects = self.objects.write().await;
        let stored = objects
            .get_mut(&reference)
            .ok_or_else(|| StoreError::NotFound(reference.clone()))?;

        if stored.metadata.resource_version != policy.metadata.resource_version {
            return Err(StoreError::Conflict {
                reference,
                expected: policy.metadata.resource_version,
                found: stored.metadata.resource_version,
            });
        }

        stored.status = policy.status.clone();
        stored.metadata.resource_version += 1;
        Ok(())
    }

    async fn delete(&self, reference: &ObjectRef) -> Result<(), StoreError> {
        self.objects
            .write()
            .await
            .remove(reference)
            .map(|_| ())
            .ok_or_else(|| StoreError::NotFound(reference.clone()))
    }
}
