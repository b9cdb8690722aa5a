pub mod file;
pub mod memory;

use async_trait::async_trait;

#[cfg(test)]
use mockall::automock;

use crate::{
    error::StoreError,
    policy::{HostPolicy, ObjectRef},
};

pub use file::FileStore;
pub use memory::MemoryStore;

/// Object store abstraction the controller reads policies from and writes status to
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync + 'static {
    /// Fetch a policy; `StoreError::NotFound` when it no longer exists
    async fn get(&self, reference: &ObjectRef) -> Result<HostPolicy, StoreError>;

    async fn list(&self) -> Result<Vec<HostPolicy>, StoreError>;

    /// Persist only `policy.status`
    ///
    /// Fails with `StoreError::Conflict` when `policy.metadata.resource_version`
    /// no longer matches the stored object. A successful write bumps the version.
    async fn update_status(&self, policy: &HostPolicy) -> Result<(), StoreError>;

    async fn delete(&self, reference: &ObjectRef) -> Result<(), StoreError>;
}
