use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::mpsc;

use super::sync::ShutdownSignal;
use crate::{
    error::StoreError,
    policy::{HostPolicySpec, ObjectRef},
    store::ObjectStore,
};

/// Polling notification source
///
/// Emits a reference when a policy appears or its spec changes. Status and
/// version changes alone are ignored, so the controller's own status writes
/// do not trigger another reconciliation.
pub struct PolicyWatcher<S> {
    store: Arc<S>,
    poll_interval: Duration,
    seen: HashMap<ObjectRef, HostPolicySpec>,
}

impl<S: ObjectStore> PolicyWatcher<S> {
    pub fn new(store: Arc<S>, poll_interval: Duration) -> Self {
        Self {
            store,
            poll_interval,
            seen: HashMap::new(),
        }
    }

    /// List the store once and return the references that changed since the last poll
    ///
    /// Policies that disappeared are forgotten without notification.
    pub async fn poll(&mut self) -> Result<Vec<ObjectRef>, StoreError> {
        let policies = self.store.list().await?;

        let mut current = HashMap::with_capacity(policies.len());
        let mut changed = Vec::new();
        for policy in policies {
            let reference = policy.reference();
            if self.seen.get(&reference) != Some(&policy.spec) {
                changed.push(reference.clone());
            }
            current.insert(reference, policy.spec);
        }

        self.seen = current;
        Ok(changed)
    }

    /// Poll until shutdown is signaled or the receiving side is dropped
    pub async fn run(mut self, tx: mpsc::Sender<ObjectRef>, shutdown: Arc<ShutdownSignal>) {
        loop {
            match self.poll().await {
                Ok(changed) => {
                    for reference in changed {
                        log::debug!("Host policy {reference} changed");
                        if tx.send(reference).await.is_err() {
                            return;
                        }
                    }
                }
                Err(err) => log::error!("Failed to list host policies: {err}"),
            }

            if shutdown.wait_timeout_or_shutdown(self.poll_interval).await {
                return;
            }
        }
    }
}
