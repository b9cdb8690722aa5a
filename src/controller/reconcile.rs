use std::sync::Arc;

use crate::{
    error::HostPolicyError,
    policy::{ObjectRef, PolicyViolation, Verdict, validate},
    store::ObjectStore,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReconcilerSettings {
    /// Delete policies that fail validation after recording `Not OK`.
    /// Off by default: invalid policies stay in the store, flagged.
    pub delete_invalid: bool,
}

/// Result of one successful reconciliation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The policy no longer exists; nothing was written
    Missing,
    /// Validation passed; `OK` was written on a best-effort basis
    Valid,
    /// Validation failed and `Not OK` was recorded
    Invalid(PolicyViolation),
    /// Validation failed, `Not OK` was recorded and the policy was deleted
    Deleted(PolicyViolation),
}

/// Turns one "policy changed" notification into one terminal status
pub struct Reconciler<S> {
    store: Arc<S>,
    settings: ReconcilerSettings,
}

impl<S: ObjectStore> Reconciler<S> {
    pub fn new(store: Arc<S>, settings: ReconcilerSettings) -> Self {
        Self { store, settings }
    }

    /// Fetch, validate and write back the status of a single policy
    ///
    /// # Behavior
    /// 1. A policy that no longer exists resolves to `Ok(ReconcileOutcome::Missing)`
    ///    without any write. Other fetch failures are returned.
    /// 2. Sections are validated in order process, file, network, capabilities;
    ///    the first violation wins.
    /// 3. On a violation `Not OK` is written and a failed write is returned as the error.
    /// 4. Otherwise `OK` is written and a failed write is only logged.
    ///
    /// Holds no state between calls; the same policy content always yields the same status.
    pub async fn reconcile(
        &self,
        reference: &ObjectRef,
    ) -> Result<ReconcileOutcome, HostPolicyError> {
        let mut policy = match self.store.get(reference).await {
            Ok(policy) => policy,
            Err(err) if err.is_not_found() => {
                log::debug!("Host policy {reference} not found, skipping");
                return Ok(ReconcileOutcome::Missing);
            }
            Err(err) => return Err(err.into()),
        };

        if let Err(violation) = validate(&policy, reference) {
            policy.status.policy_status = Some(Verdict::NotOk);
            self.store.update_status(&policy).await?;
            log::info!("Invalid host policy {reference}: {violation}");

            if self.settings.delete_invalid {
                self.store.delete(reference).await?;
                log::info!("Deleted invalid host policy {reference}");
                return Ok(ReconcileOutcome::Deleted(violation));
            }
            return Ok(ReconcileOutcome::Invalid(violation));
        }

        policy.status.policy_status = Some(Verdict::Ok);
        if let Err(err) = self.store.update_status(&policy).await {
            log::warn!("Failed to record OK status for host policy {reference}: {err}");
        }
        log::info!("Validated host policy {reference}");
        Ok(ReconcileOutcome::Valid)
    }
}
