use std::{
    collections::{HashMap, HashSet, VecDeque},
    sync::Arc,
    time::Duration,
};

use tokio::{
    sync::mpsc,
    task::{self, JoinError, JoinSet},
};

use super::{
    reconcile::{ReconcileOutcome, Reconciler},
    sync::ShutdownSignal,
};
use crate::{error::HostPolicyError, policy::ObjectRef, store::ObjectStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatcherSettings {
    /// Maximum number of concurrent reconciliations
    pub workers: usize,
    /// Delay before a failed reconciliation is retried
    pub retry_backoff: Duration,
}

type Reconciled = Result<ReconcileOutcome, HostPolicyError>;

/// Work bookkeeping: at most one running reconciliation per reference
#[derive(Default)]
struct WorkQueue {
    pending: VecDeque<ObjectRef>,
    queued: HashSet<ObjectRef>,
    running: HashSet<ObjectRef>,
    dirty: HashSet<ObjectRef>,
    /// Reference of every spawned reconcile task, keyed by task id
    tasks: HashMap<task::Id, ObjectRef>,
}

impl WorkQueue {
    fn enqueue(&mut self, reference: ObjectRef) {
        if self.running.contains(&reference) {
            self.dirty.insert(reference);
        } else if self.queued.insert(reference.clone()) {
            self.pending.push_back(reference);
        }
    }

    fn start_next(&mut self) -> Option<ObjectRef> {
        let reference = self.pending.pop_front()?;
        self.queued.remove(&reference);
        self.running.insert(reference.clone());
        Some(reference)
    }

    fn track(&mut self, id: task::Id, reference: ObjectRef) {
        self.tasks.insert(id, reference);
    }

    /// Release the reference owned by task `id`, whether it returned or panicked
    fn finish_task(&mut self, id: task::Id) -> Option<ObjectRef> {
        let reference = self.tasks.remove(&id)?;
        self.finish(&reference);
        Some(reference)
    }

    fn finish(&mut self, reference: &ObjectRef) {
        self.running.remove(reference);
        if self.dirty.remove(reference) {
            self.enqueue(reference.clone());
        }
    }

    fn is_idle(&self) -> bool {
        self.pending.is_empty() && self.running.is_empty()
    }
}

/// Runs reconciliations for references received from a notification source
///
/// Distinct references reconcile concurrently up to `workers`; a reference
/// notified while its reconciliation is running is reconciled once more
/// afterwards. Failed reconciliations are retried after `retry_backoff`.
pub struct Dispatcher<S> {
    reconciler: Arc<Reconciler<S>>,
    settings: DispatcherSettings,
}

impl<S: ObjectStore> Dispatcher<S> {
    pub fn new(reconciler: Arc<Reconciler<S>>, settings: DispatcherSettings) -> Self {
        Self {
            reconciler,
            settings,
        }
    }

    /// Dispatch until shutdown, or until `rx` is closed and queued work has drained
    ///
    /// In-flight reconciliations are awaited before returning. Retries still
    /// waiting for their backoff are dropped.
    pub async fn run(self, mut rx: mpsc::Receiver<ObjectRef>, shutdown: Arc<ShutdownSignal>) {
        let workers = self.settings.workers.max(1);
        let mut work = WorkQueue::default();
        let mut tasks: JoinSet<Reconciled> = JoinSet::new();
        let mut retries: JoinSet<ObjectRef> = JoinSet::new();
        let mut input_open = true;

        loop {
            while tasks.len() < workers {
                let Some(reference) = work.start_next() else {
                    break;
                };
                self.spawn(&mut tasks, &mut work, reference);
            }

            if !input_open && work.is_idle() {
                if !retries.is_empty() {
                    log::warn!("Dropping {} pending retries", retries.len());
                }
                break;
            }

            tokio::select! {
                _ = shutdown.wait() => break,
                received = rx.recv(), if input_open => match received {
                    Some(reference) => work.enqueue(reference),
                    None => input_open = false,
                },
                Some(joined) = tasks.join_next_with_id(), if !tasks.is_empty() => {
                    self.complete(&mut work, &mut retries, joined);
                }
                Some(retry) = retries.join_next(), if !retries.is_empty() => {
                    if let Ok(reference) = retry {
                        work.enqueue(reference);
                    }
                }
            }
        }

        while let Some(joined) = tasks.join_next_with_id().await {
            self.complete(&mut work, &mut retries, joined);
        }
        retries.abort_all();
    }

    fn spawn(
        &self,
        tasks: &mut JoinSet<Reconciled>,
        work: &mut WorkQueue,
        reference: ObjectRef,
    ) {
        let reconciler = Arc::clone(&self.reconciler);
        let target = reference.clone();
        let handle = tasks.spawn(async move { reconciler.reconcile(&target).await });
        work.track(handle.id(), reference);
    }

    fn complete(
        &self,
        work: &mut WorkQueue,
        retries: &mut JoinSet<ObjectRef>,
        joined: Result<(task::Id, Reconciled), JoinError>,
    ) {
        let (id, result) = match joined {
            Ok((id, result)) => (id, Ok(result)),
            Err(err) => (err.id(), Err(err)),
        };
        let Some(reference) = work.finish_task(id) else {
            log::error!("Reconcile task {id} finished without a tracked reference");
            return;
        };

        let err = match result {
            Ok(Ok(outcome)) => {
                log::debug!("Reconciled host policy {reference}: {outcome:?}");
                return;
            }
            Ok(Err(err)) => err.to_string(),
            Err(err) => format!("reconcile task failed: {err}"),
        };

        let backoff = self.settings.retry_backoff;
        log::error!("Failed to reconcile host policy {reference}, retrying in {backoff:?}: {err}");
        retries.spawn(async move {
            tokio::time::sleep(backoff).await;
            reference
        });
    }
}
