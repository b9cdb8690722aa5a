pub mod dispatcher;
pub mod reconcile;
pub mod sync;
pub mod watcher;

use std::{sync::Arc, time::Duration};

use tokio::sync::mpsc;

use crate::store::ObjectStore;

pub use dispatcher::{Dispatcher, DispatcherSettings};
pub use reconcile::{ReconcileOutcome, Reconciler, ReconcilerSettings};
pub use sync::ShutdownSignal;
pub use watcher::PolicyWatcher;

pub const DEFAULT_WORKERS: usize = 4;
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(2);
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(5);

/// Runtime settings for the long-running controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerSettings {
    pub workers: usize,
    pub poll_interval: Duration,
    pub retry_backoff: Duration,
    pub delete_invalid: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            poll_interval: DEFAULT_POLL_INTERVAL,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
            delete_invalid: false,
        }
    }
}

/// Watch `store` and reconcile every created or changed policy until shutdown
pub async fn run<S: ObjectStore>(
    store: Arc<S>,
    settings: &ControllerSettings,
    shutdown: Arc<ShutdownSignal>,
) {
    let (tx, rx) = mpsc::channel(settings.workers.max(1) * 16);

    let watcher = PolicyWatcher::new(Arc::clone(&store), settings.poll_interval);
    let watcher = tokio::spawn(watcher.run(tx, Arc::clone(&shutdown)));

    let reconciler = Reconciler::new(
        store,
        ReconcilerSettings {
            delete_invalid: settings.delete_invalid,
        },
    );
    let dispatcher = Dispatcher::new(
        Arc::new(reconciler),
        DispatcherSettings {
            workers: settings.workers,
            retry_backoff: settings.retry_backoff,
        },
    );

    log::info!(
        "Controller started: {} workers, polling every {:?}",
        settings.workers,
        settings.poll_interval
    );
    dispatcher.run(rx, shutdown).await;

    if let Err(err) = watcher.await {
        log::error!("Policy watcher failed: {err}");
    }
    log::info!("Controller stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        policy::{Action, HostPolicy, ObjectRef, Verdict},
        store::MemoryStore,
    };

    #[tokio::test]
    async fn test_run_reconciles_existing_and_new_policies() {
        let store = Arc::new(MemoryStore::new());
        store
            .apply(HostPolicy::new(ObjectRef::new("first"), Action::Allow))
            .await;

        let settings = ControllerSettings {
            poll_interval: Duration::from_millis(5),
            retry_backoff: Duration::from_millis(5),
            ..Default::default()
        };
        let shutdown = ShutdownSignal::new();
        let handle = tokio::spawn({
            let store = Arc::clone(&store);
            let shutdown = Arc::clone(&shutdown);
            async move { run(store, &settings, shutdown).await }
        });

        let mut second = HostPolicy::new(ObjectRef::new("second"), Action::Audit);
        second.spec.network.match_protocols.push(
            crate::policy::net::MatchProtocol {
                protocol: "raw".to_string(),
                from_source: vec![crate::policy::SourceRef::path("/usr/bin/ping")],
            },
        );
        store.apply(second).await;

        let mut statuses = (None, None);
        for _ in 0..200 {
            statuses = (
                store.get(&ObjectRef::new("first")).await.unwrap().status.policy_status,
                store.get(&ObjectRef::new("second")).await.unwrap().status.policy_status,
            );
            if statuses.0.is_some() && statuses.1.is_some() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }

        shutdown.shutdown();
        handle.await.unwrap();
        assert_eq!(statuses, (Some(Verdict::Ok), Some(Verdict::NotOk)));
    }
}
