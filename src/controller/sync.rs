use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use tokio::sync::Notify;

/// Shutdown flag shared by the watcher, the dispatcher and the signal handler
///
/// `Notify::notify_waiters()` only wakes tasks already waiting, so every wait
/// registers interest first and then checks the flag.
///
/// # Usage
/// ```
/// use std::time::Duration;
/// use hostpolicy::controller::ShutdownSignal;
///
/// # async fn example() {
/// let signal = ShutdownSignal::new();
///
/// // In a polling task:
/// if signal.wait_timeout_or_shutdown(Duration::from_secs(2)).await {
///     // shutdown requested
/// }
///
/// // From the signal handler:
/// signal.shutdown();
/// # }
/// ```
#[derive(Debug)]
pub struct ShutdownSignal {
    notify: Notify,
    shutdown: AtomicBool,
}

impl ShutdownSignal {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            notify: Notify::new(),
            shutdown: AtomicBool::new(false),
        })
    }

    pub fn is_shutdown(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    /// Wait until shutdown is signaled
    pub async fn wait(&self) {
        let notified = self.notify.notified();
        tokio::pin!(notified);
        notified.as_mut().enable();

        if self.is_shutdown() {
            return;
        }
        notified.await;
    }

    /// Wait for timeout or shutdown signal, whichever comes first
    ///
    /// Returns `true` if shutdown was signaled, `false` if the timeout elapsed
    pub async fn wait_timeout_or_shutdown(&self, timeout: Duration) -> bool {
        tokio::select! {
            _ = self.wait() => true,
            _ = tokio::time::sleep(timeout) => self.is_shutdown(),
        }
    }

    /// Set the flag and wake all waiting tasks
    pub fn shutdown(&self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.notify.notify_waiters();
    }
}
