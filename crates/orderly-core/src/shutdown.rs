//! Shutdown-hook registry.
//!
//! A single [`ShutdownCoordinator`] is created by the process wiring and
//! handed to every component that owns a background task. Long-running
//! loops [`subscribe`](ShutdownCoordinator::subscribe) to be told when to
//! stop; resources that need an orderly close
//! [`register`](ShutdownCoordinator::register) an async hook.

use futures::future::BoxFuture;
use parking_lot::Mutex;
use std::future::Future;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{info, warn};

type Hook = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

/// Coordinates graceful shutdown across components.
pub struct ShutdownCoordinator {
    notify: broadcast::Sender<()>,
    hooks: Mutex<Vec<(String, Hook)>>,
    hook_timeout: Duration,
}

impl ShutdownCoordinator {
    /// Creates a coordinator that bounds each hook by `hook_timeout`.
    #[must_use]
    pub fn new(hook_timeout: Duration) -> Self {
        let (notify, _) = broadcast::channel(1);
        Self {
            notify,
            hooks: Mutex::new(Vec::new()),
            hook_timeout,
        }
    }

    /// Returns a receiver that resolves once shutdown begins.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<()> {
        self.notify.subscribe()
    }

    /// Registers a close hook. Hooks run in reverse registration order.
    pub fn register<F, Fut>(&self, name: impl Into<String>, hook: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        tracing::debug!(hook = %name, "Registered shutdown hook");
        self.hooks
            .lock()
            .push((name, Box::new(move || Box::pin(hook()))));
    }

    /// Number of hooks still pending.
    #[must_use]
    pub fn pending_hooks(&self) -> usize {
        self.hooks.lock().len()
    }

    /// Notifies subscribers, then runs every registered hook.
    ///
    /// Calling this more than once is harmless; hooks run only once.
    pub async fn shutdown(&self) {
        // No receivers is fine.
        let _ = self.notify.send(());

        let hooks = std::mem::take(&mut *self.hooks.lock());
        for (name, hook) in hooks.into_iter().rev() {
            match tokio::time::timeout(self.hook_timeout, hook()).await {
                Ok(()) => info!(hook = %name, "Shutdown hook completed"),
                Err(_) => warn!(
                    hook = %name,
                    timeout_ms = self.hook_timeout.as_millis() as u64,
                    "Shutdown hook timed out"
                ),
            }
        }
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl std::fmt::Debug for ShutdownCoordinator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShutdownCoordinator")
            .field("pending_hooks", &self.pending_hooks())
            .field("hook_timeout", &self.hook_timeout)
            .finish()
    }
}
