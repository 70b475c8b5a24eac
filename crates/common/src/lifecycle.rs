//! Process-wide readiness latch and shutdown signal.
//!
//! Every background task (context sweep, plugin loops) and the inbound event
//! loop hold a clone of the same [`Lifecycle`]. Tasks block on
//! [`Lifecycle::wait`] between ticks so a shutdown is observed at the next
//! interval boundary at the latest.
//!
//! A restart is a shutdown with a flag set: whoever drives the bot checks
//! [`Lifecycle::restart_requested`] after it stops and bootstraps again
//! with a fresh `Lifecycle`.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    time::Duration,
};

use {
    tokio::sync::watch,
    tokio_util::sync::CancellationToken,
    tracing::{debug, info},
};

#[derive(Clone)]
pub struct Lifecycle {
    ready: Arc<watch::Sender<bool>>,
    cancel: CancellationToken,
    restart: Arc<AtomicBool>,
}

impl Default for Lifecycle {
    fn default() -> Self {
        Self::new()
    }
}

impl Lifecycle {
    pub fn new() -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            ready: Arc::new(ready),
            cancel: CancellationToken::new(),
            restart: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Signal that the transport is connected and the bot identity is known.
    pub fn mark_ready(&self) {
        if !self.ready.send_replace(true) {
            info!("bot is ready");
        }
    }

    pub fn is_ready(&self) -> bool {
        *self.ready.borrow()
    }

    /// Wait until [`mark_ready`](Self::mark_ready) has been called.
    ///
    /// Returns `false` if shutdown was requested first.
    pub async fn wait_ready(&self) -> bool {
        let mut rx = self.ready.subscribe();
        tokio::select! {
            res = rx.wait_for(|ready| *ready) => res.is_ok(),
            () = self.cancel.cancelled() => false,
        }
    }

    /// Raise the shutdown signal. Idempotent.
    pub fn shutdown(&self) {
        if !self.cancel.is_cancelled() {
            info!("received shutdown signal");
            self.cancel.cancel();
        }
    }

    /// Shut down, asking the driver to bootstrap the bot again afterwards.
    pub fn request_restart(&self) {
        info!("received restart signal");
        self.restart.store(true, Ordering::SeqCst);
        self.shutdown();
    }

    pub fn restart_requested(&self) -> bool {
        self.restart.load(Ordering::SeqCst)
    }

    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Resolves once shutdown has been requested.
    pub async fn cancelled(&self) {
        self.cancel.cancelled().await;
    }

    /// Sleep for `interval` unless shutdown is requested first.
    ///
    /// Returns `true` while the bot is still running.
    pub async fn wait(&self, interval: Duration) -> bool {
        tokio::select! {
            () = tokio::time::sleep(interval) => true,
            () = self.cancel.cancelled() => {
                debug!("wait interrupted by shutdown");
                false
            },
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn wait_returns_true_after_interval() {
        let lifecycle = Lifecycle::new();
        assert!(lifecycle.wait(Duration::from_secs(5)).await);
        assert!(lifecycle.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn wait_is_interrupted_by_shutdown() {
        let lifecycle = Lifecycle::new();
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.wait(Duration::from_secs(3600)).await })
        };
        tokio::task::yield_now().await;
        lifecycle.shutdown();
        assert!(!waiter.await.unwrap());
        assert!(!lifecycle.is_running());
    }

    #[tokio::test]
    async fn wait_ready_resolves_after_mark_ready() {
        let lifecycle = Lifecycle::new();
        assert!(!lifecycle.is_ready());
        let waiter = {
            let lifecycle = lifecycle.clone();
            tokio::spawn(async move { lifecycle.wait_ready().await })
        };
        lifecycle.mark_ready();
        assert!(waiter.await.unwrap());
        assert!(lifecycle.is_ready());
    }

    #[test]
    fn restart_is_a_flagged_shutdown() {
        let lifecycle = Lifecycle::new();
        let seen_by_task = lifecycle.clone();
        assert!(!lifecycle.restart_requested());

        lifecycle.shutdown();
        assert!(!seen_by_task.restart_requested());

        let lifecycle = Lifecycle::new();
        let seen_by_task = lifecycle.clone();
        lifecycle.request_restart();
        assert!(!seen_by_task.is_running());
        assert!(seen_by_task.restart_requested());
    }

    #[tokio::test]
    async fn wait_ready_gives_up_on_shutdown() {
        let lifecycle = Lifecycle::new();
        lifecycle.shutdown();
        assert!(!lifecycle.wait_ready().await);
    }
}
