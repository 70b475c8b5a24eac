//! Periodic plugin tasks.

use std::time::Duration;

use {
    cibot_common::Lifecycle,
    tokio::task::JoinHandle,
    tracing::{debug, error},
};

#[cfg(feature = "metrics")]
use cibot_metrics::{counter, labels, loops as loop_metrics};

pub(crate) fn spawn_loop<F, Fut>(
    plugin: String,
    interval: Duration,
    lifecycle: Lifecycle,
    mut task: F,
) -> JoinHandle<()>
where
    F: FnMut() -> Fut + Send + 'static,
    Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
{
    debug!(plugin = %plugin, interval_secs = interval.as_secs(), "registering plugin loop");
    tokio::spawn(async move {
        if !lifecycle.wait_ready().await {
            return;
        }
        while lifecycle.wait(interval).await {
            debug!(plugin = %plugin, "firing plugin loop");

            #[cfg(feature = "metrics")]
            counter!(loop_metrics::RUNS_TOTAL, labels::PLUGIN => plugin.clone()).increment(1);

            if let Err(e) = task().await {
                #[cfg(feature = "metrics")]
                counter!(loop_metrics::ERRORS_TOTAL, labels::PLUGIN => plugin.clone())
                    .increment(1);
                error!(plugin = %plugin, error = %format!("{e:#}"), "plugin loop failed");
            }
        }
        debug!(plugin = %plugin, "plugin loop stopped");
    })
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        std::sync::{
            Arc,
            atomic::{AtomicUsize, Ordering},
        },
    };

    fn counting(
        runs: &Arc<AtomicUsize>,
        fail: bool,
    ) -> impl FnMut() -> std::future::Ready<anyhow::Result<()>> + Send + 'static {
        let runs = Arc::clone(runs);
        move || {
            runs.fetch_add(1, Ordering::SeqCst);
            std::future::ready(if fail {
                Err(anyhow::anyhow!("poll failed"))
            } else {
                Ok(())
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn first_run_is_one_interval_after_ready() {
        let lifecycle = Lifecycle::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_loop(
            "poller".into(),
            Duration::from_secs(10),
            lifecycle.clone(),
            counting(&runs, false),
        );
        lifecycle.mark_ready();

        tokio::time::sleep(Duration::from_secs(9)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 0);
        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 1);
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 2);

        lifecycle.shutdown();
        handle.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn errors_do_not_stop_the_loop() {
        let lifecycle = Lifecycle::new();
        lifecycle.mark_ready();
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_loop(
            "flaky".into(),
            Duration::from_secs(1),
            lifecycle.clone(),
            counting(&runs, true),
        );

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);

        lifecycle.shutdown();
        handle.await.unwrap();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_before_ready_never_runs() {
        let lifecycle = Lifecycle::new();
        let runs = Arc::new(AtomicUsize::new(0));
        let handle = spawn_loop(
            "idle".into(),
            Duration::from_secs(1),
            lifecycle.clone(),
            counting(&runs, false),
        );
        lifecycle.shutdown();
        handle.await.unwrap();
        assert_eq!(runs.load(Ordering::SeqCst), 0);
    }
}
