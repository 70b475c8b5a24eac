//! Background removal of finished and expired contexts.

use std::{sync::Arc, time::Duration};

use {
    cibot_channels::ChannelOutbound,
    cibot_common::Lifecycle,
    tokio::task::JoinHandle,
    tracing::{debug, warn},
};

#[cfg(feature = "metrics")]
use cibot_metrics::{contexts as ctx_metrics, counter, gauge};

use crate::{Result, context::Context, manager::ContextManager};

/// Outcome of one sweep pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub finished: usize,
    pub expired: usize,
}

impl ContextManager {
    /// Remove every finished or expired context, then send the timeout
    /// notice of each expired one. Removal happens under the lock; notices
    /// are sent after it is released, and a failed send is only logged.
    pub async fn sweep_once(&self) -> Result<SweepReport> {
        let mut report = SweepReport::default();
        let mut expired = Vec::new();

        {
            let mut map = self.acquire().await?;
            for list in map.values_mut() {
                let mut kept = Vec::with_capacity(list.len());
                for ctx in list.drain(..) {
                    if ctx.is_finished() {
                        debug!(
                            plugin = ctx.owner(),
                            channel = ctx.channel(),
                            user = ctx.user_id(),
                            "context finished"
                        );
                        report.finished += 1;
                    } else if ctx.is_expired() {
                        debug!(
                            plugin = ctx.owner(),
                            channel = ctx.channel(),
                            user = ctx.user_id(),
                            "context expired"
                        );
                        expired.push(ctx);
                    } else {
                        kept.push(ctx);
                    }
                }
                *list = kept;
            }
            map.retain(|_, list| !list.is_empty());

            #[cfg(feature = "metrics")]
            gauge!(ctx_metrics::ACTIVE).set(crate::manager::count(&map) as f64);
        }

        report.expired = expired.len();

        #[cfg(feature = "metrics")]
        counter!(ctx_metrics::EXPIRED_TOTAL).increment(report.expired as u64);

        for ctx in &expired {
            send_timeout_notice(self.outbound.as_ref(), ctx).await;
        }
        Ok(report)
    }

    /// Run [`sweep_once`](Self::sweep_once) every `interval`, starting once
    /// the bot is ready and stopping on shutdown.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        lifecycle: Lifecycle,
        interval: Duration,
    ) -> JoinHandle<()> {
        let manager = Arc::clone(self);
        tokio::spawn(async move {
            if !lifecycle.wait_ready().await {
                return;
            }
            debug!(interval_secs = interval.as_secs(), "starting context sweep");
            loop {
                if let Err(e) = manager.sweep_once().await {
                    warn!(error = %e, "context sweep skipped");
                }
                if !lifecycle.wait(interval).await {
                    break;
                }
            }
            debug!("context sweep stopped");
        })
    }
}

pub(crate) async fn send_timeout_notice(outbound: &dyn ChannelOutbound, ctx: &Context) {
    let Some(notice) = ctx.timeout_notice() else {
        return;
    };
    if let Err(e) = outbound
        .send_message(ctx.channel(), &notice.text, &[], notice.as_action)
        .await
    {
        warn!(
            plugin = ctx.owner(),
            channel = ctx.channel(),
            user = ctx.user_id(),
            error = %e,
            "failed to send context timeout notice"
        );
    }
}
