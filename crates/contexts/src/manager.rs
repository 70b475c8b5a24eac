use std::{collections::HashMap, sync::Arc, time::Duration};

use {
    cibot_channels::ChannelOutbound,
    tokio::sync::{Mutex, MutexGuard},
    tracing::{debug, info},
};

#[cfg(feature = "metrics")]
use cibot_metrics::{contexts as ctx_metrics, counter, gauge, labels};

use crate::{
    Error, Result,
    context::{Context, ContextOptions},
};

/// Context lifetime when neither the plugin nor the config sets one.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

pub(crate) type ContextMap = HashMap<String, Vec<Context>>;

tokio::task_local! {
    /// Present while the current task runs plugin code under the lock.
    static LOCK_HELD: ();
}

/// Run `fut` on behalf of a held [`ContextGuard`].
///
/// The structural mutex is not reentrant: a manager call made from inside
/// `fut` fails with [`Error::Reentrant`] instead of waiting on itself.
pub async fn while_locked<F: Future>(fut: F) -> F::Output {
    LOCK_HELD.scope((), fut).await
}

fn lock_held_by_caller() -> bool {
    LOCK_HELD.try_with(|_| ()).is_ok()
}

/// Owns every context, keyed by user id. Each user has at most one context
/// per channel.
pub struct ContextManager {
    pub(crate) contexts: Mutex<ContextMap>,
    pub(crate) outbound: Arc<dyn ChannelOutbound>,
    default_timeout: Duration,
}

impl ContextManager {
    #[must_use]
    pub fn new(outbound: Arc<dyn ChannelOutbound>, default_timeout: Duration) -> Self {
        Self {
            contexts: Mutex::new(HashMap::new()),
            outbound,
            default_timeout,
        }
    }

    pub fn default_timeout(&self) -> Duration {
        self.default_timeout
    }

    pub(crate) async fn acquire(&self) -> Result<MutexGuard<'_, ContextMap>> {
        if lock_held_by_caller() {
            return Err(Error::Reentrant);
        }
        Ok(self.contexts.lock().await)
    }

    /// Open a context for `user_id` in `channel`, owned by the plugin `owner`,
    /// and return a snapshot of it. Values the plugin needs from the start
    /// go in through [`ContextOptions::with_value`].
    ///
    /// Fails with [`Error::AlreadyActive`] while the pair has a live
    /// context. A finished occupant is replaced; an expired one is replaced
    /// and its timeout notice is sent, as the sweep would have done.
    pub async fn new_context(
        &self,
        owner: &str,
        channel: &str,
        user_id: &str,
        opts: ContextOptions,
    ) -> Result<Context> {
        let (created, displaced) = {
            let mut map = self.acquire().await?;
            let list = map.entry(user_id.to_string()).or_default();

            let mut displaced = None;
            if let Some(pos) = list.iter().position(|c| c.channel() == channel) {
                let current = &list[pos];
                if current.is_active() {
                    return Err(Error::already_active(current.owner(), channel, user_id));
                }
                let old = list.remove(pos);
                if !old.is_finished() {
                    displaced = Some(old);
                }
            }

            let ctx = Context::new(owner, channel, user_id, self.default_timeout, opts);
            debug!(
                plugin = owner,
                channel,
                user = user_id,
                timeout_secs = (ctx.expires_at() - ctx.created_at()).as_secs(),
                "context opened"
            );
            let created = ctx.clone();
            list.push(ctx);

            #[cfg(feature = "metrics")]
            {
                counter!(ctx_metrics::CREATED_TOTAL, labels::PLUGIN => owner.to_string())
                    .increment(1);
                gauge!(ctx_metrics::ACTIVE).set(count(&map) as f64);
            }

            (created, displaced)
        };

        if let Some(old) = displaced {
            info!(plugin = old.owner(), channel, user = user_id, "replaced expired context");
            crate::sweep::send_timeout_notice(self.outbound.as_ref(), &old).await;
        }
        Ok(created)
    }

    /// Snapshot of the (channel, user) context, live or not.
    pub async fn get_context(&self, channel: &str, user_id: &str) -> Result<Option<Context>> {
        Ok(self.lock().await?.get(channel, user_id).cloned())
    }

    /// Remove the (channel, user) context. Returns whether one existed.
    pub async fn finish_context(&self, channel: &str, user_id: &str) -> Result<bool> {
        Ok(self.lock().await?.remove(channel, user_id).is_some())
    }

    /// Take the structural lock. Plugin code run while the guard is alive
    /// goes through [`while_locked`].
    pub async fn lock(&self) -> Result<ContextGuard<'_>> {
        Ok(ContextGuard {
            map: self.acquire().await?,
        })
    }

    /// Number of contexts currently held, live or awaiting the sweep.
    pub async fn len(&self) -> Result<usize> {
        Ok(count(&*self.acquire().await?))
    }

    pub async fn is_empty(&self) -> Result<bool> {
        Ok(self.acquire().await?.is_empty())
    }
}

pub(crate) fn count(map: &ContextMap) -> usize {
    map.values().map(Vec::len).sum()
}

/// Exclusive access to the context map.
pub struct ContextGuard<'a> {
    map: MutexGuard<'a, ContextMap>,
}

impl ContextGuard<'_> {
    pub fn get(&self, channel: &str, user_id: &str) -> Option<&Context> {
        self.map
            .get(user_id)?
            .iter()
            .find(|c| c.channel() == channel)
    }

    pub fn get_mut(&mut self, channel: &str, user_id: &str) -> Option<&mut Context> {
        self.map
            .get_mut(user_id)?
            .iter_mut()
            .find(|c| c.channel() == channel)
    }

    /// Remove the context, dropping the user entry once it is empty.
    pub fn remove(&mut self, channel: &str, user_id: &str) -> Option<Context> {
        let list = self.map.get_mut(user_id)?;
        let pos = list.iter().position(|c| c.channel() == channel)?;
        let removed = list.remove(pos);
        if list.is_empty() {
            self.map.remove(user_id);
        }
        debug!(plugin = removed.owner(), channel, user = user_id, "context removed");

        #[cfg(feature = "metrics")]
        gauge!(ctx_metrics::ACTIVE).set(count(&self.map) as f64);

        Some(removed)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        cibot_channels::RecordingOutbound,
        rstest::rstest,
    };

    fn manager() -> (ContextManager, Arc<RecordingOutbound>) {
        let out = Arc::new(RecordingOutbound::new());
        (ContextManager::new(out.clone(), DEFAULT_TIMEOUT), out)
    }

    #[tokio::test(start_paused = true)]
    async fn one_live_context_per_user_and_channel() {
        let (mgr, _) = manager();
        mgr.new_context("greet", "C1", "U1", ContextOptions::new())
            .await
            .unwrap();
        let err = mgr
            .new_context("quiz", "C1", "U1", ContextOptions::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::AlreadyActive { ref owner, .. } if owner == "greet"));

        // Other channel and other user are independent.
        mgr.new_context("quiz", "C2", "U1", ContextOptions::new())
            .await
            .unwrap();
        mgr.new_context("quiz", "C1", "U2", ContextOptions::new())
            .await
            .unwrap();
        assert_eq!(mgr.len().await.unwrap(), 3);
        assert_eq!(mgr.get_context("C1", "U1").await.unwrap().unwrap().owner(), "greet");
    }

    #[rstest]
    #[case::finished(true, 0)]
    #[case::expired(false, 1)]
    #[tokio::test(start_paused = true)]
    async fn dead_occupant_is_replaced(#[case] finish: bool, #[case] notices: usize) {
        let (mgr, out) = manager();
        let opts = ContextOptions::new()
            .with_timeout(Duration::from_secs(1))
            .with_timeout_message("gave up", false);
        mgr.new_context("greet", "C1", "U1", opts).await.unwrap();
        if finish {
            mgr.lock().await.unwrap().get_mut("C1", "U1").unwrap().finish();
        } else {
            tokio::time::advance(Duration::from_secs(2)).await;
        }

        mgr.new_context("quiz", "C1", "U1", ContextOptions::new())
            .await
            .unwrap();
        assert_eq!(mgr.get_context("C1", "U1").await.unwrap().unwrap().owner(), "quiz");
        assert_eq!(mgr.len().await.unwrap(), 1);
        assert_eq!(out.texts().len(), notices);
    }

    #[tokio::test(start_paused = true)]
    async fn finish_context_drops_empty_user_entry() {
        let (mgr, _) = manager();
        mgr.new_context("greet", "C1", "U1", ContextOptions::new())
            .await
            .unwrap();
        assert!(mgr.finish_context("C1", "U1").await.unwrap());
        assert!(!mgr.finish_context("C1", "U1").await.unwrap());
        assert!(mgr.is_empty().await.unwrap());
        assert!(mgr.get_context("C1", "U1").await.unwrap().is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn guard_mutations_are_visible() {
        let (mgr, _) = manager();
        mgr.new_context("greet", "C1", "U1", ContextOptions::new())
            .await
            .unwrap();
        {
            let mut guard = mgr.lock().await.unwrap();
            let ctx = guard.get_mut("C1", "U1").unwrap();
            ctx.set("target", "U2");
            ctx.push_history(vec!["U2".into()]);
        }
        let ctx = mgr.get_context("C1", "U1").await.unwrap().unwrap();
        assert_eq!(ctx.get_str("target"), Some("U2"));
        assert_eq!(ctx.history(), &[vec!["U2".to_string()]]);
    }

    #[tokio::test(start_paused = true)]
    async fn new_context_returns_the_seeded_context() {
        let (mgr, _) = manager();
        let ctx = mgr
            .new_context(
                "kubectl",
                "C1",
                "U1",
                ContextOptions::new().with_value("namespace", "prod"),
            )
            .await
            .unwrap();
        assert_eq!(ctx.owner(), "kubectl");
        assert_eq!(ctx.get_str("namespace"), Some("prod"));
        assert!(ctx.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn calls_under_a_held_lock_fail_fast() {
        let (mgr, _) = manager();
        mgr.new_context("greet", "C1", "U1", ContextOptions::new())
            .await
            .unwrap();

        let guard = mgr.lock().await.unwrap();
        let nested = tokio::time::timeout(Duration::from_secs(1), while_locked(async {
            (
                mgr.finish_context("C1", "U1").await,
                mgr.get_context("C1", "U1").await,
                mgr.new_context("quiz", "C2", "U1", ContextOptions::new())
                    .await,
            )
        }))
        .await
        .unwrap();
        drop(guard);

        assert!(matches!(nested.0, Err(Error::Reentrant)));
        assert!(matches!(nested.1, Err(Error::Reentrant)));
        assert!(matches!(nested.2, Err(Error::Reentrant)));
        assert!(mgr.get_context("C1", "U1").await.unwrap().is_some());
        assert_eq!(mgr.len().await.unwrap(), 1);
    }
}
