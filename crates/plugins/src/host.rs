//! Services the framework hands to plugins.

use std::{
    sync::{Arc, OnceLock},
    time::Duration,
};

use {
    cibot_channels::{ChannelOutbound, Sender},
    cibot_common::Lifecycle,
    cibot_config::{BotConfig, PluginConfig},
    cibot_contexts::{Context, ContextManager, ContextOptions},
    cibot_store::{KvStore, ScopedStore},
    tokio::task::JoinHandle,
    tracing::{info, warn},
};

use crate::{loops, registry::HelpIndex};

/// Shared services, cloned into every [`PluginScope`].
#[derive(Clone)]
pub struct PluginHost {
    config: Arc<BotConfig>,
    store: Arc<dyn KvStore>,
    contexts: Arc<ContextManager>,
    outbound: Arc<dyn ChannelOutbound>,
    lifecycle: Lifecycle,
    loops_enabled: bool,
    help: Arc<OnceLock<HelpIndex>>,
}

impl PluginHost {
    #[must_use]
    pub fn new(
        config: Arc<BotConfig>,
        store: Arc<dyn KvStore>,
        contexts: Arc<ContextManager>,
        outbound: Arc<dyn ChannelOutbound>,
        lifecycle: Lifecycle,
    ) -> Self {
        Self {
            config,
            store,
            contexts,
            outbound,
            lifecycle,
            loops_enabled: true,
            help: Arc::new(OnceLock::new()),
        }
    }

    /// Log loop registrations instead of starting them (console mode).
    #[must_use]
    pub fn without_loops(mut self) -> Self {
        self.loops_enabled = false;
        self
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn contexts(&self) -> &Arc<ContextManager> {
        &self.contexts
    }

    pub fn outbound(&self) -> &Arc<dyn ChannelOutbound> {
        &self.outbound
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Publish the command list and help pages. Only the first call takes
    /// effect.
    pub fn publish_help(&self, index: HelpIndex) {
        if self.help.set(index).is_err() {
            warn!("help index already published");
        }
    }

    /// View of the host for the plugin `name`.
    pub fn scope(&self, name: &str) -> PluginScope {
        PluginScope {
            name: name.to_string(),
            config: self.config.plugin(name),
            store: ScopedStore::new(name, Arc::clone(&self.store)),
            host: self.clone(),
        }
    }
}

/// What one plugin sees of the framework: its own config namespace and
/// store subject, plus the shared contexts, transport and lifecycle.
#[derive(Clone)]
pub struct PluginScope {
    name: String,
    config: PluginConfig,
    store: ScopedStore,
    host: PluginHost,
}

impl PluginScope {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    pub fn bot_config(&self) -> &BotConfig {
        self.host.config()
    }

    pub fn store(&self) -> &ScopedStore {
        &self.store
    }

    pub fn contexts(&self) -> &ContextManager {
        &self.host.contexts
    }

    pub fn outbound(&self) -> &dyn ChannelOutbound {
        self.host.outbound.as_ref()
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.host.lifecycle
    }

    /// Command list and help pages, available once loading has finished.
    pub fn help(&self) -> Option<&HelpIndex> {
        self.host.help.get()
    }

    /// Help page for `command`, if any plugin registered one.
    pub fn help_for(&self, command: &str) -> Option<String> {
        self.help()?.help_for(command).map(str::to_string)
    }

    pub fn is_admin(&self, user: &Sender) -> bool {
        self.host.config.is_admin(&user.id)
    }

    /// Open a context owned by this plugin.
    pub async fn new_context(
        &self,
        channel: &str,
        user: &Sender,
        opts: ContextOptions,
    ) -> cibot_contexts::Result<Context> {
        self.host
            .contexts
            .new_context(&self.name, channel, &user.id, opts)
            .await
    }

    /// Run `task` every `interval` until shutdown. The first run happens one
    /// interval after the bot is ready; errors are logged and the loop
    /// carries on.
    ///
    /// Returns `None` when loops are disabled for this host.
    pub fn register_loop<F, Fut>(&self, interval: Duration, task: F) -> Option<JoinHandle<()>>
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send + 'static,
    {
        if !self.host.loops_enabled {
            info!(
                plugin = %self.name,
                interval_secs = interval.as_secs(),
                "loops disabled, not starting plugin loop"
            );
            return None;
        }
        Some(loops::spawn_loop(
            self.name.clone(),
            interval,
            self.host.lifecycle.clone(),
            task,
        ))
    }
}
