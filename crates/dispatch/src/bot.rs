//! Bootstrap and the inbound event loop.

use std::{sync::Arc, time::Duration};

use {
    cibot_channels::{BotIdentity, ChannelOutbound, InboundEvent},
    cibot_common::Lifecycle,
    cibot_config::{BotConfig, validate},
    cibot_contexts::ContextManager,
    cibot_plugins::{HookRegistry, PluginCatalog, PluginHost, load_plugins},
    cibot_store::{KvStore, MemoryStore},
    tokio::{sync::mpsc, task::JoinHandle},
    tracing::{debug, info, warn},
};

use crate::{DispatchEngine, Error, Result, Route};

/// Knobs that differ between a live transport and the console.
pub struct BotOptions {
    /// Start plugin loops. Off in console mode.
    pub loops: bool,
    pub builtins: PluginCatalog,
    /// Plugins that `enabled_plugins` may name.
    pub catalog: PluginCatalog,
}

impl Default for BotOptions {
    fn default() -> Self {
        Self {
            loops: true,
            builtins: PluginCatalog::builtins(),
            catalog: PluginCatalog::bundled(),
        }
    }
}

/// Why [`Bot::run`] returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Shutdown,
    /// Shutdown with a request to bootstrap again.
    Restart,
    TransportClosed,
}

/// A bootstrapped bot, waiting for its transport.
pub struct Bot {
    config: Arc<BotConfig>,
    contexts: Arc<ContextManager>,
    outbound: Arc<dyn ChannelOutbound>,
    registry: HookRegistry,
    lifecycle: Lifecycle,
}

impl Bot {
    /// Check identity settings, validate the config, open the store, create
    /// the context manager and load every plugin. Any failure here aborts
    /// startup.
    pub async fn bootstrap(
        config: BotConfig,
        outbound: Arc<dyn ChannelOutbound>,
        lifecycle: Lifecycle,
        options: BotOptions,
    ) -> Result<Self> {
        info!("starting up");
        let name = config
            .bot_name
            .as_deref()
            .filter(|n| !n.trim().is_empty())
            .ok_or(Error::MissingBotName)?;
        debug!(bot_name = name, "using bot name");
        if config.token().is_none() {
            return Err(Error::MissingToken);
        }
        let checked = validate(&config);
        for diag in &checked.diagnostics {
            debug!(severity = %diag.severity, path = %diag.path, "{}", diag.message);
        }
        if checked.has_errors() {
            return Err(cibot_config::Error::Invalid(checked).into());
        }
        debug!(admins = ?config.admins, "configured admins");

        let store: Arc<dyn KvStore> = Arc::new(MemoryStore::from_config(&config.db.memory).await?);
        let contexts = Arc::new(ContextManager::new(
            Arc::clone(&outbound),
            Duration::from_secs(config.contexts.timeout_secs),
        ));

        let config = Arc::new(config);
        let mut host = PluginHost::new(
            Arc::clone(&config),
            store,
            Arc::clone(&contexts),
            Arc::clone(&outbound),
            lifecycle.clone(),
        );
        if !options.loops {
            host = host.without_loops();
        }
        let registry = load_plugins(&host, &options.builtins, &options.catalog).await?;

        Ok(Self {
            config,
            contexts,
            outbound,
            registry,
            lifecycle,
        })
    }

    pub fn config(&self) -> &BotConfig {
        &self.config
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn contexts(&self) -> &Arc<ContextManager> {
        &self.contexts
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    /// Build the dispatch engine for the now-known bot `identity`.
    pub fn into_engine(self, identity: BotIdentity) -> DispatchEngine {
        DispatchEngine::new(
            self.registry,
            self.contexts,
            self.outbound,
            &self.config,
            identity,
        )
    }

    /// Mark the bot ready and start the context sweep. Events are then fed
    /// through [`RunningBot::handle_event`].
    pub fn start(self, identity: BotIdentity) -> RunningBot {
        let lifecycle = self.lifecycle.clone();
        let sweep_interval = Duration::from_secs(self.config.contexts.sweep_interval_secs);
        let sweeper = self
            .contexts
            .spawn_sweeper(lifecycle.clone(), sweep_interval);

        info!(bot_id = %identity.id, bot_name = %identity.name, "initialization complete");
        let engine = self.into_engine(identity);
        lifecycle.mark_ready();
        RunningBot {
            engine,
            lifecycle,
            sweeper,
        }
    }

    /// Dispatch `events` one at a time until shutdown or until the transport
    /// closes the channel. The receiver is borrowed so a restarted bot can
    /// keep reading from it.
    pub async fn run(
        self,
        identity: BotIdentity,
        events: &mut mpsc::Receiver<InboundEvent>,
    ) -> Exit {
        let running = self.start(identity);
        let lifecycle = running.lifecycle.clone();

        let exit = loop {
            tokio::select! {
                biased;
                () = lifecycle.cancelled() => break Exit::Shutdown,
                event = events.recv() => match event {
                    Some(event) => {
                        running.handle_event(&event).await;
                    },
                    None => {
                        info!("transport closed the event stream");
                        break Exit::TransportClosed;
                    },
                },
            }
        };

        running.stop().await;
        if exit == Exit::Shutdown && lifecycle.restart_requested() {
            Exit::Restart
        } else {
            exit
        }
    }

    /// Bootstrap and run the bot, bootstrapping again from a freshly loaded
    /// config whenever a plugin requests a restart.
    pub async fn serve<L, O>(
        mut load: L,
        mut options: O,
        outbound: Arc<dyn ChannelOutbound>,
        identity: BotIdentity,
        mut events: mpsc::Receiver<InboundEvent>,
    ) -> Result<Exit>
    where
        L: FnMut() -> Result<BotConfig>,
        O: FnMut() -> BotOptions,
    {
        loop {
            let bot =
                Self::bootstrap(load()?, Arc::clone(&outbound), Lifecycle::new(), options()).await?;
            match bot.run(identity.clone(), &mut events).await {
                Exit::Restart => info!("restarting"),
                exit => return Ok(exit),
            }
        }
    }
}

/// A started bot: the engine plus the background sweep.
pub struct RunningBot {
    engine: DispatchEngine,
    lifecycle: Lifecycle,
    sweeper: JoinHandle<()>,
}

impl RunningBot {
    pub fn engine(&self) -> &DispatchEngine {
        &self.engine
    }

    pub fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }

    pub async fn handle_event(&self, event: &InboundEvent) -> Route {
        let route = self.engine.handle_event(event).await;
        debug!(route = route.as_str(), "event handled");
        route
    }

    /// Raise shutdown and wait for the sweep to exit.
    pub async fn stop(self) {
        self.lifecycle.shutdown();
        if let Err(e) = self.sweeper.await {
            warn!(error = %e, "context sweep task ended abnormally");
        }
        info!("bot stopped");
    }
}
