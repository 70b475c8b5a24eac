use std::{any::Any, panic::AssertUnwindSafe, sync::Arc};

use {
    cibot_channels::{BotIdentity, ChannelOutbound, InboundEvent, Sender},
    cibot_config::BotConfig,
    cibot_contexts::ContextManager,
    cibot_plugins::{HookRegistry, Plugin, Response},
    futures::FutureExt,
    tracing::{debug, error, info, warn},
};

#[cfg(feature = "metrics")]
use {
    cibot_metrics::{counter, dispatch as dispatch_metrics, histogram, labels, outbound},
    std::time::Instant,
};

use crate::{Error, Result};

/// Reply sent to the channel when handling an event fails.
pub const APOLOGY: &str = "An error has occurred and been logged accordingly";

/// Which branch handled an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    /// No text, no channel, or sent by the bot itself.
    Filtered,
    Command { plugin: String },
    Context { plugin: String },
    /// The user's context is finished or expired but not yet swept.
    StaleContext,
    Trigger { plugin: String },
    Mention { plugin: String },
    Unmatched,
    /// A handler failed or panicked; the apology was sent.
    Failed,
}

impl Route {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Filtered => "filtered",
            Self::Command { .. } => "command",
            Self::Context { .. } => "context",
            Self::StaleContext => "stale_context",
            Self::Trigger { .. } => "trigger",
            Self::Mention { .. } => "mention",
            Self::Unmatched => "unmatched",
            Self::Failed => "failed",
        }
    }
}

pub struct DispatchEngine {
    registry: HookRegistry,
    contexts: Arc<ContextManager>,
    outbound: Arc<dyn ChannelOutbound>,
    identity: BotIdentity,
    /// The bot's mention token, `<@ID>`.
    mention: String,
    command_trigger: String,
    mention_plugin: String,
}

impl DispatchEngine {
    #[must_use]
    pub fn new(
        registry: HookRegistry,
        contexts: Arc<ContextManager>,
        outbound: Arc<dyn ChannelOutbound>,
        config: &BotConfig,
        identity: BotIdentity,
    ) -> Self {
        Self {
            registry,
            contexts,
            outbound,
            mention: identity.mention(),
            identity,
            command_trigger: config.command_trigger.clone(),
            mention_plugin: config.mention_plugin.clone(),
        }
    }

    pub fn registry(&self) -> &HookRegistry {
        &self.registry
    }

    pub fn identity(&self) -> &BotIdentity {
        &self.identity
    }

    /// Route one event to at most one plugin and forward its reply.
    ///
    /// Never fails: handler errors and panics are logged and answered with
    /// [`APOLOGY`] in the originating channel.
    pub async fn handle_event(&self, event: &InboundEvent) -> Route {
        #[cfg(feature = "metrics")]
        let started = Instant::now();

        let Some((channel, text)) = self.accept(event) else {
            return Route::Filtered;
        };
        let user = &event.sender;
        info!(channel, user = %user.label(), text, "inbound message");

        let outcome = AssertUnwindSafe(self.route(channel, user, text))
            .catch_unwind()
            .await;
        let route = match outcome {
            Ok(Ok(route)) => route,
            Ok(Err(e)) => {
                error!(channel, user = %user.id, text, error = %e, "failed processing message");
                self.apologize(channel).await;
                Route::Failed
            },
            Err(panic) => {
                error!(
                    channel,
                    user = %user.id,
                    text,
                    panic = panic_message(panic.as_ref()),
                    "plugin panicked while processing message"
                );
                self.apologize(channel).await;
                Route::Failed
            },
        };

        #[cfg(feature = "metrics")]
        {
            counter!(dispatch_metrics::EVENTS_TOTAL, labels::ROUTE => route.as_str())
                .increment(1);
            if route == Route::Failed {
                counter!(dispatch_metrics::HANDLER_ERRORS_TOTAL).increment(1);
            }
            histogram!(dispatch_metrics::DURATION_SECONDS)
                .record(started.elapsed().as_secs_f64());
        }

        route
    }

    /// Drop events without text or channel, and the bot's own messages.
    fn accept<'e>(&self, event: &'e InboundEvent) -> Option<(&'e str, &'e str)> {
        let text = event.text.as_deref().filter(|t| !t.trim().is_empty())?;
        let channel = event.channel.as_deref().filter(|c| !c.is_empty())?;
        if event.sender.id == self.identity.id {
            return None;
        }
        Some((channel, text))
    }

    async fn route(&self, channel: &str, user: &Sender, text: &str) -> Result<Route> {
        let words: Vec<String> = text.split_whitespace().map(str::to_string).collect();

        if let Some((name, plugin, command, args)) = self.match_command(&words) {
            debug!(channel, user = %user.id, plugin = name, command = %command, "serving command");
            let handler = plugin
                .command()
                .ok_or_else(|| Error::missing_handler(name, "command"))?;
            let response = handler
                .handle_command(channel, user, &command, args)
                .await
                .map_err(|e| Error::handler(name, "command", &e))?;
            self.forward(channel, response).await?;
            return Ok(Route::Command {
                plugin: name.to_string(),
            });
        }

        {
            let mut guard = self.contexts.lock().await?;
            if let Some(ctx) = guard.get_mut(channel, &user.id) {
                if !ctx.is_active() {
                    debug!(
                        channel,
                        user = %user.id,
                        plugin = ctx.owner(),
                        "dropping message for a context awaiting removal"
                    );
                    return Ok(Route::StaleContext);
                }
                let owner = ctx.owner().to_string();
                debug!(channel, user = %user.id, plugin = %owner, "serving context");
                let handler = self
                    .registry
                    .get(&owner)
                    .and_then(|p| p.context())
                    .ok_or_else(|| Error::missing_handler(owner.as_str(), "context"))?;
                let response =
                    cibot_contexts::while_locked(handler.handle_context(channel, user, ctx, &words))
                        .await
                        .map_err(|e| Error::handler(owner.as_str(), "context", &e))?;
                ctx.push_history(words);
                self.forward(channel, response).await?;
                return Ok(Route::Context { plugin: owner });
            }
        }

        if let Some((name, plugin)) = self.registry.resolve_trigger(text) {
            debug!(channel, user = %user.id, plugin = name, "serving trigger");
            let handler = plugin
                .trigger()
                .ok_or_else(|| Error::missing_handler(name, "trigger"))?;
            let response = handler
                .handle_trigger(channel, user, &words)
                .await
                .map_err(|e| Error::handler(name, "trigger", &e))?;
            self.forward(channel, response).await?;
            return Ok(Route::Trigger {
                plugin: name.to_string(),
            });
        }

        if text.contains(&self.mention) {
            let Some(handler) = self
                .registry
                .get(&self.mention_plugin)
                .and_then(|p| p.command())
            else {
                debug!(plugin = %self.mention_plugin, "mention plugin not loaded, ignoring mention");
                return Ok(Route::Unmatched);
            };
            let stripped = text.replace(&self.mention, " ");
            let words: Vec<String> = stripped.split_whitespace().map(str::to_string).collect();
            debug!(channel, user = %user.id, plugin = %self.mention_plugin, "serving mention");
            let response = handler
                .handle_command(channel, user, "", &words)
                .await
                .map_err(|e| Error::handler(self.mention_plugin.as_str(), "command", &e))?;
            self.forward(channel, response).await?;
            return Ok(Route::Mention {
                plugin: self.mention_plugin.clone(),
            });
        }

        debug!(channel, user = %user.id, "no plugins matched the event");
        Ok(Route::Unmatched)
    }

    /// `(plugin name, plugin, command, arguments)` when the first word is the
    /// command prefix followed by a registered command.
    fn match_command<'w>(
        &'w self,
        words: &'w [String],
    ) -> Option<(&'w str, &'w Arc<dyn Plugin>, String, &'w [String])> {
        if self.command_trigger.is_empty() {
            return None;
        }
        let (first, args) = words.split_first()?;
        let command = first
            .strip_prefix(self.command_trigger.as_str())?
            .to_lowercase();
        let (name, plugin) = self.registry.resolve_command(&command)?;
        Some((name, plugin, command, args))
    }

    async fn forward(&self, channel: &str, response: Response) -> Result<()> {
        for message in response.into_messages() {
            self.outbound.send_text(channel, &message).await?;

            #[cfg(feature = "metrics")]
            counter!(outbound::MESSAGES_SENT_TOTAL).increment(1);
        }
        Ok(())
    }

    async fn apologize(&self, channel: &str) {
        if let Err(e) = self.outbound.send_text(channel, APOLOGY).await {
            #[cfg(feature = "metrics")]
            counter!(outbound::SEND_ERRORS_TOTAL).increment(1);
            warn!(channel, error = %e, "failed to send apology");
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}
