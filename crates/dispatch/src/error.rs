use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("no bot name configured")]
    MissingBotName,

    #[error("no platform token configured")]
    MissingToken,

    #[error(transparent)]
    Config(#[from] cibot_config::Error),

    #[error(transparent)]
    Plugins(#[from] cibot_plugins::Error),

    #[error(transparent)]
    Contexts(#[from] cibot_contexts::Error),

    #[error(transparent)]
    Store(#[from] cibot_store::Error),

    #[error("plugin '{plugin}' failed in its {hook} handler: {reason}")]
    Handler {
        plugin: String,
        hook: &'static str,
        reason: String,
    },

    #[error("plugin '{plugin}' has no {hook} handler")]
    MissingHandler { plugin: String, hook: &'static str },

    #[error("failed to send reply: {0}")]
    Outbound(#[from] cibot_channels::Error),
}

impl Error {
    #[must_use]
    pub fn handler(plugin: impl Into<String>, hook: &'static str, source: &anyhow::Error) -> Self {
        Self::Handler {
            plugin: plugin.into(),
            hook,
            reason: format!("{source:#}"),
        }
    }

    #[must_use]
    pub fn missing_handler(plugin: impl Into<String>, hook: &'static str) -> Self {
        Self::MissingHandler {
            plugin: plugin.into(),
            hook,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
