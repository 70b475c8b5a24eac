//! `excuse`: a random developer excuse.
//!
//! The list can be replaced through `plugins.excuses.excuses`. The number of
//! excuses served is kept in the plugin store.

use {
    anyhow::{Context as _, Result},
    async_trait::async_trait,
    cibot_channels::Sender,
    rand::seq::IndexedRandom,
    tracing::debug,
};

use crate::{CommandHandler, Plugin, PluginManifest, PluginScope, Response};

pub const NAME: &str = "excuses";

const SERVED_KEY: &str = "served";

const DEFAULT_EXCUSES: &[&str] = &[
    "It works on my machine.",
    "That's weird, it worked yesterday.",
    "Somebody must have changed my code.",
    "The build server must be caching an old version.",
    "It must be a hardware problem.",
    "I haven't touched that module in weeks!",
    "That's not a bug, it's a feature.",
    "It's a timezone issue.",
    "The third-party library is broken.",
    "Must be a race condition.",
];

pub struct ExcusesPlugin {
    scope: PluginScope,
    excuses: Vec<String>,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    Box::new(ExcusesPlugin {
        scope,
        excuses: Vec::new(),
    })
}

#[async_trait]
impl Plugin for ExcusesPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new()
            .hook("excuse")
            .help("excuse", "excuse - grab a random excuse")
    }

    async fn setup(&mut self) -> Result<()> {
        self.excuses = self
            .scope
            .config()
            .get_as::<Vec<String>>("excuses")
            .filter(|list| !list.is_empty())
            .unwrap_or_else(|| DEFAULT_EXCUSES.iter().map(|s| s.to_string()).collect());
        debug!(count = self.excuses.len(), "loaded excuses");
        Ok(())
    }

    fn command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for ExcusesPlugin {
    async fn handle_command(
        &self,
        _channel: &str,
        _user: &Sender,
        _command: &str,
        _words: &[String],
    ) -> Result<Response> {
        let excuse = self
            .excuses
            .choose(&mut rand::rng())
            .context("no excuses configured")?
            .clone();

        let store = self.scope.store();
        let served = store.get_as::<u64>(SERVED_KEY).await?.unwrap_or(0) + 1;
        store.store_as(SERVED_KEY, &served).await?;

        Ok(excuse.into())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*, crate::host::tests::host_with, cibot_config::BotConfig, serde_json::json,
    };

    async fn serve(plugin: &dyn Plugin) -> Response {
        plugin
            .command()
            .unwrap()
            .handle_command("C1", &Sender::new("U1"), "excuse", &[])
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn configured_list_replaces_defaults_and_counts() {
        let mut config = BotConfig::default();
        config
            .plugins
            .insert(NAME.into(), json!({"excuses": ["Cosmic rays."]}));
        let (host, _) = host_with(config);
        let mut plugin = create(host.scope(NAME));
        plugin.setup().await.unwrap();

        assert_eq!(serve(plugin.as_ref()).await, "Cosmic rays.".into());
        assert_eq!(serve(plugin.as_ref()).await, "Cosmic rays.".into());
        let served = host.scope(NAME).store().get_as::<u64>(SERVED_KEY).await.unwrap();
        assert_eq!(served, Some(2));
    }

    #[tokio::test]
    async fn defaults_when_unconfigured() {
        let (host, _) = host_with(BotConfig::default());
        let mut plugin = create(host.scope(NAME));
        plugin.setup().await.unwrap();
        let Response::Text(excuse) = serve(plugin.as_ref()).await else {
            panic!("expected one excuse");
        };
        assert!(DEFAULT_EXCUSES.contains(&excuse.as_str()));
    }
}
