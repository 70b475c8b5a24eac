//! Startup-time plugin catalog and loader.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::{
    Error, Result, bundled,
    host::PluginHost,
    plugin::Plugin,
    registry::HookRegistry,
};

/// Builds a plugin from its scope. Called once per process.
pub type PluginConstructor = fn(crate::PluginScope) -> Box<dyn Plugin>;

/// Ordered `(name, constructor)` pairs.
#[derive(Clone, Default)]
pub struct PluginCatalog {
    entries: Vec<(&'static str, PluginConstructor)>,
}

impl PluginCatalog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an entry. A new name goes to the end.
    #[must_use]
    pub fn with(mut self, name: &'static str, constructor: PluginConstructor) -> Self {
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = constructor,
            None => self.entries.push((name, constructor)),
        }
        self
    }

    /// Plugins every bot loads, in load order.
    #[must_use]
    pub fn builtins() -> Self {
        Self::new()
            .with(bundled::help::NAME, bundled::help::create)
            .with(bundled::greet::NAME, bundled::greet::create)
            .with(bundled::source::NAME, bundled::source::create)
            .with(bundled::restart::NAME, bundled::restart::create)
            .with(bundled::shutdown::NAME, bundled::shutdown::create)
            .with(bundled::chatter::NAME, bundled::chatter::create)
    }

    /// Optional plugins, loaded when named in `enabled_plugins`.
    #[must_use]
    pub fn bundled() -> Self {
        Self::new()
            .with(bundled::excuses::NAME, bundled::excuses::create)
            .with(bundled::announce::NAME, bundled::announce::create)
    }

    pub fn get(&self, name: &str) -> Option<PluginConstructor> {
        self.entries
            .iter()
            .find(|(n, _)| *n == name)
            .map(|(_, ctor)| *ctor)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.entries.iter().map(|(name, _)| *name)
    }
}

/// Construct, set up and register every builtin, then every plugin named in
/// `enabled_plugins`, in configured order. Publishes the help index to the
/// host once all plugins are in.
pub async fn load_plugins(
    host: &PluginHost,
    builtins: &PluginCatalog,
    catalog: &PluginCatalog,
) -> Result<HookRegistry> {
    let mut registry = HookRegistry::new();

    for (name, constructor) in &builtins.entries {
        load_one(host, &mut registry, name, *constructor).await?;
    }

    for name in &host.config().enabled_plugins {
        let constructor = catalog
            .get(name)
            .ok_or_else(|| Error::unknown_plugin(name))?;
        if registry.contains(name) {
            warn!(plugin = %name, "plugin listed twice, skipping");
            continue;
        }
        load_one(host, &mut registry, name, constructor).await?;
    }

    host.publish_help(registry.help_index());
    info!(
        plugins = registry.plugin_names().len(),
        commands = registry.commands().len(),
        "plugins loaded"
    );
    Ok(registry)
}

async fn load_one(
    host: &PluginHost,
    registry: &mut HookRegistry,
    name: &str,
    constructor: PluginConstructor,
) -> Result<()> {
    debug!(plugin = name, "loading plugin");
    let mut plugin = constructor(host.scope(name));
    plugin
        .setup()
        .await
        .map_err(|e| Error::setup(name, &e))?;
    registry.register(name, Arc::from(plugin))
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{PluginScope, host::tests::host_with, plugin::PluginManifest},
        async_trait::async_trait,
        cibot_config::BotConfig,
    };

    struct Broken;

    #[async_trait]
    impl Plugin for Broken {
        async fn setup(&mut self) -> anyhow::Result<()> {
            anyhow::bail!("missing credentials")
        }
    }

    struct BadTrigger;

    impl Plugin for BadTrigger {
        fn manifest(&self) -> PluginManifest {
            PluginManifest::new().trigger("[")
        }
    }

    fn broken(_: PluginScope) -> Box<dyn Plugin> {
        Box::new(Broken)
    }

    fn bad_trigger(_: PluginScope) -> Box<dyn Plugin> {
        Box::new(BadTrigger)
    }

    fn config(enabled: &[&str]) -> BotConfig {
        BotConfig {
            enabled_plugins: enabled.iter().map(|s| s.to_string()).collect(),
            ..BotConfig::default()
        }
    }

    #[tokio::test]
    async fn builtins_load_first_then_enabled_in_order() {
        let (host, _) = host_with(config(&["excuses"]));
        let registry = load_plugins(&host, &PluginCatalog::builtins(), &PluginCatalog::bundled())
            .await
            .unwrap();
        assert_eq!(registry.plugin_names(), &[
            "help", "greet", "source", "restart", "shutdown", "chatter", "excuses"
        ]);
        assert!(registry.resolve_command("excuse").is_some());
        assert!(host.scope("help").help().unwrap().commands.contains(&"list".to_string()));
    }

    #[tokio::test]
    async fn unknown_enabled_plugin_is_fatal() {
        let (host, _) = host_with(config(&["jenkins"]));
        let err = load_plugins(&host, &PluginCatalog::builtins(), &PluginCatalog::bundled())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::UnknownPlugin { ref name } if name == "jenkins"));
    }

    #[tokio::test]
    async fn setup_failure_is_fatal() {
        let (host, _) = host_with(config(&["broken"]));
        let catalog = PluginCatalog::new().with("broken", broken);
        let err = load_plugins(&host, &PluginCatalog::new(), &catalog)
            .await
            .err()
            .unwrap();
        assert!(err.to_string().contains("missing credentials"));
    }

    #[tokio::test]
    async fn bad_trigger_is_fatal() {
        let (host, _) = host_with(config(&["bad"]));
        let catalog = PluginCatalog::new().with("bad", bad_trigger);
        let err = load_plugins(&host, &PluginCatalog::new(), &catalog)
            .await
            .err()
            .unwrap();
        assert!(matches!(err, Error::InvalidTrigger { .. }));
    }

    #[tokio::test]
    async fn duplicate_enabled_entry_loads_once() {
        let (host, _) = host_with(config(&["excuses", "excuses"]));
        let registry = load_plugins(&host, &PluginCatalog::new(), &PluginCatalog::bundled())
            .await
            .unwrap();
        assert_eq!(registry.plugin_names(), &["excuses"]);
    }

    #[test]
    fn with_replaces_in_place() {
        let catalog = PluginCatalog::builtins().with("help", broken);
        assert_eq!(catalog.names().next(), Some("help"));
        assert_eq!(catalog.names().count(), 5);
    }
}
