//! Config schema types (identity, plugins, contexts, key-value store).
use std::{collections::HashMap, path::PathBuf};

use {
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

use crate::scoped::PluginConfig;

/// Root configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BotConfig {
    /// Name the bot account is registered under on the chat platform.
    pub bot_name: Option<String>,
    /// Platform API token.
    #[serde(
        serialize_with = "serialize_option_secret",
        skip_serializing_if = "Option::is_none"
    )]
    pub slack_token: Option<Secret<String>>,
    /// Prefix that turns the first word of a message into a command.
    /// An empty prefix disables command routing.
    pub command_trigger: String,
    /// User ids allowed to run privileged builtins (`shutdown`).
    /// Empty means everyone.
    pub admins: Vec<String>,
    /// Catalog plugins to load after the builtins, in this order.
    pub enabled_plugins: Vec<String>,
    /// Plugin that receives messages addressed to the bot by mention.
    pub mention_plugin: String,
    pub logging: LoggingConfig,
    pub contexts: ContextsConfig,
    pub db: DbConfig,
    /// Per-plugin settings, keyed by plugin name.
    pub plugins: HashMap<String, serde_json::Value>,
}

impl Default for BotConfig {
    fn default() -> Self {
        Self {
            bot_name: None,
            slack_token: None,
            command_trigger: "!".into(),
            admins: Vec::new(),
            enabled_plugins: Vec::new(),
            mention_plugin: "chatter".into(),
            logging: LoggingConfig::default(),
            contexts: ContextsConfig::default(),
            db: DbConfig::default(),
            plugins: HashMap::new(),
        }
    }
}

impl BotConfig {
    /// Read-only view of one plugin's namespace.
    pub fn plugin(&self, name: &str) -> PluginConfig {
        PluginConfig::new(name, self.plugins.get(name).cloned())
    }

    pub fn is_admin(&self, user_id: &str) -> bool {
        self.admins.is_empty()
            || self
                .admins
                .iter()
                .any(|admin| admin.eq_ignore_ascii_case(user_id))
    }

    pub fn token(&self) -> Option<&str> {
        self.slack_token
            .as_ref()
            .map(|t| t.expose_secret().as_str())
            .filter(|t| !t.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Lower the default log filter to `debug`.
    pub debug: bool,
}

/// Conversation context lifecycle settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextsConfig {
    /// Lifetime of a context when the plugin does not pick one. Defaults to 60.
    pub timeout_secs: u64,
    /// Period of the expiry sweep. Defaults to 5.
    pub sweep_interval_secs: u64,
}

impl Default for ContextsConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            sweep_interval_secs: 5,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    pub memory: MemoryDbConfig,
}

/// In-memory key-value store, optionally mirrored to a gzip'd JSON file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MemoryDbConfig {
    pub persistence: bool,
    /// Defaults to `<data dir>/db.json.gz` when persistence is on.
    pub db_path: Option<PathBuf>,
}

fn serialize_option_secret<S: serde::Serializer>(
    secret: &Option<Secret<String>>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(s) => serializer.serialize_some(s.expose_secret()),
        None => serializer.serialize_none(),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_apply_to_empty_yaml() {
        let cfg: BotConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(cfg.command_trigger, "!");
        assert_eq!(cfg.mention_plugin, "chatter");
        assert_eq!(cfg.contexts.timeout_secs, 60);
        assert_eq!(cfg.contexts.sweep_interval_secs, 5);
        assert!(!cfg.db.memory.persistence);
        assert!(cfg.token().is_none());
    }

    #[test]
    fn plugin_namespaces_are_kept_verbatim() {
        let cfg: BotConfig = serde_yaml::from_str(
            r#"
bot_name: cibot
slack_token: xoxb-123
plugins:
  reddit:
    subreddits: [rust, programming]
    channels: ["C01"]
"#,
        )
        .unwrap();
        assert_eq!(cfg.token(), Some("xoxb-123"));
        let reddit = cfg.plugin("reddit");
        assert_eq!(
            reddit.get("subreddits"),
            Some(&serde_json::json!(["rust", "programming"]))
        );
        assert!(cfg.plugin("jenkins").get_all().is_none());
    }

    #[test]
    fn admin_check_is_open_when_list_is_empty() {
        let mut cfg = BotConfig::default();
        assert!(cfg.is_admin("U1"));
        cfg.admins = vec!["U1".into()];
        assert!(cfg.is_admin("u1"));
        assert!(!cfg.is_admin("U2"));
    }

    #[test]
    fn token_is_not_serialized_when_absent() {
        let cfg = BotConfig::default();
        let yaml = serde_yaml::to_string(&cfg).unwrap();
        assert!(!yaml.contains("slack_token"));
    }
}
