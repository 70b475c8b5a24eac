//! `list` and `help <command>`.

use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::Sender,
};

use crate::{CommandHandler, Plugin, PluginManifest, PluginScope, Response};

pub const NAME: &str = "help";

const NO_PAGE: &str = "I don't have a help page for that command";

pub struct HelpPlugin {
    scope: PluginScope,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    Box::new(HelpPlugin { scope })
}

impl HelpPlugin {
    fn list(&self) -> String {
        let commands = self
            .scope
            .help()
            .map(|index| {
                index
                    .commands
                    .iter()
                    .map(|c| format!("`{c}`"))
                    .collect::<Vec<_>>()
                    .join(", ")
            })
            .unwrap_or_default();
        format!("Loaded commands: {commands}")
    }

    fn help(&self, words: &[String]) -> String {
        let Some(command) = words.first() else {
            return self.scope.help_for(NAME).unwrap_or_else(|| NO_PAGE.into());
        };
        let command = command.trim_start_matches(self.scope.bot_config().command_trigger.as_str());
        self.scope
            .help_for(command)
            .unwrap_or_else(|| NO_PAGE.into())
    }
}

impl Plugin for HelpPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new()
            .hook("list")
            .hook("help")
            .help("list", "list - Lists registered hook commands")
            .help("help", "help <command> - Prints help for a command")
    }

    fn command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for HelpPlugin {
    async fn handle_command(
        &self,
        _channel: &str,
        _user: &Sender,
        command: &str,
        words: &[String],
    ) -> Result<Response> {
        Ok(match command {
            "list" => self.list().into(),
            "help" => self.help(words).into(),
            _ => Response::None,
        })
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::{host::tests::host_with, registry::HookRegistry},
        cibot_config::BotConfig,
        std::sync::Arc,
    };

    async fn run(command: &str, words: &[&str]) -> Response {
        let (host, _) = host_with(BotConfig::default());
        let plugin: Arc<dyn Plugin> = Arc::from(create(host.scope(NAME)));
        let mut registry = HookRegistry::new();
        registry.register(NAME, Arc::clone(&plugin)).unwrap();
        host.publish_help(registry.help_index());

        let words: Vec<String> = words.iter().map(|w| w.to_string()).collect();
        plugin
            .command()
            .unwrap()
            .handle_command("C1", &Sender::new("U1"), command, &words)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn list_shows_commands() {
        assert_eq!(run("list", &[]).await, "Loaded commands: `list`, `help`".into());
    }

    #[tokio::test]
    async fn help_without_argument_explains_itself() {
        assert_eq!(
            run("help", &[]).await,
            "help <command> - Prints help for a command".into()
        );
    }

    #[tokio::test]
    async fn help_accepts_prefixed_command() {
        assert_eq!(
            run("help", &["!list"]).await,
            "list - Lists registered hook commands".into()
        );
        assert_eq!(run("help", &["nope"]).await, NO_PAGE.into());
    }
}
