//! `shutdown`: says goodbye and raises the shutdown signal.

use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::Sender,
    tracing::{info, warn},
};

use crate::{CommandHandler, Plugin, PluginManifest, PluginScope, Response};

pub const NAME: &str = "shutdown";

pub struct ShutdownPlugin {
    scope: PluginScope,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    Box::new(ShutdownPlugin { scope })
}

impl Plugin for ShutdownPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new()
            .hook("shutdown")
            .help("shutdown", "shutdown - Shuts the bot down")
    }

    fn command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for ShutdownPlugin {
    async fn handle_command(
        &self,
        channel: &str,
        user: &Sender,
        _command: &str,
        _words: &[String],
    ) -> Result<Response> {
        if !self.scope.is_admin(user) {
            warn!(channel, user = %user.id, "shutdown refused for non-admin");
            return Ok("Sorry, only admins can do that.".into());
        }
        info!(channel, user = %user.id, "shutdown requested");
        // The dispatch loop stops after this event, so the reply still goes out.
        self.scope.lifecycle().shutdown();
        Ok("Bye!".into())
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::host::tests::host_with, cibot_config::BotConfig};

    async fn run(config: BotConfig, user: &str) -> (Response, bool) {
        let (host, _) = host_with(config);
        let plugin = create(host.scope(NAME));
        let reply = plugin
            .command()
            .unwrap()
            .handle_command("C1", &Sender::new(user), "shutdown", &[])
            .await
            .unwrap();
        (reply, host.lifecycle().is_running())
    }

    #[tokio::test]
    async fn anyone_may_stop_without_admin_list() {
        let (reply, running) = run(BotConfig::default(), "U1").await;
        assert_eq!(reply, "Bye!".into());
        assert!(!running);
    }

    #[tokio::test]
    async fn non_admin_is_refused() {
        let config = BotConfig {
            admins: vec!["UADMIN".into()],
            ..BotConfig::default()
        };
        let (reply, running) = run(config.clone(), "U1").await;
        assert_eq!(reply, "Sorry, only admins can do that.".into());
        assert!(running);

        let (reply, running) = run(config, "uadmin").await;
        assert_eq!(reply, "Bye!".into());
        assert!(!running);
    }
}
