//! `restart`: stops the bot and has it bootstrapped again from a freshly
//! loaded config.

use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::Sender,
    tracing::{info, warn},
};

use crate::{CommandHandler, Plugin, PluginManifest, PluginScope, Response};

pub const NAME: &str = "restart";

pub struct RestartPlugin {
    scope: PluginScope,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    Box::new(RestartPlugin { scope })
}

impl Plugin for RestartPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new()
            .hook("restart")
            .help("restart", "restart - Reboots the bot")
    }

    fn command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for RestartPlugin {
    async fn handle_command(
        &self,
        channel: &str,
        user: &Sender,
        _command: &str,
        _words: &[String],
    ) -> Result<Response> {
        if !self.scope.is_admin(user) {
            warn!(channel, user = %user.id, "restart refused for non-admin");
            return Ok("Sorry, only admins can do that.".into());
        }
        info!(channel, user = %user.id, "restart requested");
        self.scope.lifecycle().request_restart();
        Ok("Be back in a bit!".into())
    }
}
