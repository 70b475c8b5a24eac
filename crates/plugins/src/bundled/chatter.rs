//! Default catch-all for messages that mention the bot.

use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::Sender,
};

use crate::{CommandHandler, Plugin, PluginScope, Response};

pub const NAME: &str = "chatter";

pub struct ChatterPlugin {
    command_trigger: String,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    Box::new(ChatterPlugin {
        command_trigger: scope.bot_config().command_trigger.clone(),
    })
}

impl Plugin for ChatterPlugin {
    fn command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for ChatterPlugin {
    async fn handle_command(
        &self,
        _channel: &str,
        _user: &Sender,
        _command: &str,
        words: &[String],
    ) -> Result<Response> {
        let message = words.join(" ");
        if message.contains("joined the group") || message.contains("joined the channel") {
            return Ok("Hello there!".into());
        }
        if message.starts_with("uploaded a file:") {
            return Ok(Response::None);
        }
        if message.trim().is_empty() {
            return Ok("You rang?".into());
        }
        Ok(format!(
            "I'm not much of a talker. Try `{}list` to see what I can do.",
            self.command_trigger
        )
        .into())
    }
}
