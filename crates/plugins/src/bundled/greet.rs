//! `greet <@user>`. Without an argument it asks whom to greet and waits for
//! the answer in a context.

use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::{Sender, mention_token, sanitize_handle},
    cibot_contexts::{Context, ContextOptions},
    tracing::debug,
};

use crate::{CommandHandler, ContextHandler, Plugin, PluginManifest, PluginScope, Response};

pub const NAME: &str = "greet";

const QUESTION: &str = "Who should I greet?";

pub struct GreetPlugin {
    scope: PluginScope,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    Box::new(GreetPlugin { scope })
}

fn greeting(handle: &str) -> String {
    format!("Hiya {}, nice to meet you!", mention_token(&sanitize_handle(handle)))
}

impl Plugin for GreetPlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new()
            .hook("greet")
            .help("greet", "greet <@mention> - Greets a user by their name")
    }

    fn command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }

    fn context(&self) -> Option<&dyn ContextHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for GreetPlugin {
    async fn handle_command(
        &self,
        channel: &str,
        user: &Sender,
        _command: &str,
        words: &[String],
    ) -> Result<Response> {
        if let Some(target) = words.first() {
            return Ok(greeting(target).into());
        }

        let opts = ContextOptions::new().with_timeout_message("Never mind then.", false);
        match self.scope.new_context(channel, user, opts).await {
            Ok(_) => Ok(QUESTION.into()),
            Err(e) => {
                debug!(channel, user = %user.id, error = %e, "greet context not opened");
                Ok("Let's finish what we started first.".into())
            },
        }
    }
}

#[async_trait]
impl ContextHandler for GreetPlugin {
    async fn handle_context(
        &self,
        _channel: &str,
        _user: &Sender,
        ctx: &mut Context,
        words: &[String],
    ) -> Result<Response> {
        let Some(target) = words.first() else {
            return Ok(QUESTION.into());
        };
        ctx.finish();
        Ok(greeting(target).into())
    }
}
