//! Link to the bot's source code, on `source` or "show me your source".

use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::Sender,
};

use crate::{CommandHandler, Plugin, PluginManifest, PluginScope, Response, TriggerHandler};

pub const NAME: &str = "source";

pub struct SourcePlugin {
    url: String,
}

pub fn create(scope: PluginScope) -> Box<dyn Plugin> {
    let url = scope
        .config()
        .get_str("url")
        .unwrap_or(env!("CARGO_PKG_REPOSITORY"))
        .to_string();
    Box::new(SourcePlugin { url })
}

impl SourcePlugin {
    fn reply(&self) -> Response {
        format!("View my source @ {}", self.url).into()
    }
}

impl Plugin for SourcePlugin {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::new()
            .hook("source")
            .trigger("show me your source")
            .help("source", "source - Sends link to the bot source code")
    }

    fn command(&self) -> Option<&dyn CommandHandler> {
        Some(self)
    }

    fn trigger(&self) -> Option<&dyn TriggerHandler> {
        Some(self)
    }
}

#[async_trait]
impl CommandHandler for SourcePlugin {
    async fn handle_command(
        &self,
        _channel: &str,
        _user: &Sender,
        _command: &str,
        _words: &[String],
    ) -> Result<Response> {
        Ok(self.reply())
    }
}

#[async_trait]
impl TriggerHandler for SourcePlugin {
    async fn handle_trigger(
        &self,
        _channel: &str,
        _user: &Sender,
        _words: &[String],
    ) -> Result<Response> {
        Ok(self.reply())
    }
}
