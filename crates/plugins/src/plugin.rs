use {
    anyhow::Result,
    async_trait::async_trait,
    cibot_channels::Sender,
    cibot_contexts::Context,
};

// ── Responses ───────────────────────────────────────────────────────────────

/// What a handler wants sent back to the originating channel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Response {
    #[default]
    None,
    Text(String),
    /// Sent one by one, in order.
    Many(Vec<String>),
}

impl Response {
    pub fn into_messages(self) -> Vec<String> {
        match self {
            Self::None => Vec::new(),
            Self::Text(text) => vec![text],
            Self::Many(texts) => texts,
        }
    }

    pub fn is_none(&self) -> bool {
        matches!(self, Self::None)
    }
}

impl From<String> for Response {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for Response {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<Vec<String>> for Response {
    fn from(texts: Vec<String>) -> Self {
        Self::Many(texts)
    }
}

impl<T: Into<Response>> From<Option<T>> for Response {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::None, Into::into)
    }
}

// ── Manifest ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelpEntry {
    pub command: String,
    pub text: String,
}

/// Hooks, trigger patterns and help pages a plugin declares.
#[derive(Debug, Clone, Default)]
pub struct PluginManifest {
    pub hooks: Vec<String>,
    /// Regular expressions, matched case-insensitively anywhere in a message.
    pub trigger_patterns: Vec<String>,
    pub help: Vec<HelpEntry>,
}

impl PluginManifest {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn hook(mut self, command: impl Into<String>) -> Self {
        self.hooks.push(command.into());
        self
    }

    #[must_use]
    pub fn trigger(mut self, pattern: impl Into<String>) -> Self {
        self.trigger_patterns.push(pattern.into());
        self
    }

    #[must_use]
    pub fn help(mut self, command: impl Into<String>, text: impl Into<String>) -> Self {
        self.help.push(HelpEntry {
            command: command.into(),
            text: text.into(),
        });
        self
    }
}

// ── Plugin traits ───────────────────────────────────────────────────────────

/// A unit of bot behaviour. Built once by its catalog constructor, set up
/// once, then shared for the life of the process.
///
/// Capabilities are optional: a plugin returns `Some(self)` from the
/// accessors it supports.
#[async_trait]
pub trait Plugin: Send + Sync {
    fn manifest(&self) -> PluginManifest {
        PluginManifest::default()
    }

    /// Runs once, before the plugin can receive events. An error aborts
    /// startup.
    async fn setup(&mut self) -> Result<()> {
        Ok(())
    }

    fn command(&self) -> Option<&dyn CommandHandler> {
        None
    }

    fn trigger(&self) -> Option<&dyn TriggerHandler> {
        None
    }

    fn context(&self) -> Option<&dyn ContextHandler> {
        None
    }
}

/// Handles `<prefix><command> words...` messages for the plugin's hooks.
///
/// Also receives mentions when the plugin is the mention catch-all, with an
/// empty `command`.
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle_command(
        &self,
        channel: &str,
        user: &Sender,
        command: &str,
        words: &[String],
    ) -> Result<Response>;
}

/// Handles free-form messages matching one of the plugin's trigger patterns.
#[async_trait]
pub trait TriggerHandler: Send + Sync {
    async fn handle_trigger(
        &self,
        channel: &str,
        user: &Sender,
        words: &[String],
    ) -> Result<Response>;
}

/// Handles follow-up messages inside a context the plugin opened.
///
/// Runs while the context lock is held: implementations must not call back
/// into the context manager.
#[async_trait]
pub trait ContextHandler: Send + Sync {
    async fn handle_context(
        &self,
        channel: &str,
        user: &Sender,
        ctx: &mut Context,
        words: &[String],
    ) -> Result<Response>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_conversions() {
        assert_eq!(Response::from("a").into_messages(), vec!["a"]);
        assert_eq!(
            Response::from(vec!["a".to_string(), "b".to_string()]).into_messages(),
            vec!["a", "b"]
        );
        assert!(Response::from(None::<String>).is_none());
        assert!(Response::None.into_messages().is_empty());
    }
}
