use std::{collections::HashMap, time::Duration};

use {serde_json::Value, tokio::time::Instant};

/// Message sent to the channel when a context times out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeoutNotice {
    pub text: String,
    /// Send as an emote rather than a plain message.
    pub as_action: bool,
}

/// Optional settings for a new context.
#[derive(Debug, Clone, Default)]
pub struct ContextOptions {
    pub(crate) timeout: Option<Duration>,
    pub(crate) history: Vec<Vec<String>>,
    pub(crate) values: HashMap<String, Value>,
    pub(crate) timeout_notice: Option<TimeoutNotice>,
}

impl ContextOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lifetime of the context. Falls back to the manager's default.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    #[must_use]
    pub fn with_history(mut self, history: Vec<Vec<String>>) -> Self {
        self.history = history;
        self
    }

    #[must_use]
    pub fn with_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn with_timeout_message(mut self, text: impl Into<String>, as_action: bool) -> Self {
        self.timeout_notice = Some(TimeoutNotice {
            text: text.into(),
            as_action,
        });
        self
    }
}

/// One in-flight exchange between a plugin and a user in a channel.
///
/// The deadline is fixed at creation and never extended. `finished` is a
/// one-way latch.
#[derive(Debug, Clone)]
pub struct Context {
    owner: String,
    channel: String,
    user_id: String,
    created_at: Instant,
    expires_at: Instant,
    finished: bool,
    history: Vec<Vec<String>>,
    values: HashMap<String, Value>,
    timeout_notice: Option<TimeoutNotice>,
}

impl Context {
    pub(crate) fn new(
        owner: &str,
        channel: &str,
        user_id: &str,
        default_timeout: Duration,
        opts: ContextOptions,
    ) -> Self {
        let created_at = Instant::now();
        let timeout = opts.timeout.unwrap_or(default_timeout);
        Self {
            owner: owner.to_string(),
            channel: channel.to_string(),
            user_id: user_id.to_string(),
            created_at,
            expires_at: created_at + timeout,
            finished: false,
            history: opts.history,
            values: opts.values,
            timeout_notice: opts.timeout_notice,
        }
    }

    /// Name of the plugin that opened the context.
    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn expires_at(&self) -> Instant {
        self.expires_at
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get_all(&self) -> &HashMap<String, Value> {
        &self.values
    }

    /// Mark the exchange as complete. The sweep removes it without notice.
    pub fn finish(&mut self) {
        self.finished = true;
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Neither finished nor expired.
    pub fn is_active(&self) -> bool {
        !self.finished && !self.is_expired()
    }

    pub fn set_timeout_message(&mut self, text: impl Into<String>, as_action: bool) {
        self.timeout_notice = Some(TimeoutNotice {
            text: text.into(),
            as_action,
        });
    }

    pub fn timeout_notice(&self) -> Option<&TimeoutNotice> {
        self.timeout_notice.as_ref()
    }

    /// Word sequences received while the context was active, oldest first.
    pub fn history(&self) -> &[Vec<String>] {
        &self.history
    }

    pub fn push_history(&mut self, words: Vec<String>) {
        self.history.push(words);
    }
}
