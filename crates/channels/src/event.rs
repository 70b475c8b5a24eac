use serde::{Deserialize, Serialize};

/// Author of an inbound message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sender {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl Sender {
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    #[must_use]
    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = Some(name.into());
        self
    }

    /// Display name when known, otherwise the raw id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }
}

/// One decoded message event as delivered by the transport.
///
/// Channel and text are optional because platforms emit message events
/// without them (edits, joins, bot echoes); dispatch filters those out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundEvent {
    #[serde(default)]
    pub channel: Option<String>,
    pub sender: Sender,
    #[serde(default)]
    pub text: Option<String>,
}

impl InboundEvent {
    #[must_use]
    pub fn new(channel: impl Into<String>, sender: Sender, text: impl Into<String>) -> Self {
        Self {
            channel: Some(channel.into()),
            sender,
            text: Some(text.into()),
        }
    }
}

/// The bot's own account on the platform, known once the transport is ready.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BotIdentity {
    pub id: String,
    pub name: String,
}

impl BotIdentity {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }

    /// Token the platform substitutes for `@name` in message text.
    pub fn mention(&self) -> String {
        crate::handle::mention_token(&self.id)
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_decodes_without_text() {
        let ev: InboundEvent =
            serde_json::from_str(r#"{"channel": "C1", "sender": {"id": "U1"}}"#).unwrap();
        assert_eq!(ev.channel.as_deref(), Some("C1"));
        assert!(ev.text.is_none());
        assert_eq!(ev.sender.label(), "U1");
    }

    #[test]
    fn identity_mention_token() {
        assert_eq!(BotIdentity::new("B42", "cibot").mention(), "<@B42>");
    }
}
