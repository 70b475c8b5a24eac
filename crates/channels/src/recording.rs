//! Outbound that records every call instead of talking to a platform.

use std::sync::{
    Mutex,
    atomic::{AtomicUsize, Ordering},
};

use {async_trait::async_trait, tracing::debug};

use crate::{Attachment, ChannelOutbound, Error, Result};

/// One recorded outbound call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sent {
    Message {
        channel: String,
        text: String,
        attachments: Vec<Attachment>,
        as_action: bool,
    },
    File {
        channel: String,
        title: String,
        filetype: String,
        content: String,
    },
}

impl Sent {
    pub fn channel(&self) -> &str {
        match self {
            Self::Message { channel, .. } | Self::File { channel, .. } => channel,
        }
    }

    /// Message text, or the file title for uploads.
    pub fn text(&self) -> &str {
        match self {
            Self::Message { text, .. } => text,
            Self::File { title, .. } => title,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
enum FailMode {
    #[default]
    Never,
    Always,
    /// Only the nth attempt, counting from one.
    Nth(usize),
}

#[derive(Default)]
pub struct RecordingOutbound {
    sent: Mutex<Vec<Sent>>,
    attempts: AtomicUsize,
    fail: FailMode,
}

impl RecordingOutbound {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// An outbound whose every send fails with [`Error::Unavailable`].
    #[must_use]
    pub fn failing() -> Self {
        Self {
            fail: FailMode::Always,
            ..Self::default()
        }
    }

    /// An outbound whose `n`th send (counting from one) fails. Every other
    /// send is recorded.
    #[must_use]
    pub fn failing_nth(n: usize) -> Self {
        Self {
            fail: FailMode::Nth(n),
            ..Self::default()
        }
    }

    pub fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Texts of the recorded messages, in send order.
    pub fn texts(&self) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Message { text, .. } => Some(text),
                Sent::File { .. } => None,
            })
            .collect()
    }

    /// Drains the recorded calls.
    pub fn take(&self) -> Vec<Sent> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(|e| e.into_inner()))
    }

    fn record(&self, sent: Sent) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        let fail = match self.fail {
            FailMode::Never => false,
            FailMode::Always => true,
            FailMode::Nth(n) => attempt == n,
        };
        if fail {
            return Err(Error::unavailable(format!(
                "recording outbound set to fail on attempt {attempt}"
            )));
        }
        debug!(channel = sent.channel(), text = sent.text(), "recorded outbound call");
        self.sent
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(sent);
        Ok(())
    }
}

#[async_trait]
impl ChannelOutbound for RecordingOutbound {
    async fn send_message(
        &self,
        channel: &str,
        text: &str,
        attachments: &[Attachment],
        as_action: bool,
    ) -> Result<()> {
        self.record(Sent::Message {
            channel: channel.to_string(),
            text: text.to_string(),
            attachments: attachments.to_vec(),
            as_action,
        })
    }

    async fn send_file(
        &self,
        channel: &str,
        title: &str,
        filetype: &str,
        content: &str,
    ) -> Result<Option<String>> {
        self.record(Sent::File {
            channel: channel.to_string(),
            title: title.to_string(),
            filetype: filetype.to_string(),
            content: content.to_string(),
        })?;
        Ok(Some(format!("F{}", self.sent().len())))
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn records_in_send_order() {
        let out = RecordingOutbound::new();
        out.send_text("C1", "a").await.unwrap();
        out.send_message("C1", "b", &[Attachment::titled("t")], true)
            .await
            .unwrap();
        let id = out.send_file("C1", "log", "text", "x").await.unwrap();
        assert_eq!(id.as_deref(), Some("F3"));
        assert_eq!(out.texts(), vec!["a", "b"]);
        assert_eq!(out.take().len(), 3);
        assert!(out.sent().is_empty());
    }

    #[tokio::test]
    async fn failing_outbound_records_nothing() {
        let out = RecordingOutbound::failing();
        assert!(out.send_text("C1", "a").await.is_err());
        assert!(out.sent().is_empty());
    }

    #[tokio::test]
    async fn nth_failure_only_drops_that_send() {
        let out = RecordingOutbound::failing_nth(2);
        out.send_text("C1", "a").await.unwrap();
        assert!(out.send_text("C1", "b").await.is_err());
        out.send_text("C1", "c").await.unwrap();
        assert_eq!(out.texts(), vec!["a", "c"]);
    }
}
