//! Chat transport boundary.
//!
//! The transport delivers decoded [`InboundEvent`]s and exposes a
//! [`ChannelOutbound`] for replies. Platform wire protocols live outside
//! this workspace; [`recording::RecordingOutbound`] backs `cibot check`
//! and the tests.

pub mod error;
pub mod event;
pub mod handle;
pub mod outbound;
pub mod recording;

pub use {
    error::{Error, Result},
    event::{BotIdentity, InboundEvent, Sender},
    handle::{mention_token, sanitize_handle},
    outbound::{Attachment, AttachmentField, ChannelOutbound},
    recording::{RecordingOutbound, Sent},
};
