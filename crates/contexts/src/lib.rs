//! Multi-turn conversation contexts.
//!
//! A [`Context`] ties one user in one channel to the plugin that opened it
//! until the plugin finishes it or its deadline passes. The
//! [`ContextManager`] owns every context, enforces one live context per
//! (user, channel) pair and runs the expiry sweep.

pub mod context;
pub mod error;
pub mod manager;
pub mod sweep;

pub use {
    context::{Context, ContextOptions, TimeoutNotice},
    error::{Error, Result},
    manager::{ContextGuard, ContextManager, DEFAULT_TIMEOUT, while_locked},
    sweep::SweepReport,
};
