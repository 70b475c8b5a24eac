//! Routes inbound chat events to plugins.
//!
//! [`DispatchEngine`] classifies one event at a time (command, active
//! context, trigger phrase, mention) and invokes the single owning plugin
//! inside an error and panic boundary. [`Bot`] wires config, store,
//! contexts and plugins together and drives the engine from a transport.

pub mod bot;
pub mod engine;
pub mod error;

pub use {
    bot::{Bot, BotOptions, Exit, RunningBot},
    engine::{APOLOGY, DispatchEngine, Route},
    error::{Error, Result},
};
