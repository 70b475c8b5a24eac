//! Plugin contract, hook registry and loader.
//!
//! Plugins are built from a static [`PluginCatalog`] at startup. Each gets a
//! [`PluginScope`] exposing its config namespace, store subject, the context
//! manager, the outbound transport and the process lifecycle. Capabilities
//! (command, trigger, context) are optional accessors on [`Plugin`].

pub mod bundled;
pub mod catalog;
pub mod error;
pub mod host;
mod loops;
pub mod plugin;
pub mod registry;

pub use {
    catalog::{PluginCatalog, PluginConstructor, load_plugins},
    error::{Error, Result},
    host::{PluginHost, PluginScope},
    plugin::{
        CommandHandler, ContextHandler, HelpEntry, Plugin, PluginManifest, Response,
        TriggerHandler,
    },
    registry::{HelpIndex, HookRegistry},
};
