//! Key-value persistence for plugins.
//!
//! Values are JSON, grouped by subject (the owning plugin's name). Plugins
//! only ever see a [`ScopedStore`] bound to their own subject.

pub mod error;
pub mod memory;
pub mod scoped;
pub mod store;

pub use {
    error::{Error, Result},
    memory::MemoryStore,
    scoped::ScopedStore,
    store::KvStore,
};
