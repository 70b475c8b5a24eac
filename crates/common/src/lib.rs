//! Pieces shared by every cibot crate: the error-context helper macro and
//! the process [`Lifecycle`].

pub mod error;
pub mod lifecycle;

pub use {error::FromMessage, lifecycle::Lifecycle};
