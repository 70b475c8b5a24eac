//! Metric names for cibot.
//!
//! Crates record through the `metrics` facade behind their own `metrics`
//! feature. Nothing is exported unless the embedding binary installs a
//! recorder.
//!
//! ```rust,ignore
//! use cibot_metrics::{counter, dispatch};
//!
//! counter!(dispatch::EVENTS_TOTAL, "route" => "command").increment(1);
//! ```

mod definitions;

pub use definitions::*;

pub use metrics::{counter, gauge, histogram};
