//! Plugins shipped with the bot.
//!
//! `help`, `greet`, `source`, `restart`, `shutdown` and `chatter` are always
//! loaded; the rest are opt-in through `enabled_plugins`.

pub mod announce;
pub mod chatter;
pub mod excuses;
pub mod greet;
pub mod help;
pub mod restart;
pub mod shutdown;
pub mod source;
