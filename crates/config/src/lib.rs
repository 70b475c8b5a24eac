//! Configuration loading, env substitution, validation and per-plugin views.
//!
//! Config files: `cibot.yaml`, `cibot.yml`, `cibot.toml` or `cibot.json`.
//! Searched in `./` then `~/.config/cibot/`.
//!
//! Supports `${ENV_VAR}` and `${ENV_VAR:-default}` substitution in the raw
//! file before parsing.

pub mod env_subst;
pub mod error;
pub mod loader;
pub mod schema;
pub mod scoped;
pub mod validate;

pub use {
    error::{Error, Result},
    loader::{
        config_dir, data_dir, discover_and_load, find_config_file, load_config, parse_config,
    },
    schema::{BotConfig, ContextsConfig, DbConfig, LoggingConfig, MemoryDbConfig},
    scoped::PluginConfig,
    validate::{Diagnostic, Severity, ValidationResult, validate},
};
