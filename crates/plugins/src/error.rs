use thiserror::Error;

/// Plugin loading errors. All of them abort startup.
#[derive(Debug, Error)]
pub enum Error {
    #[error("plugin '{name}' is enabled but not in the catalog")]
    UnknownPlugin { name: String },

    #[error("plugin '{name}' is registered twice")]
    DuplicatePlugin { name: String },

    #[error("plugin '{plugin}' has an invalid trigger pattern '{pattern}': {source}")]
    InvalidTrigger {
        plugin: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("plugin '{plugin}' failed to set up: {reason}")]
    Setup { plugin: String, reason: String },
}

impl Error {
    #[must_use]
    pub fn unknown_plugin(name: impl Into<String>) -> Self {
        Self::UnknownPlugin { name: name.into() }
    }

    #[must_use]
    pub fn duplicate_plugin(name: impl Into<String>) -> Self {
        Self::DuplicatePlugin { name: name.into() }
    }

    #[must_use]
    pub fn invalid_trigger(
        plugin: impl Into<String>,
        pattern: impl Into<String>,
        source: regex::Error,
    ) -> Self {
        Self::InvalidTrigger {
            plugin: plugin.into(),
            pattern: pattern.into(),
            source,
        }
    }

    #[must_use]
    pub fn setup(plugin: impl Into<String>, source: &anyhow::Error) -> Self {
        Self::Setup {
            plugin: plugin.into(),
            reason: format!("{source:#}"),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
