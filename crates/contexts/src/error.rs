use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The (user, channel) pair already has a live context.
    #[error("user {user} already has an active '{owner}' context in {channel}")]
    AlreadyActive {
        owner: String,
        channel: String,
        user: String,
    },

    /// Called from plugin code that runs while this task holds the lock.
    #[error("context manager called while the context lock is held by this handler")]
    Reentrant,
}

impl Error {
    #[must_use]
    pub fn already_active(
        owner: impl Into<String>,
        channel: impl Into<String>,
        user: impl Into<String>,
    ) -> Self {
        Self::AlreadyActive {
            owner: owner.into(),
            channel: channel.into(),
            user: user.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
