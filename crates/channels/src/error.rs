/// Errors a transport reports back from an outbound call.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The platform answered but refused the call.
    #[error("platform rejected {method}: {reason}")]
    Rejected { method: String, reason: String },

    /// Not connected yet, or already shutting down.
    #[error("transport unavailable: {message}")]
    Unavailable { message: String },
}

impl Error {
    #[must_use]
    pub fn rejected(method: impl Into<String>, reason: impl std::fmt::Display) -> Self {
        Self::Rejected {
            method: method.into(),
            reason: reason.to_string(),
        }
    }

    #[must_use]
    pub fn unavailable(message: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            message: message.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
