//! Session error types.

use guidepost_executor::ExecutorError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The page could not be captured.
    #[error("Context capture failed: {0}")]
    Context(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Reasoning service returned {status}: {message}")]
    Api { status: u16, message: String },

    /// The reasoning reply held no parseable step.
    #[error("Malformed reasoning reply: {0}")]
    MalformedReply(String),

    #[error(transparent)]
    Executor(#[from] ExecutorError),
}

impl From<reqwest::Error> for SessionError {
    fn from(e: reqwest::Error) -> Self {
        SessionError::Network(e.to_string())
    }
}
