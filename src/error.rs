use thiserror::Error;

/// Error taxonomy for the chat backend.
///
/// `Validation` and `NotFound` carry caller-facing detail; the rest are
/// logged in full and surfaced to clients as generic messages.
#[derive(Error, Debug)]
pub enum ServiceError {
    /// Bad client input (empty message).
    #[error("{0}")]
    Validation(String),

    /// Unknown conversation id.
    #[error("Conversation '{0}' not found")]
    NotFound(String),

    /// Completion provider call failed or returned unusable content.
    #[error("Completion provider error: {0}")]
    Upstream(String),

    /// Reading or writing the history document failed.
    #[error("History persistence error: {0}")]
    Persistence(String),

    /// Invalid configuration detected at startup.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<reqwest::Error> for ServiceError {
    fn from(err: reqwest::Error) -> Self {
        ServiceError::Upstream(err.to_string())
    }
}
