//! Error types for calapp.

use thiserror::Error;

/// Errors that can occur in calapp operations.
///
/// The first four variants come back from the remote gateways; the rest are
/// raised locally before any request is made.
#[derive(Error, Debug)]
pub enum CalAppError {
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Could not save changes: {0}")]
    Persistence(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Not signed in")]
    NotAuthenticated,

    #[error("No event selected")]
    NoActiveEvent,

    #[error("Event not found: {0}")]
    UnknownEvent(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid date '{0}'")]
    InvalidDate(String),
}

impl CalAppError {
    /// Short message meant to be shown to the user as-is.
    ///
    /// Gateway failures surface the server-provided text without the
    /// category prefix.
    pub fn user_message(&self) -> String {
        match self {
            CalAppError::Authentication(msg)
            | CalAppError::Validation(msg)
            | CalAppError::Persistence(msg)
            | CalAppError::Network(msg) => msg.clone(),
            other => other.to_string(),
        }
    }

    /// Whether the error came back from a remote gateway.
    pub fn is_gateway_failure(&self) -> bool {
        matches!(
            self,
            CalAppError::Authentication(_)
                | CalAppError::Validation(_)
                | CalAppError::Persistence(_)
                | CalAppError::Network(_)
        )
    }
}

impl From<reqwest::Error> for CalAppError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            CalAppError::Serialization(err.to_string())
        } else {
            CalAppError::Network(err.to_string())
        }
    }
}

impl From<toml::de::Error> for CalAppError {
    fn from(err: toml::de::Error) -> Self {
        CalAppError::Storage(err.to_string())
    }
}

impl From<toml::ser::Error> for CalAppError {
    fn from(err: toml::ser::Error) -> Self {
        CalAppError::Storage(err.to_string())
    }
}

/// Result type alias for calapp operations.
pub type CalAppResult<T> = Result<T, CalAppError>;
