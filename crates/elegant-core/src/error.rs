//! Error types for elegant-core

use thiserror::Error;

/// Result type alias using elegant-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in elegant-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// An operation needing a signed-in user was invoked without one
    #[error("You must be signed in to share notes.")]
    AuthRequired,

    /// Note (local or remote) not found
    #[error("Note not found: {0}")]
    NotFound(String),

    /// Remote backend or transport failure
    #[error("Remote error: {0}")]
    Remote(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error means the remote entity does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

impl From<reqwest::Error> for Error {
    fn from(error: reqwest::Error) -> Self {
        Self::Remote(error.to_string())
    }
}
