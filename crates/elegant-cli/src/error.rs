use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CliError {
    #[error(transparent)]
    Core(#[from] elegant_core::Error),
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
    #[error("Note content cannot be empty")]
    EmptyEditedContent,
    #[error("Note ID cannot be empty")]
    EmptyNoteId,
    #[error("Note not found for id/prefix: {0}")]
    NoteNotFound(String),
    #[error("{0}")]
    AmbiguousNoteId(String),
    #[error("Editor command failed: {0}")]
    EditorFailed(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Authentication error: {0}")]
    Auth(String),
    #[error(
        "Remote is not configured. Run `elegant config init --supabase-url <URL> --supabase-anon-key <KEY>` or set ELEGANT_SUPABASE_URL and ELEGANT_SUPABASE_ANON_KEY."
    )]
    RemoteNotConfigured,
}

impl From<elegant_core::auth::AuthError> for CliError {
    fn from(error: elegant_core::auth::AuthError) -> Self {
        Self::Auth(error.to_string())
    }
}
