use thiserror::Error;

/// Failures surfaced by the external collaborators (store, metadata API, identity)
#[derive(Debug, Error)]
pub enum SourceError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not authenticated: {0}")]
    Unauthenticated(String),

    #[error("{0}")]
    Other(String),
}

impl SourceError {
    pub fn new(message: impl Into<String>) -> Self {
        SourceError::Other(message.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, SourceError::NotFound(_)) || matches!(self, SourceError::Api { status: 404, .. })
    }
}

pub type SourceResult<T> = std::result::Result<T, SourceError>;
