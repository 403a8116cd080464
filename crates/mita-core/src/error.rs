//! Error types for MITA

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// Caller-supplied data the engine cannot work with (e.g. non-positive income).
    /// The only error that is ever surfaced to engine callers.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// An optional collaborator failed or timed out
    #[error("Collaborator unavailable: {0}")]
    CollaboratorUnavailable(String),

    /// Allocation total is zero, negative or not finite
    #[error("Degenerate allocation: total {0}")]
    DegenerateAllocation(f64),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Whether this error must reach the caller rather than be absorbed by a fallback
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvalidInput(_))
    }
}

pub type Result<T> = std::result::Result<T, Error>;
