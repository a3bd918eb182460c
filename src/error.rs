//! Error types for tango.

use thiserror::Error;

/// Crate-wide error type.
#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("config parse error: {0}")]
    ConfigParse(String),

    #[error("invalid config: {0}")]
    InvalidConfig(String),

    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },

    #[error("validation error: {0}")]
    Validation(String),

    #[error("notification failed: {0}")]
    Notify(String),

    #[error("home directory not found")]
    HomeDirNotFound,
}

// Any SQLite failure means the record store could not serve this cycle.
impl From<rusqlite::Error> for Error {
    fn from(e: rusqlite::Error) -> Self {
        Error::StoreUnavailable(e.to_string())
    }
}

impl Error {
    /// Malformed-record constructor, to keep call sites short.
    pub fn malformed(id: impl Into<String>, reason: impl Into<String>) -> Self {
        Error::MalformedRecord {
            id: id.into(),
            reason: reason.into(),
        }
    }
}
