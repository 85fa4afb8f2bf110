//! Error types

/// Storage errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Stored blob failed to deserialize
    #[error("Corrupt stored value: {0}")]
    Corrupt(String),
}

impl From<Error> for solvault_core::Error {
    fn from(err: Error) -> Self {
        match err {
            // A vault blob that no longer parses is indistinguishable
            // from one that no longer authenticates
            Error::Corrupt(_) => solvault_core::Error::DecryptionFailed,
            Error::Database(e) => solvault_core::Error::Storage(e.to_string()),
        }
    }
}

/// Result type
pub type Result<T> = std::result::Result<T, Error>;
