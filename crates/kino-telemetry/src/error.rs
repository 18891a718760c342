//! Error types for Kino Telemetry
//!
//! None of these reach the host through the session API: the normalizer
//! absorbs every failure and degrades to a no-op or a substitute value.
//! They exist so collaborators (identity storage, configuration loading)
//! can report *why* something fell back.

use thiserror::Error;

/// Result type alias for telemetry operations
pub type Result<T> = std::result::Result<T, Error>;

/// Telemetry error types
#[derive(Error, Debug)]
pub enum Error {
    // Identity errors
    #[error("Identity storage is unavailable")]
    StorageUnavailable,

    #[error("Identity storage failed: {0}")]
    Storage(String),

    // Configuration errors
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Create a storage error
    pub fn storage(msg: impl Into<String>) -> Self {
        Error::Storage(msg.into())
    }

    /// Returns the error code used in diagnostics
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::StorageUnavailable => "STORAGE_UNAVAILABLE",
            Error::Storage(_) => "STORAGE",
            Error::InvalidConfig(_) => "INVALID_CONFIG",
            Error::Json(_) => "JSON",
            Error::Io(_) => "IO",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::storage("x").error_code(), "STORAGE");
        assert_eq!(Error::StorageUnavailable.error_code(), "STORAGE_UNAVAILABLE");
        assert_eq!(Error::InvalidConfig("x".into()).error_code(), "INVALID_CONFIG");
    }
}
