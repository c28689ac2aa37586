//! Error types for repopulse-core

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Main error type for the repopulse-core library
#[derive(Error, Debug)]
pub enum Error {
    /// Database error
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Token missing, malformed, or rejected by the API
    #[error("authentication failed: {0}")]
    Auth(String),

    /// Repository missing, or the token lacks traffic-read permission
    #[error("not found: {0}")]
    NotFound(String),

    /// API quota exhausted; further calls fail until the window resets
    #[error("rate limit exhausted, resets at {reset_at}")]
    RateLimited {
        /// When the quota window resets
        reset_at: DateTime<Utc>,
    },

    /// Request exceeded the configured timeout
    #[error("request timed out: {0}")]
    Timeout(String),

    /// Any other API transport or decode failure
    #[error("API error: {0}")]
    Api(String),
}

impl Error {
    /// Repo-scoped errors skip the current repository and let the run
    /// continue; everything else terminates the run.
    pub fn is_repo_scoped(&self) -> bool {
        matches!(self, Error::NotFound(_) | Error::Timeout(_) | Error::Api(_))
    }
}

/// Result type alias for repopulse-core
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repo_scoped_classification() {
        assert!(Error::NotFound("alice/alpha".to_string()).is_repo_scoped());
        assert!(Error::Timeout("deadline elapsed".to_string()).is_repo_scoped());
        assert!(Error::Api("500 internal".to_string()).is_repo_scoped());

        assert!(!Error::Auth("bad token".to_string()).is_repo_scoped());
        assert!(!Error::RateLimited {
            reset_at: Utc::now()
        }
        .is_repo_scoped());
        assert!(!Error::Config("missing token".to_string()).is_repo_scoped());
    }
}
