//! Unified error types for hubcache.
//!
//! Every variant renders with a stable, machine-readable prefix so hosts can
//! match on the failure class without parsing free text.

use tokio_rusqlite::rusqlite;

/// Unified error types for the cache lifecycle.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Invalid input parameters (e.g., empty version string).
    #[error("INVALID_INPUT: {0}")]
    InvalidInput(String),

    /// Invalid or unresolvable URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// No cache generation with the given name.
    #[error("CACHE_MISS: {0}")]
    CacheMiss(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// Stored entry could not be encoded or decoded.
    #[error("CACHE_ERROR: corrupt entry: {0}")]
    CorruptEntry(String),

    /// Storage quota would be exceeded by the write.
    #[error("QUOTA_EXCEEDED: {0}")]
    QuotaExceeded(String),

    /// Network-level failure (connection refused, DNS, offline).
    #[error("NETWORK_ERROR: {0}")]
    Network(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Fetch response too large.
    #[error("FETCH_TOO_LARGE: {0}")]
    FetchTooLarge(String),

    /// Pre-caching the manifest failed; nothing was committed.
    #[error("INSTALL_FAILED: {0}")]
    InstallFailed(String),

    /// Lifecycle step attempted from the wrong worker state.
    #[error("INVALID_STATE: {0}")]
    InvalidState(String),
}

impl Error {
    /// Whether the request never got an answer (offline, refused, timed out).
    ///
    /// `FetchTooLarge` is not one: the server answered, the body was just
    /// over the size limit.
    pub fn is_network(&self) -> bool {
        matches!(self, Error::Network(_) | Error::FetchTimeout(_))
    }
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptEntry(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::CacheMiss("student-hub-v13".to_string());
        assert!(err.to_string().contains("CACHE_MISS"));
        assert!(err.to_string().contains("student-hub-v13"));
    }

    #[test]
    fn test_install_failed_prefix() {
        let err = Error::InstallFailed("./offline.html: status 404".to_string());
        assert!(err.to_string().starts_with("INSTALL_FAILED: "));
    }

    #[test]
    fn test_is_network() {
        assert!(Error::Network("connection refused".into()).is_network());
        assert!(Error::FetchTimeout("20000ms".into()).is_network());
        assert!(!Error::QuotaExceeded("full".into()).is_network());
        assert!(!Error::FetchTooLarge("64 bytes exceeds 16".into()).is_network());
    }
}
