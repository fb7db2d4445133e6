//! Error types for the scout service.

use scout_search::SearchError;

/// Top-level error type for the search service.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// HTTP server error (bind, address lookup).
    #[error("server error: {0}")]
    Server(String),

    /// Search pipeline construction error.
    #[error(transparent)]
    Search(#[from] SearchError),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ServiceError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn search_errors_keep_their_message() {
        let err = ServiceError::from(SearchError::Config("deadline_seconds must be greater than 0".into()));
        assert_eq!(err.to_string(), "config error: deadline_seconds must be greater than 0");
    }

    #[test]
    fn io_errors_convert() {
        let err = ServiceError::from(std::io::Error::new(std::io::ErrorKind::NotFound, "missing"));
        assert_eq!(err.to_string(), "I/O error: missing");
    }
}
