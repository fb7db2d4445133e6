//! Error types for the scout-search crate.
//!
//! These errors stay inside the pipeline: the resolver and extractor turn
//! them into empty candidate sets or failure records, so callers of
//! [`crate::SearchOrchestrator::handle`] never see one directly.

/// Errors that can occur while discovering or scraping pages.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// An operation exceeded its time budget.
    #[error("timed out: {0}")]
    Timeout(String),

    /// An HTTP request to the search backend failed.
    #[error("HTTP error: {0}")]
    Http(String),

    /// Failed to parse a backend response or page markup.
    #[error("parse error: {0}")]
    Parse(String),

    /// Invalid search configuration.
    #[error("config error: {0}")]
    Config(String),

    /// The headless browser could not be launched or a session could not be opened.
    #[error("browser error: {0}")]
    Browser(String),

    /// Navigating to a page failed for a reason other than a timeout.
    #[error("navigation error: {0}")]
    Navigation(String),
}

/// Convenience type alias for scout-search results.
pub type Result<T> = std::result::Result<T, SearchError>;
