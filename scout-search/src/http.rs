//! User-Agent rotation and the HTTP client used for the search backend.
//!
//! The same User-Agent pool feeds both the SearXNG client and the browser
//! sessions opened by the page extractor.

use crate::config::ResolverConfig;
use crate::error::SearchError;
use rand::seq::SliceRandom;

/// Realistic browser User-Agent strings, rotated per request.
pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36",
];

/// Build a [`reqwest::Client`] for the SearXNG backend.
///
/// The client has:
/// - Timeout from config (covers connect, send and body read)
/// - Brotli and gzip decompression
/// - At most 5 redirects
///
/// The User-Agent is set per request so every query rotates it.
///
/// # Errors
///
/// Returns [`SearchError::Http`] if the client cannot be constructed.
pub fn build_client(config: &ResolverConfig) -> Result<reqwest::Client, SearchError> {
    reqwest::Client::builder()
        .timeout(config.timeout())
        .redirect(reqwest::redirect::Policy::limited(5))
        .build()
        .map_err(|e| SearchError::Http(format!("failed to build HTTP client: {e}")))
}

/// Select a random User-Agent string from the rotation list.
pub fn random_user_agent() -> &'static str {
    let mut rng = rand::thread_rng();
    USER_AGENTS
        .choose(&mut rng)
        .copied()
        // SAFETY: USER_AGENTS is a non-empty const array, choose only returns None on empty slices
        .unwrap_or(USER_AGENTS[0])
}

/// The configured User-Agent, or a random one from the pool.
pub fn user_agent_or_random(custom: Option<&str>) -> String {
    match custom {
        Some(ua) => ua.to_owned(),
        None => random_user_agent().to_owned(),
    }
}
