//! Pluggable page renderers.
//!
//! A [`PageRenderer`] hands out isolated [`RenderSession`]s, one per page
//! extraction. Sessions never share cookies or storage. Timeouts are imposed
//! by the caller, so implementations simply await the underlying engine.
//!
//! Two backends ship with the crate:
//!
//! - [`chromium::ChromiumRenderer`] drives a shared headless Chromium over
//!   the DevTools protocol, with one browser context per session.
//! - [`fixture::FixtureRenderer`] serves canned pages from memory, for tests
//!   and offline runs.

pub mod chromium;
pub mod fixture;

use crate::config::Viewport;
use crate::error::SearchError;
use std::future::Future;

pub use chromium::ChromiumRenderer;
pub use fixture::{FixturePage, FixtureRenderer};

/// Per-session browser settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionProfile {
    /// User-Agent reported by the session.
    pub user_agent: String,
    /// Viewport in CSS pixels.
    pub viewport: Viewport,
    /// Whether page scripts run.
    pub javascript_enabled: bool,
    /// Whether TLS certificate errors are ignored.
    pub ignore_https_errors: bool,
}

/// A source of isolated rendering sessions.
///
/// Implementations must be `Send + Sync` so one renderer can serve every
/// extraction of a batch concurrently.
pub trait PageRenderer: Send + Sync {
    /// The session type produced by this renderer.
    type Session: RenderSession;

    /// Open a fresh, isolated session configured by `profile`.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Browser`] if the engine is unavailable or the
    /// session cannot be created.
    fn open_session(
        &self,
        profile: &SessionProfile,
    ) -> impl Future<Output = Result<Self::Session, SearchError>> + Send;
}

/// One isolated browsing session holding at most one page.
///
/// Dropping a session without calling [`RenderSession::close`] must still
/// release its engine-side resources.
pub trait RenderSession: Send {
    /// Navigate to `url` and wait for DOM-content-loaded readiness.
    ///
    /// Returns the HTTP status of the main document, or `None` when the
    /// navigation produced no response.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Navigation`] if the navigation itself fails
    /// (DNS, connection refused, aborted).
    fn navigate(
        &mut self,
        url: &str,
    ) -> impl Future<Output = Result<Option<u16>, SearchError>> + Send;

    /// Wait until an element matching `selector` exists.
    fn wait_for_selector(
        &mut self,
        selector: &str,
    ) -> impl Future<Output = Result<(), SearchError>> + Send;

    /// Serialised HTML of the current document.
    fn content(&mut self) -> impl Future<Output = Result<String, SearchError>> + Send;

    /// Close the session and release its resources.
    fn close(self) -> impl Future<Output = ()> + Send;
}
