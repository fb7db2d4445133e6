//! In-memory renderer serving canned pages.
//!
//! Every URL maps to a [`FixturePage`] describing how navigation behaves:
//! a response with a status, no response, a navigation error, a hang or a
//! panic, optionally after a delay. Session counters make it possible to
//! assert that every opened session was released.

use super::{PageRenderer, RenderSession, SessionProfile};
use crate::error::SearchError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

#[derive(Debug, Clone)]
enum Navigation {
    Respond { status: u16, html: String },
    NoResponse,
    Error(String),
    Hang,
    Panic(String),
}

/// How navigation to one fixture URL behaves.
#[derive(Debug, Clone)]
pub struct FixturePage {
    navigation: Navigation,
    delay: Duration,
    body_delay: Duration,
}

impl FixturePage {
    fn new(navigation: Navigation) -> Self {
        Self {
            navigation,
            delay: Duration::ZERO,
            body_delay: Duration::ZERO,
        }
    }

    /// A page answering 200 with `html`.
    pub fn ok(html: impl Into<String>) -> Self {
        Self::new(Navigation::Respond {
            status: 200,
            html: html.into(),
        })
    }

    /// A navigation that completes without any response.
    pub fn no_response() -> Self {
        Self::new(Navigation::NoResponse)
    }

    /// A navigation that fails with `message`.
    pub fn navigation_error(message: impl Into<String>) -> Self {
        Self::new(Navigation::Error(message.into()))
    }

    /// A navigation that never completes.
    pub fn hang() -> Self {
        Self::new(Navigation::Hang)
    }

    /// A navigation that panics with `message`.
    pub fn panicking(message: impl Into<String>) -> Self {
        Self::new(Navigation::Panic(message.into()))
    }

    /// Replace the response status. No effect on pages without a response.
    pub fn with_status(mut self, status: u16) -> Self {
        if let Navigation::Respond { status: ref mut current, .. } = self.navigation {
            *current = status;
        }
        self
    }

    /// Delay navigation by `delay` before it resolves.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Delay the appearance of `<body>` by `delay` after navigation.
    pub fn with_body_delay(mut self, delay: Duration) -> Self {
        self.body_delay = delay;
        self
    }
}

#[derive(Debug, Default)]
struct Counters {
    live: AtomicUsize,
    opened: AtomicUsize,
}

/// Renderer backed by a fixed URL → [`FixturePage`] table.
///
/// URLs not in the table fail navigation with a DNS-style error.
#[derive(Debug, Clone, Default)]
pub struct FixtureRenderer {
    pages: Arc<HashMap<String, FixturePage>>,
    counters: Arc<Counters>,
    profiles: Arc<Mutex<Vec<SessionProfile>>>,
    unavailable: Option<String>,
}

impl FixtureRenderer {
    /// Create a renderer serving `pages`.
    pub fn new(pages: impl IntoIterator<Item = (String, FixturePage)>) -> Self {
        Self {
            pages: Arc::new(pages.into_iter().collect()),
            ..Self::default()
        }
    }

    /// A renderer whose sessions can never be opened.
    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self {
            unavailable: Some(reason.into()),
            ..Self::default()
        }
    }

    /// Sessions opened and not yet closed or dropped.
    pub fn live_sessions(&self) -> usize {
        self.counters.live.load(Ordering::SeqCst)
    }

    /// Sessions opened since creation.
    pub fn opened_sessions(&self) -> usize {
        self.counters.opened.load(Ordering::SeqCst)
    }

    /// Profiles of every session opened so far, in opening order.
    pub fn profiles(&self) -> Vec<SessionProfile> {
        self.profiles
            .lock()
            .map(|profiles| profiles.clone())
            .unwrap_or_default()
    }
}

impl PageRenderer for FixtureRenderer {
    type Session = FixtureSession;

    async fn open_session(&self, profile: &SessionProfile) -> Result<FixtureSession, SearchError> {
        if let Some(reason) = &self.unavailable {
            return Err(SearchError::Browser(reason.clone()));
        }
        if let Ok(mut profiles) = self.profiles.lock() {
            profiles.push(profile.clone());
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        self.counters.live.fetch_add(1, Ordering::SeqCst);
        Ok(FixtureSession {
            pages: Arc::clone(&self.pages),
            counters: Arc::clone(&self.counters),
            current: None,
        })
    }
}

/// Session handed out by [`FixtureRenderer`].
#[derive(Debug)]
pub struct FixtureSession {
    pages: Arc<HashMap<String, FixturePage>>,
    counters: Arc<Counters>,
    current: Option<(String, Duration)>,
}

impl RenderSession for FixtureSession {
    async fn navigate(&mut self, url: &str) -> Result<Option<u16>, SearchError> {
        let Some(page) = self.pages.get(url).cloned() else {
            return Err(SearchError::Navigation(format!(
                "net::ERR_NAME_NOT_RESOLVED at {url}"
            )));
        };

        if !page.delay.is_zero() {
            tokio::time::sleep(page.delay).await;
        }

        match page.navigation {
            Navigation::Respond { status, html } => {
                self.current = Some((html, page.body_delay));
                Ok(Some(status))
            }
            Navigation::NoResponse => Ok(None),
            Navigation::Error(message) => Err(SearchError::Navigation(message)),
            Navigation::Hang => {
                std::future::pending::<()>().await;
                Ok(None)
            }
            Navigation::Panic(message) => panic!("{message}"),
        }
    }

    async fn wait_for_selector(&mut self, selector: &str) -> Result<(), SearchError> {
        let Some((_, body_delay)) = &self.current else {
            return Err(SearchError::Navigation(format!(
                "no document to wait for `{selector}` in"
            )));
        };
        if !body_delay.is_zero() {
            tokio::time::sleep(*body_delay).await;
        }
        Ok(())
    }

    async fn content(&mut self) -> Result<String, SearchError> {
        Ok(self
            .current
            .as_ref()
            .map(|(html, _)| html.clone())
            .unwrap_or_default())
    }

    async fn close(self) {}
}

impl Drop for FixtureSession {
    fn drop(&mut self) {
        self.counters.live.fetch_sub(1, Ordering::SeqCst);
    }
}
